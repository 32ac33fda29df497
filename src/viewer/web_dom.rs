//! [`DomHost`] over real browser elements.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node};

use crate::error::{Result, TlviewError};
use crate::layout::ScrollState;
use crate::render::{DomHost, NodeId, PaneKind, RowMarkup, Section};

fn dom_err(context: &str, err: impl std::fmt::Debug) -> TlviewError {
    TlviewError::Dom(format!("{context}: {err:?}"))
}

#[allow(clippy::cast_possible_truncation)]
fn px(value: f64) -> f32 {
    value as f32
}

#[allow(clippy::cast_possible_truncation)]
fn to_scroll_px(value: f32) -> i32 {
    value.round() as i32
}

fn scroll_offsets(scroller: &HtmlElement) -> ScrollState {
    ScrollState::new(
        px(f64::from(scroller.scroll_top())),
        px(f64::from(scroller.scroll_left())),
    )
}

/// The two-pane skeleton and every row element created through it.
pub(crate) struct WebDom {
    document: Document,
    root: HtmlElement,
    spreadsheet_head: Element,
    spreadsheet_body: Element,
    spreadsheet_scroller: HtmlElement,
    time_head: Element,
    time_slats: Element,
    time_body: Element,
    time_scroller: HtmlElement,
    time_tables: Vec<HtmlElement>,
    nodes: HashMap<NodeId, HtmlElement>,
    next_id: u64,
}

impl WebDom {
    /// Build the skeleton inside `container`, replacing its children.
    pub(crate) fn mount(container: &HtmlElement) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| TlviewError::Dom("no document".to_string()))?;

        container.set_inner_html(
            "<div class=\"tl-timeline\" style=\"display:flex;height:100%\">\
               <div class=\"tl-spreadsheet\" style=\"display:flex;flex-direction:column;flex:none\">\
                 <table class=\"tl-spreadsheet-head\"><thead></thead></table>\
                 <div class=\"tl-spreadsheet-scroller\" style=\"overflow:hidden;flex:1\">\
                   <table><tbody></tbody></table>\
                 </div>\
               </div>\
               <div class=\"tl-time-area\" style=\"display:flex;flex-direction:column;flex:1;min-width:0\">\
                 <div class=\"tl-time-header\" style=\"overflow:hidden\">\
                   <table class=\"tl-time-head\"><thead></thead></table>\
                 </div>\
                 <div class=\"tl-time-scroller\" style=\"overflow:auto;flex:1;position:relative\">\
                   <table class=\"tl-slats-table\" style=\"position:absolute;top:0;bottom:0\"><tbody></tbody></table>\
                   <table class=\"tl-rows-table\" style=\"position:relative\"><tbody></tbody></table>\
                 </div>\
               </div>\
             </div>",
        );

        let find = |selector: &str| -> Result<Element> {
            container
                .query_selector(selector)
                .map_err(|e| dom_err(selector, e))?
                .ok_or_else(|| TlviewError::Dom(format!("skeleton is missing {selector}")))
        };
        let html = |el: Element| -> Result<HtmlElement> {
            el.dyn_into::<HtmlElement>()
                .map_err(|e| dom_err("expected an HTML element", e))
        };

        let time_tables = vec![
            html(find(".tl-time-head")?)?,
            html(find(".tl-slats-table")?)?,
            html(find(".tl-rows-table")?)?,
        ];

        Ok(Self {
            root: html(find(".tl-timeline")?)?,
            spreadsheet_head: find(".tl-spreadsheet-head thead")?,
            spreadsheet_body: find(".tl-spreadsheet-scroller tbody")?,
            spreadsheet_scroller: html(find(".tl-spreadsheet-scroller")?)?,
            time_head: find(".tl-time-head thead")?,
            time_slats: find(".tl-slats-table tbody")?,
            time_body: find(".tl-rows-table tbody")?,
            time_scroller: html(find(".tl-time-scroller")?)?,
            time_tables,
            nodes: HashMap::new(),
            next_id: 1,
            document,
        })
    }

    pub(crate) fn root(&self) -> &HtmlElement {
        &self.root
    }

    pub(crate) fn scroller(&self, pane: PaneKind) -> &HtmlElement {
        match pane {
            PaneKind::Spreadsheet => &self.spreadsheet_scroller,
            PaneKind::TimeGrid => &self.time_scroller,
        }
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<&HtmlElement> {
        self.nodes.get(&node)
    }

    fn body(&self, pane: PaneKind) -> &Element {
        match pane {
            PaneKind::Spreadsheet => &self.spreadsheet_body,
            PaneKind::TimeGrid => &self.time_body,
        }
    }

    fn node(&self, node: NodeId) -> Result<&HtmlElement> {
        self.nodes
            .get(&node)
            .ok_or_else(|| TlviewError::Dom(format!("unknown node {node:?}")))
    }
}

impl DomHost for WebDom {
    fn create_row(&mut self, _pane: PaneKind) -> Result<NodeId> {
        let el = self
            .document
            .create_element("tr")
            .map_err(|e| dom_err("create tr", e))?
            .dyn_into::<HtmlElement>()
            .map_err(|e| dom_err("tr is not an HTML element", e))?;
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, el);
        Ok(id)
    }

    fn place_row(&mut self, pane: PaneKind, node: NodeId, after: Option<NodeId>) -> Result<()> {
        let el: &Node = self.node(node)?;
        let body = self.body(pane);
        let reference = match after {
            Some(anchor) => self.node(anchor)?.next_sibling(),
            None => body.first_child(),
        };
        if reference.as_ref().is_some_and(|r| r.is_same_node(Some(el))) {
            return Ok(());
        }
        body.insert_before(el, reference.as_ref())
            .map_err(|e| dom_err("insert row", e))?;
        Ok(())
    }

    fn remove_row(&mut self, _pane: PaneKind, node: NodeId) -> Result<()> {
        if let Some(el) = self.nodes.remove(&node) {
            el.remove();
        }
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.node(node)?
            .set_attribute(name, value)
            .map_err(|e| dom_err(name, e))
    }

    fn set_row_content(&mut self, node: NodeId, markup: &RowMarkup) -> Result<()> {
        self.node(node)?.set_inner_html(&markup.html);
        Ok(())
    }

    fn set_section(&mut self, section: Section, html: &str) -> Result<()> {
        let target = match section {
            Section::SpreadsheetHeader => &self.spreadsheet_head,
            Section::TimeHeader => &self.time_head,
            Section::TimeSlats => &self.time_slats,
        };
        target.set_inner_html(html);
        Ok(())
    }

    fn set_grid_width(&mut self, width: f32) -> Result<()> {
        let value = format!("{width}px");
        for table in &self.time_tables {
            table
                .style()
                .set_property("width", &value)
                .map_err(|e| dom_err("grid width", e))?;
        }
        Ok(())
    }

    fn available_grid_width(&self) -> Option<f32> {
        let width = self.time_scroller.client_width();
        (width > 0).then(|| px(f64::from(width)))
    }

    fn natural_height(&self, node: NodeId) -> f32 {
        self.nodes
            .get(&node)
            .map_or(0.0, |el| px(el.get_bounding_client_rect().height()))
    }

    fn set_row_height(&mut self, node: NodeId, height: Option<f32>) -> Result<()> {
        let style = self.node(node)?.style();
        match height {
            Some(h) => style.set_property("height", &format!("{h}px")),
            None => style.remove_property("height").map(|_| ()),
        }
        .map_err(|e| dom_err("row height", e))
    }

    fn scroll_state(&self, pane: PaneKind) -> ScrollState {
        scroll_offsets(self.scroller(pane))
    }

    fn set_scroll_state(&mut self, pane: PaneKind, state: ScrollState) {
        let scroller = self.scroller(pane);
        scroller.set_scroll_top(to_scroll_px(state.scroll_top));
        scroller.set_scroll_left(to_scroll_px(state.scroll_left));
    }

    fn scroll_extent(&self, pane: PaneKind) -> ScrollState {
        let s = self.scroller(pane);
        let max_top = (s.scroll_height() - s.client_height()).max(0);
        let max_left = match pane {
            PaneKind::Spreadsheet => 0,
            PaneKind::TimeGrid => (s.scroll_width() - s.client_width()).max(0),
        };
        ScrollState::new(px(f64::from(max_top)), px(f64::from(max_left)))
    }

    fn measure_max_label_width(&self) -> Option<f32> {
        let labels = self.time_head.query_selector_all(".tl-slot-cushion").ok()?;
        (0..labels.length())
            .filter_map(|i| labels.item(i))
            .filter_map(|n| n.dyn_into::<HtmlElement>().ok())
            .map(|el| px(f64::from(el.offset_width())))
            .reduce(f32::max)
    }
}
