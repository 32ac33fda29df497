//! The DOM commit seam.
//!
//! A render pass computes everything it wants to show without touching the
//! document, then applies the result through [`DomHost`]. The browser host
//! lives in `viewer`; [`MemoryDom`] keeps an in-memory model with the same
//! observable semantics for tests, benchmarks and the CLI.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

use crate::error::{Result, TlviewError};
use crate::layout::ScrollState;

use super::{PaneKind, RowMarkup};

/// Opaque, stable identity of one row element.
///
/// Two handles compare equal exactly when they name the same element, which
/// is what identity-preservation checks rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Non-row regions rewritten as a whole when their input changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// Column labels above the resource list.
    SpreadsheetHeader,
    /// Slot labels above the time grid.
    TimeHeader,
    /// Background slot cells behind the time-grid rows.
    TimeSlats,
}

/// Everything a render pass needs from a document.
///
/// Row elements are created detached; `place_row` both inserts and moves.
pub trait DomHost {
    /// Create a detached `<tr>` for `pane`.
    fn create_row(&mut self, pane: PaneKind) -> Result<NodeId>;

    /// Insert or move `node` so it directly follows `after` (front when `None`).
    fn place_row(&mut self, pane: PaneKind, node: NodeId, after: Option<NodeId>) -> Result<()>;

    /// Detach and forget `node`.
    fn remove_row(&mut self, pane: PaneKind, node: NodeId) -> Result<()>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    /// Replace the row's cells.
    fn set_row_content(&mut self, node: NodeId, markup: &RowMarkup) -> Result<()>;

    fn set_section(&mut self, section: Section, html: &str) -> Result<()>;

    /// Width of the time-grid tables.
    fn set_grid_width(&mut self, width: f32) -> Result<()>;

    /// Client width the time grid may fill, when known.
    fn available_grid_width(&self) -> Option<f32>;

    /// Height the row's content takes without an explicit height.
    fn natural_height(&self, node: NodeId) -> f32;

    /// Pin (or release with `None`) the row's height.
    fn set_row_height(&mut self, node: NodeId, height: Option<f32>) -> Result<()>;

    fn scroll_state(&self, pane: PaneKind) -> ScrollState;

    /// Apply scroll offsets; hosts clamp to their extent like a browser does.
    fn set_scroll_state(&mut self, pane: PaneKind, state: ScrollState);

    /// Largest offsets `pane` can scroll to.
    fn scroll_extent(&self, pane: PaneKind) -> ScrollState;

    /// Width of the widest slot label currently in the time header.
    fn measure_max_label_width(&self) -> Option<f32>;
}

/// Counters of DOM work, for asserting that passes stay incremental.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub rows_created: usize,
    pub rows_placed: usize,
    pub rows_removed: usize,
    pub content_writes: usize,
    pub section_writes: usize,
}

#[derive(Debug, Clone)]
struct MemoryNode {
    pane: PaneKind,
    attributes: BTreeMap<String, String>,
    html: String,
    min_height: f32,
    natural_override: Option<f32>,
    height: Option<f32>,
}

/// Approximate advance of one label character in pixels.
const LABEL_CHAR_WIDTH: f32 = 7.0;
const LABEL_PADDING: f32 = 8.0;
const CUSHION_OPEN: &str = "<span class=\"tl-slot-cushion\">";

/// In-memory document with browser-like scroll clamping.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    next_id: u64,
    nodes: HashMap<NodeId, MemoryNode>,
    spreadsheet_rows: Vec<NodeId>,
    time_grid_rows: Vec<NodeId>,
    sections: BTreeMap<Section, String>,
    grid_width: f32,
    viewport_width: f32,
    viewport_height: f32,
    spreadsheet_scroll: ScrollState,
    time_grid_scroll: ScrollState,
    stats: MutationStats,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl MemoryDom {
    /// Create a document whose time-grid viewport is `width` x `height`.
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            next_id: 1,
            nodes: HashMap::new(),
            spreadsheet_rows: Vec::new(),
            time_grid_rows: Vec::new(),
            sections: BTreeMap::new(),
            grid_width: 0.0,
            viewport_width,
            viewport_height,
            spreadsheet_scroll: ScrollState::default(),
            time_grid_scroll: ScrollState::default(),
            stats: MutationStats::default(),
        }
    }

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    /// Row elements of `pane` in document order.
    pub fn rows(&self, pane: PaneKind) -> &[NodeId] {
        match pane {
            PaneKind::Spreadsheet => &self.spreadsheet_rows,
            PaneKind::TimeGrid => &self.time_grid_rows,
        }
    }

    /// `data-resource-id` of every row of `pane`, in document order.
    pub fn resource_ids(&self, pane: PaneKind) -> Vec<String> {
        self.rows(pane)
            .iter()
            .filter_map(|id| self.attribute(*id, "data-resource-id"))
            .map(str::to_string)
            .collect()
    }

    /// The row of `pane` carrying `data-resource-id == resource_id`.
    pub fn find_row(&self, pane: PaneKind, resource_id: &str) -> Option<NodeId> {
        self.rows(pane)
            .iter()
            .copied()
            .find(|id| self.attribute(*id, "data-resource-id") == Some(resource_id))
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(&node)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    pub fn row_html(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.html.as_str())
    }

    /// Rendered height: the pinned height if any, otherwise the natural one.
    pub fn row_height(&self, node: NodeId) -> Option<f32> {
        self.nodes
            .get(&node)
            .map(|n| n.height.unwrap_or_else(|| natural_of(n)))
    }

    /// Pretend late content (an image, a web font) changed a row's layout.
    pub fn set_natural_height(&mut self, node: NodeId, height: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.natural_override = Some(height);
        }
    }

    pub fn section(&self, section: Section) -> Option<&str> {
        self.sections.get(&section).map(String::as_str)
    }

    pub fn grid_width(&self) -> f32 {
        self.grid_width
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.time_grid_scroll = self.time_grid_scroll.clamped(self.scroll_extent(PaneKind::TimeGrid));
        self.spreadsheet_scroll =
            self.spreadsheet_scroll.clamped(self.scroll_extent(PaneKind::Spreadsheet));
    }

    /// Serialize both panes as a standalone HTML fragment.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let section = |s: Section| self.sections.get(&s).map_or("", String::as_str);
        let _ = write!(
            out,
            "<div class=\"tl-timeline\">\n<div class=\"tl-spreadsheet\">\n<table><thead>{}</thead><tbody>\n",
            section(Section::SpreadsheetHeader)
        );
        self.write_rows(&mut out, PaneKind::Spreadsheet);
        let _ = write!(
            out,
            "</tbody></table>\n</div>\n<div class=\"tl-time-area\" style=\"width:{}px\">\n<table><thead>{}</thead><tbody>{}\n",
            self.grid_width,
            section(Section::TimeHeader),
            section(Section::TimeSlats)
        );
        self.write_rows(&mut out, PaneKind::TimeGrid);
        out.push_str("</tbody></table>\n</div>\n</div>\n");
        out
    }

    fn write_rows(&self, out: &mut String, pane: PaneKind) {
        for id in self.rows(pane) {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            out.push_str("<tr");
            for (name, value) in &node.attributes {
                let _ = write!(out, " {name}=\"{}\"", super::html_escape(value));
            }
            if let Some(height) = node.height {
                let _ = write!(out, " style=\"height:{height}px\"");
            }
            let _ = writeln!(out, ">{}</tr>", node.html);
        }
    }

    fn rows_mut(&mut self, pane: PaneKind) -> &mut Vec<NodeId> {
        match pane {
            PaneKind::Spreadsheet => &mut self.spreadsheet_rows,
            PaneKind::TimeGrid => &mut self.time_grid_rows,
        }
    }

    fn content_height(&self, pane: PaneKind) -> f32 {
        self.rows(pane)
            .iter()
            .filter_map(|id| self.row_height(*id))
            .sum()
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut MemoryNode> {
        self.nodes
            .get_mut(&node)
            .ok_or_else(|| TlviewError::Dom(format!("unknown node {node:?}")))
    }
}

fn natural_of(node: &MemoryNode) -> f32 {
    node.natural_override.unwrap_or(node.min_height)
}

impl DomHost for MemoryDom {
    fn create_row(&mut self, pane: PaneKind) -> Result<NodeId> {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            MemoryNode {
                pane,
                attributes: BTreeMap::new(),
                html: String::new(),
                min_height: 0.0,
                natural_override: None,
                height: None,
            },
        );
        self.stats.rows_created += 1;
        Ok(id)
    }

    fn place_row(&mut self, pane: PaneKind, node: NodeId, after: Option<NodeId>) -> Result<()> {
        match self.nodes.get(&node) {
            Some(n) if n.pane == pane => {}
            Some(_) => {
                return Err(TlviewError::Dom(format!(
                    "{node:?} does not belong to the {pane:?} pane"
                )))
            }
            None => return Err(TlviewError::Dom(format!("unknown node {node:?}"))),
        }
        let rows = self.rows_mut(pane);
        rows.retain(|id| *id != node);
        let index = match after {
            None => 0,
            Some(anchor) => {
                rows.iter()
                    .position(|id| *id == anchor)
                    .ok_or_else(|| TlviewError::Dom(format!("anchor {anchor:?} is not attached")))?
                    + 1
            }
        };
        rows.insert(index, node);
        self.stats.rows_placed += 1;
        Ok(())
    }

    fn remove_row(&mut self, pane: PaneKind, node: NodeId) -> Result<()> {
        self.rows_mut(pane).retain(|id| *id != node);
        self.nodes.remove(&node);
        self.stats.rows_removed += 1;
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.node_mut(node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn set_row_content(&mut self, node: NodeId, markup: &RowMarkup) -> Result<()> {
        let n = self.node_mut(node)?;
        n.html.clone_from(&markup.html);
        n.min_height = markup.min_height;
        n.natural_override = None;
        self.stats.content_writes += 1;
        Ok(())
    }

    fn set_section(&mut self, section: Section, html: &str) -> Result<()> {
        self.sections.insert(section, html.to_string());
        self.stats.section_writes += 1;
        Ok(())
    }

    fn set_grid_width(&mut self, width: f32) -> Result<()> {
        self.grid_width = width;
        Ok(())
    }

    fn available_grid_width(&self) -> Option<f32> {
        Some(self.viewport_width)
    }

    fn natural_height(&self, node: NodeId) -> f32 {
        self.nodes.get(&node).map_or(0.0, natural_of)
    }

    fn set_row_height(&mut self, node: NodeId, height: Option<f32>) -> Result<()> {
        self.node_mut(node)?.height = height;
        Ok(())
    }

    fn scroll_state(&self, pane: PaneKind) -> ScrollState {
        match pane {
            PaneKind::Spreadsheet => self.spreadsheet_scroll,
            PaneKind::TimeGrid => self.time_grid_scroll,
        }
    }

    fn set_scroll_state(&mut self, pane: PaneKind, state: ScrollState) {
        let clamped = state.clamped(self.scroll_extent(pane));
        match pane {
            PaneKind::Spreadsheet => self.spreadsheet_scroll = clamped,
            PaneKind::TimeGrid => self.time_grid_scroll = clamped,
        }
    }

    fn scroll_extent(&self, pane: PaneKind) -> ScrollState {
        let max_top = (self.content_height(pane) - self.viewport_height).max(0.0);
        let max_left = match pane {
            PaneKind::Spreadsheet => 0.0,
            PaneKind::TimeGrid => (self.grid_width - self.viewport_width).max(0.0),
        };
        ScrollState::new(max_top, max_left)
    }

    fn measure_max_label_width(&self) -> Option<f32> {
        let header = self.sections.get(&Section::TimeHeader)?;
        header
            .split(CUSHION_OPEN)
            .skip(1)
            .filter_map(|rest| rest.split("</span>").next())
            .map(|label| {
                let chars = u16::try_from(label.chars().count()).unwrap_or(u16::MAX);
                f32::from(chars) * LABEL_CHAR_WIDTH + LABEL_PADDING
            })
            .reduce(f32::max)
    }
}
