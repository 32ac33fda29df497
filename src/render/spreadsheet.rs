//! The frozen resource-list pane.

use std::fmt::{self, Write};
use std::rc::Rc;

use crate::types::{ColumnConfig, Resource};

use super::{html_escape, PaneKind, RowContext, RowMarkup, RowPane, Theme};

/// Turns a field value into display text.
pub type TextHook = Rc<dyn Fn(&Resource, Option<&str>) -> String>;

/// Produces trusted cell HTML from the display text; `None` keeps the default.
pub type RenderHook = Rc<dyn Fn(&Resource, &str) -> Option<String>>;

/// A spreadsheet column as the pane renders it.
#[derive(Clone)]
pub struct ColSpec {
    pub field: Option<String>,
    pub header_content: String,
    pub group: bool,
    pub width: Option<f32>,
    /// Carries the hierarchy gutter and the expander.
    pub is_main: bool,
    pub text: Option<TextHook>,
    pub render: Option<RenderHook>,
}

impl fmt::Debug for ColSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColSpec")
            .field("field", &self.field)
            .field("header_content", &self.header_content)
            .field("group", &self.group)
            .field("width", &self.width)
            .field("is_main", &self.is_main)
            .field("text", &self.text.is_some())
            .field("render", &self.render.is_some())
            .finish()
    }
}

impl From<&ColumnConfig> for ColSpec {
    fn from(config: &ColumnConfig) -> Self {
        Self {
            field: config.field.clone(),
            header_content: config.header_content.clone(),
            group: config.group,
            width: config.width,
            is_main: false,
            text: None,
            render: None,
        }
    }
}

impl ColSpec {
    #[must_use]
    pub fn with_text(mut self, hook: impl Fn(&Resource, Option<&str>) -> String + 'static) -> Self {
        self.text = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn with_render(mut self, hook: impl Fn(&Resource, &str) -> Option<String> + 'static) -> Self {
        self.render = Some(Rc::new(hook));
        self
    }

    /// Build specs from configs, marking the first non-group column as main.
    pub fn from_configs(configs: &[ColumnConfig]) -> Vec<ColSpec> {
        let mut specs: Vec<ColSpec> = configs.iter().map(ColSpec::from).collect();
        let main = specs
            .iter()
            .position(|c| !c.group)
            .or_else(|| (!specs.is_empty()).then_some(0));
        if let Some(spec) = main.and_then(|i| specs.get_mut(i)) {
            spec.is_main = true;
        }
        specs
    }

    /// Display text for `resource`: the field value, or the title when the
    /// column names no field, passed through the `text` hook when present.
    fn cell_text(&self, resource: &Resource) -> String {
        let raw = match &self.field {
            Some(field) => resource.field_text(field),
            None => Some(resource.title.clone()).filter(|t| !t.is_empty()),
        };
        match &self.text {
            Some(hook) => hook(resource, raw.as_deref()),
            None => raw.unwrap_or_default(),
        }
    }
}

/// Renders one `<tr>` of cells per resource.
pub struct SpreadsheetPane {
    columns: Vec<ColSpec>,
    theme: Rc<dyn Theme>,
    row_min_height: f32,
}

impl SpreadsheetPane {
    pub fn new(columns: Vec<ColSpec>, theme: Rc<dyn Theme>, row_min_height: f32) -> Self {
        Self {
            columns,
            theme,
            row_min_height,
        }
    }

    /// Field names of group columns, aligned with the column list.
    pub fn group_fields(&self) -> Vec<Option<&str>> {
        self.columns
            .iter()
            .map(|c| {
                if c.group {
                    Some(c.field.as_deref().unwrap_or("title"))
                } else {
                    None
                }
            })
            .collect()
    }

    fn write_gutter(&self, out: &mut String, ctx: &RowContext<'_>) {
        for _ in 0..ctx.row.depth {
            out.push_str("<span class=\"tl-icon\"></span>");
        }
        if ctx.row.has_children {
            let key = if ctx.row.expanded {
                "expanderOpen"
            } else {
                "expanderClosed"
            };
            let _ = write!(
                out,
                "<span class=\"tl-expander\"><span class=\"tl-icon {}\"></span></span>",
                self.theme.class_name(key)
            );
        } else {
            out.push_str("<span class=\"tl-expander-space\"><span class=\"tl-icon\"></span></span>");
        }
    }
}

impl RowPane for SpreadsheetPane {
    fn kind(&self) -> PaneKind {
        PaneKind::Spreadsheet
    }

    fn header_html(&self) -> String {
        let mut out = String::from("<tr>");
        for col in &self.columns {
            let _ = write!(out, "<th class=\"{}\"", self.theme.class_name("widgetHeader"));
            if let Some(width) = col.width {
                let _ = write!(out, " style=\"width:{width}px\"");
            }
            let _ = write!(
                out,
                "><div class=\"tl-cell-content\"><span class=\"tl-cell-text\">{}</span></div></th>",
                html_escape(&col.header_content)
            );
        }
        out.push_str("</tr>");
        out
    }

    fn render_row(&self, ctx: &RowContext<'_>) -> RowMarkup {
        let resource = ctx.row.resource;
        let content_class = self.theme.class_name("widgetContent");
        let mut html = String::new();
        let mut cells = 0;

        for (i, col) in self.columns.iter().enumerate() {
            let span = ctx.row.row_spans.get(i).copied().unwrap_or(1);
            if span == 0 {
                continue;
            }
            cells += 1;
            let _ = write!(html, "<td class=\"{content_class}\"");
            if span > 1 {
                let _ = write!(html, " rowspan=\"{span}\"");
            }
            html.push_str("><div class=\"tl-cell-content\">");
            if col.is_main {
                self.write_gutter(&mut html, ctx);
            }

            let text = col.cell_text(resource);
            let rendered = col.render.as_ref().and_then(|hook| hook(resource, &text));
            match rendered {
                Some(custom) => html.push_str(&custom),
                None if text.is_empty() => html.push_str("<span class=\"tl-cell-text\">&nbsp;</span>"),
                None => {
                    let _ = write!(html, "<span class=\"tl-cell-text\">{}</span>", html_escape(&text));
                }
            }
            html.push_str("</div></td>");
        }

        if cells == 0 {
            let _ = write!(html, "<td class=\"{content_class}\"></td>");
        }

        RowMarkup {
            html,
            min_height: self.row_min_height,
        }
    }
}
