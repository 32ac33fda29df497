//! CSS class lookup.

/// Maps semantic theme keys to class names. No behavior hangs off a theme.
pub trait Theme {
    fn class_name(&self, key: &str) -> &str;
}

/// The default class set shipped with the stylesheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTheme;

impl Theme for StandardTheme {
    fn class_name(&self, key: &str) -> &str {
        match key {
            "widgetHeader" => "tl-widget-header",
            "widgetContent" => "tl-widget-content",
            "tableGrid" => "tl-table-grid",
            "expanderOpen" => "tl-icon-minus-square",
            "expanderClosed" => "tl-icon-plus-square",
            "event" => "tl-event",
            _ => "",
        }
    }
}
