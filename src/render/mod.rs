//! Row rendering with pluggable hosts.
//!
//! This module provides:
//! - The `RowPane` trait implemented by the spreadsheet and time-grid panes
//! - The `DomHost` trait through which a pass commits to the DOM, with an
//!   in-memory implementation for tests and the CLI
//! - Theme, date formatting and HTML escaping helpers
//! - The memo cache used for per-pass derived values

pub mod cache;
pub mod dom;
pub mod escape;
pub mod format;
pub mod spreadsheet;
pub mod theme;
pub mod time_grid;

pub use cache::MemoCache;
pub use dom::{DomHost, MemoryDom, NodeId, Section};
pub use escape::html_escape;
pub use format::{ChronoFormatter, DateFormatter};
pub use spreadsheet::{ColSpec, SpreadsheetPane};
pub use theme::{StandardTheme, Theme};
pub use time_grid::TimeGridPane;

use crate::layout::EventSegment;
use crate::rows::FlatResource;

/// The two structurally separate table regions of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneKind {
    /// Frozen resource list (never scrolls horizontally).
    Spreadsheet,
    /// Time-slot region (scrolls both ways; owns vertical scroll).
    TimeGrid,
}

/// Rendered inner content of one `<tr>`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMarkup {
    /// Cell HTML placed inside the row element.
    pub html: String,
    /// Height the content needs at minimum; hosts without real layout use it
    /// as the natural height.
    pub min_height: f32,
}

/// Everything a pane may read while rendering one row.
pub struct RowContext<'a> {
    pub row: &'a FlatResource<'a>,
    /// Segments owned by this row's resource, levels assigned.
    pub segments: &'a [EventSegment],
}

/// A table region that renders one `<tr>` per resource row.
pub trait RowPane {
    fn kind(&self) -> PaneKind;

    /// Header section content for this pane.
    fn header_html(&self) -> String;

    /// Cell content for one row.
    fn render_row(&self, ctx: &RowContext<'_>) -> RowMarkup;
}
