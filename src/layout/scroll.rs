//! Keeps the spreadsheet and time-grid panes aligned.
//!
//! The time grid owns scrolling. The spreadsheet mirrors its vertical offset
//! and never scrolls horizontally. Row heights are equalized in one batch:
//! release every pinned height, read every natural height, then pin both
//! elements of each pair to the larger value. Reads never interleave with
//! writes, so a sync costs a single reflow.

use crate::error::Result;
use crate::render::{DomHost, PaneKind};
use crate::rows::ResourceRow;

/// Offsets differing by less than this are the same position.
const SCROLL_EPSILON: f32 = 0.5;

/// Scroll offsets of a pane in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollState {
    pub scroll_top: f32,
    pub scroll_left: f32,
}

impl ScrollState {
    pub fn new(scroll_top: f32, scroll_left: f32) -> Self {
        Self {
            scroll_top,
            scroll_left,
        }
    }

    /// Clamp both offsets into `0..=extent`.
    pub fn clamped(self, extent: ScrollState) -> Self {
        Self {
            scroll_top: self.scroll_top.clamp(0.0, extent.scroll_top.max(0.0)),
            scroll_left: self.scroll_left.clamp(0.0, extent.scroll_left.max(0.0)),
        }
    }

    /// Equal within a pixel rounding step.
    pub fn approx_eq(&self, other: &ScrollState) -> bool {
        (self.scroll_top - other.scroll_top).abs() < SCROLL_EPSILON
            && (self.scroll_left - other.scroll_left).abs() < SCROLL_EPSILON
    }
}

/// Stateless coordinator between the two panes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollSynchronizer;

impl ScrollSynchronizer {
    /// Scroll position of the owning pane.
    pub fn capture_scroll<H: DomHost + ?Sized>(host: &H) -> ScrollState {
        host.scroll_state(PaneKind::TimeGrid)
    }

    /// Apply `state` to the time grid and mirror its vertical offset.
    ///
    /// The state is clamped to the current extent first, so restoring after
    /// rows were removed lands on the last reachable position.
    pub fn restore_scroll<H: DomHost + ?Sized>(host: &mut H, state: ScrollState) -> ScrollState {
        let applied = state.clamped(host.scroll_extent(PaneKind::TimeGrid));
        host.set_scroll_state(PaneKind::TimeGrid, applied);
        Self::mirror_vertical(host);
        host.scroll_state(PaneKind::TimeGrid)
    }

    /// React to a user scroll on either pane.
    ///
    /// A vertical scroll on the spreadsheet is forwarded to the time grid
    /// first; either way the spreadsheet ends up following the owner.
    pub fn handle_scroll<H: DomHost + ?Sized>(host: &mut H, source: PaneKind) {
        if source == PaneKind::Spreadsheet {
            let top = host.scroll_state(PaneKind::Spreadsheet).scroll_top;
            let owner = host.scroll_state(PaneKind::TimeGrid);
            if (owner.scroll_top - top).abs() >= SCROLL_EPSILON {
                host.set_scroll_state(PaneKind::TimeGrid, ScrollState::new(top, owner.scroll_left));
            }
        }
        Self::mirror_vertical(host);
    }

    fn mirror_vertical<H: DomHost + ?Sized>(host: &mut H) {
        let top = host.scroll_state(PaneKind::TimeGrid).scroll_top;
        host.set_scroll_state(PaneKind::Spreadsheet, ScrollState::new(top, 0.0));
    }

    /// Equalize the heights of every row pair; records the result on each row.
    pub fn sync_row_heights<H: DomHost + ?Sized>(
        host: &mut H,
        rows: &mut [ResourceRow],
    ) -> Result<()> {
        for row in rows.iter() {
            host.set_row_height(row.handles.spreadsheet, None)?;
            host.set_row_height(row.handles.time_grid, None)?;
        }

        let heights: Vec<f32> = rows
            .iter()
            .map(|row| {
                host.natural_height(row.handles.spreadsheet)
                    .max(host.natural_height(row.handles.time_grid))
            })
            .collect();

        for (row, height) in rows.iter_mut().zip(heights) {
            host.set_row_height(row.handles.spreadsheet, Some(height))?;
            host.set_row_height(row.handles.time_grid, Some(height))?;
            row.height = Some(height);
        }
        tracing::trace!(rows = rows.len(), "synced row heights");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped() {
        let s = ScrollState::new(-5.0, 900.0).clamped(ScrollState::new(100.0, 300.0));
        assert_eq!(s, ScrollState::new(0.0, 300.0));
    }

    #[test]
    fn test_approx_eq() {
        assert!(ScrollState::new(10.0, 20.0).approx_eq(&ScrollState::new(10.3, 19.8)));
        assert!(!ScrollState::new(10.0, 20.0).approx_eq(&ScrollState::new(11.0, 20.0)));
    }
}
