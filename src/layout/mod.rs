//! Slot geometry and pane alignment.
//!
//! This module handles:
//! - Deriving the slot sequence and label grouping from a date range
//! - Mapping dates to pixel offsets and back (binary search on slot edges)
//! - Slicing events into per-resource segments and stacking overlaps
//! - Scroll and row-height coordination between the two panes

mod coords;
mod scroll;
mod segments;
mod slots;

pub use coords::{resolve_slot_min_width, SlotCoords, MIN_FALLBACK_SLOT_WIDTH};
pub use scroll::{ScrollState, ScrollSynchronizer};
pub use segments::{assign_levels, level_count, row_content_height, slice_events, EventSegment};
pub use slots::{build_timeline_date_profile, SlotOptionsKey, TimelineDateProfile, MAX_SLOTS};
