//! Event slicing and overlap leveling.
//!
//! Events are clipped to the rendered slot range, split per owning resource,
//! and stacked into levels so overlapping segments of one resource never
//! share a vertical lane.

use std::collections::HashMap;

use crate::types::{DateMarker, EventRecord};

use super::TimelineDateProfile;

/// One event's visible piece inside one resource row.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSegment {
    pub event_id: String,
    pub resource_id: String,
    pub title: String,
    /// Clipped start instant.
    pub start: DateMarker,
    /// Clipped end instant (exclusive).
    pub end: DateMarker,
    /// First slot touched by the segment.
    pub start_col: usize,
    /// One past the last slot touched.
    pub end_col: usize,
    /// The event really starts here (not clipped on the left).
    pub is_start: bool,
    /// The event really ends here (not clipped on the right).
    pub is_end: bool,
    /// Vertical stacking lane, assigned by [`assign_levels`].
    pub level: usize,
}

impl EventSegment {
    fn overlaps(&self, other: &EventSegment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Slice `events` into per-resource segments over the slots of `tdp`.
///
/// Events without any owner, or entirely outside the visible slots (including
/// ones that fall completely inside hidden hours), produce no segments.
/// Segments in each bucket come back with levels already assigned.
pub fn slice_events(
    events: &[EventRecord],
    tdp: &TimelineDateProfile,
) -> HashMap<String, Vec<EventSegment>> {
    let mut by_resource: HashMap<String, Vec<EventSegment>> = HashMap::new();
    let (Some(range_start), Some(range_end)) = (tdp.range_start(), tdp.range_end()) else {
        return by_resource;
    };
    let slot_len = tdp.slot_duration.to_chrono();

    for event in events {
        let event_end = event.effective_end();
        let start = event.start.max(range_start);
        let end = event_end.min(range_end);
        if end <= start {
            continue;
        }

        let start_col = tdp.slots.partition_point(|slot| *slot + slot_len <= start);
        let end_col = tdp.slots.partition_point(|slot| *slot < end);
        if start_col >= end_col {
            continue;
        }

        for resource_id in event.owner_ids() {
            by_resource
                .entry(resource_id.to_string())
                .or_default()
                .push(EventSegment {
                    event_id: event.id.clone(),
                    resource_id: resource_id.to_string(),
                    title: event.title.clone(),
                    start,
                    end,
                    start_col,
                    end_col,
                    is_start: event.start >= range_start,
                    is_end: event_end <= range_end,
                    level: 0,
                });
        }
    }

    for segments in by_resource.values_mut() {
        assign_levels(segments);
    }
    by_resource
}

/// Greedy interval-graph coloring.
///
/// Segments are ordered by start (longer first on ties, then by event id for
/// a stable result) and each takes the lowest level that holds no overlapping
/// segment. Returns the number of levels used.
pub fn assign_levels(segments: &mut [EventSegment]) -> usize {
    segments.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.end.cmp(&a.end))
            .then_with(|| a.event_id.cmp(&b.event_id))
    });

    let mut levels: Vec<Vec<usize>> = Vec::new();
    for i in 0..segments.len() {
        let Some(segment) = segments.get(i) else {
            continue;
        };
        let free = levels.iter().position(|members| {
            members
                .iter()
                .filter_map(|&j| segments.get(j))
                .all(|placed| !placed.overlaps(segment))
        });
        let level = match free {
            Some(level) => level,
            None => {
                levels.push(Vec::new());
                levels.len() - 1
            }
        };
        if let Some(members) = levels.get_mut(level) {
            members.push(i);
        }
        if let Some(segment) = segments.get_mut(i) {
            segment.level = level;
        }
    }
    levels.len()
}

/// Number of levels used by already-leveled segments.
pub fn level_count(segments: &[EventSegment]) -> usize {
    segments.iter().map(|s| s.level + 1).max().unwrap_or(0)
}

/// Natural content height of a time-grid row.
pub fn row_content_height(levels: usize, level_height: f32, min_height: f32) -> f32 {
    let levels = f32::from(u16::try_from(levels).unwrap_or(u16::MAX));
    (levels * level_height).max(min_height)
}
