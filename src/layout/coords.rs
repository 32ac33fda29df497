//! Pre-computed slot positions for a timeline pass.
//!
//! Slot geometry is computed once per pass from the date profile and the
//! resolved slot width, enabling O(log n) date→pixel and pixel→slot lookups
//! for event placement and hit testing.

use crate::types::DateMarker;

use super::TimelineDateProfile;

/// Smallest slot width used when no explicit width is configured.
pub const MIN_FALLBACK_SLOT_WIDTH: f32 = 30.0;

/// Minimum width per slot for this pass.
///
/// An explicit `slot_min_width` always wins. Otherwise the widest measured
/// header label is spread over the slots it spans, never going below
/// [`MIN_FALLBACK_SLOT_WIDTH`].
pub fn resolve_slot_min_width(
    explicit: Option<f32>,
    measured_label_width: Option<f32>,
    slots_per_label: usize,
) -> f32 {
    if let Some(width) = explicit {
        return width;
    }
    let per_label = f32::from(u16::try_from(slots_per_label.max(1)).unwrap_or(u16::MAX));
    MIN_FALLBACK_SLOT_WIDTH.max(measured_label_width.unwrap_or(0.0) / per_label)
}

/// Pixel geometry of the slot columns.
#[derive(Debug, Clone)]
pub struct SlotCoords {
    /// Width of every slot column.
    slot_width: f32,
    /// Cumulative left edges (`positions[i]` = x of slot i, plus a final edge).
    positions: Vec<f32>,
    /// Slot start instants, mirrored from the date profile.
    slot_starts: Vec<DateMarker>,
    slot_seconds: i64,
}

impl SlotCoords {
    /// Lay out `tdp` with at least `min_width` per slot.
    ///
    /// When `available_width` is wider than the minimum total, slots stretch
    /// to fill it.
    pub fn new(tdp: &TimelineDateProfile, min_width: f32, available_width: Option<f32>) -> Self {
        let count = f32::from(u16::try_from(tdp.slot_cnt.max(1)).unwrap_or(u16::MAX));
        let stretched = available_width
            .filter(|w| w.is_finite() && *w > 0.0)
            .map_or(min_width, |w| (w / count).max(min_width));

        let mut positions = Vec::with_capacity(tdp.slot_cnt + 1);
        let mut x = 0.0_f32;
        for _ in 0..tdp.slot_cnt {
            positions.push(x);
            x += stretched;
        }
        positions.push(x);

        Self {
            slot_width: stretched,
            positions,
            slot_starts: tdp.slots.clone(),
            slot_seconds: tdp.slot_duration.as_seconds().max(1),
        }
    }

    pub fn slot_width(&self) -> f32 {
        self.slot_width
    }

    pub fn slot_count(&self) -> usize {
        self.slot_starts.len()
    }

    /// Left edge of slot `index` (the final edge for `index == slot_count`).
    pub fn slot_left(&self, index: usize) -> f32 {
        self.positions
            .get(index)
            .copied()
            .unwrap_or_else(|| self.total_width())
    }

    /// Total width of the time grid.
    pub fn total_width(&self) -> f32 {
        self.positions.last().copied().unwrap_or(0.0)
    }

    /// Find slot at x position (binary search)
    pub fn slot_at_x(&self, x: f32) -> Option<usize> {
        if self.slot_starts.is_empty() || x < 0.0 || x >= self.total_width() {
            return None;
        }
        match self
            .positions
            .binary_search_by(|pos| pos.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal))
        {
            Ok(i) => Some(i),
            Err(i) => Some(i.saturating_sub(1)),
        }
    }

    /// Horizontal pixel offset of `date`.
    ///
    /// Dates before the first slot map to 0, dates after the last slot map to
    /// the total width, and dates inside a hidden gap (outside the daily time
    /// window) snap to the end of the preceding slot.
    pub fn date_to_px(&self, date: DateMarker) -> f32 {
        let after = self.slot_starts.partition_point(|start| *start <= date);
        let Some(index) = after.checked_sub(1) else {
            return 0.0;
        };
        let Some(start) = self.slot_starts.get(index) else {
            return self.total_width();
        };
        let elapsed = (date - *start).num_seconds().clamp(0, self.slot_seconds);
        let fraction = seconds_ratio(elapsed, self.slot_seconds);
        self.slot_left(index) + fraction * self.slot_width
    }

    /// Instant at the left edge of the slot under `x`.
    pub fn x_to_slot_start(&self, x: f32) -> Option<DateMarker> {
        self.slot_at_x(x)
            .and_then(|index| self.slot_starts.get(index).copied())
    }

    /// Map `x` on this layout to the same point in time on `to`.
    ///
    /// Both layouts must share a slot structure; only widths may differ.
    pub fn translate_x(&self, x: f32, to: &SlotCoords) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if self.positions == to.positions {
            return x;
        }
        let Some(index) = self.slot_at_x(x) else {
            return to.total_width();
        };
        let fraction = if self.slot_width > 0.0 {
            ((x - self.slot_left(index)) / self.slot_width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        to.slot_left(index) + fraction * to.slot_width
    }
}

fn seconds_ratio(part: i64, whole: i64) -> f32 {
    // Slot durations fit comfortably in f64's exact integer range.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let ratio = (part as f64 / whole as f64) as f32;
    ratio.clamp(0.0, 1.0)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::layout::{build_timeline_date_profile, SlotOptionsKey};
    use crate::types::{DateProfile, DurationSpec, TimelineOptions};
    use chrono::{Duration, NaiveDate};

    fn hourly_day() -> TimelineDateProfile {
        let options = TimelineOptions {
            slot_duration: DurationSpec::from_minutes(60),
            ..TimelineOptions::default()
        };
        build_timeline_date_profile(
            &DateProfile::day(NaiveDate::from_ymd_opt(2015, 8, 7).unwrap()),
            &SlotOptionsKey::from_options(&options),
        )
        .unwrap()
    }

    #[test]
    fn test_fallback_width() {
        assert_eq!(resolve_slot_min_width(None, None, 2), 30.0);
        assert_eq!(resolve_slot_min_width(None, Some(100.0), 2), 50.0);
        assert_eq!(resolve_slot_min_width(Some(12.0), Some(100.0), 2), 12.0);
    }

    #[test]
    fn test_basic_positions() {
        let coords = SlotCoords::new(&hourly_day(), 40.0, None);
        assert_eq!(coords.slot_count(), 24);
        assert_eq!(coords.total_width(), 960.0);
        assert_eq!(coords.slot_left(3), 120.0);
    }

    #[test]
    fn test_stretch_to_available_width() {
        let coords = SlotCoords::new(&hourly_day(), 30.0, Some(1200.0));
        assert_eq!(coords.slot_width(), 50.0);
        // Never narrower than the minimum.
        let coords = SlotCoords::new(&hourly_day(), 30.0, Some(100.0));
        assert_eq!(coords.slot_width(), 30.0);
    }

    #[test]
    fn test_translate_keeps_time_position() {
        let tdp = hourly_day();
        let narrow = SlotCoords::new(&tdp, 40.0, None);
        let wide = SlotCoords::new(&tdp, 60.0, None);
        // Half way into slot 3.
        assert_eq!(narrow.translate_x(140.0, &wide), 210.0);
        assert_eq!(wide.translate_x(210.0, &narrow), 140.0);
        assert_eq!(narrow.translate_x(0.0, &wide), 0.0);
        assert_eq!(narrow.translate_x(5000.0, &wide), 1440.0);
        // Same layout: offsets pass through untouched.
        assert_eq!(narrow.translate_x(53.0, &SlotCoords::new(&tdp, 40.0, None)), 53.0);
    }

    #[test]
    fn test_date_to_px() {
        let tdp = hourly_day();
        let coords = SlotCoords::new(&tdp, 40.0, None);
        let start = tdp.slots[0];
        assert_eq!(coords.date_to_px(start), 0.0);
        assert_eq!(coords.date_to_px(start + Duration::minutes(90)), 60.0);
        assert_eq!(coords.date_to_px(start - Duration::hours(1)), 0.0);
        assert_eq!(coords.date_to_px(start + Duration::days(2)), 960.0);
    }

    #[test]
    fn test_slot_at_x() {
        let coords = SlotCoords::new(&hourly_day(), 40.0, None);
        assert_eq!(coords.slot_at_x(0.0), Some(0));
        assert_eq!(coords.slot_at_x(39.9), Some(0));
        assert_eq!(coords.slot_at_x(40.0), Some(1));
        assert_eq!(coords.slot_at_x(960.0), None);
        assert_eq!(coords.slot_at_x(-1.0), None);
    }
}
