//! Slot sequence derived from a date profile.
//!
//! A [`TimelineDateProfile`] is the discrete list of slot start instants the
//! time-grid pane renders as columns, together with label grouping and the
//! week/day boundary predicates used for styling. It is a pure function of the
//! active range and the slot options, which is what lets the controller
//! memoize it and hand out the same allocation across passes.

use chrono::{Datelike, Duration, NaiveTime};

use crate::error::{Result, TlviewError};
use crate::types::{DateMarker, DateProfile, DurationSpec, TimelineOptions};

/// Upper bound on generated slots; a larger range is a configuration error.
pub const MAX_SLOTS: usize = 10_000;

/// The slot-related subset of [`TimelineOptions`], usable as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotOptionsKey {
    pub slot_duration: DurationSpec,
    pub slot_label_interval: Option<DurationSpec>,
    pub slot_label_format: Option<String>,
    pub slot_min_time: DurationSpec,
    pub slot_max_time: DurationSpec,
    pub first_day: u8,
}

impl SlotOptionsKey {
    pub fn from_options(options: &TimelineOptions) -> Self {
        Self {
            slot_duration: options.slot_duration,
            slot_label_interval: options.slot_label_interval,
            slot_label_format: options.slot_label_format.clone(),
            slot_min_time: options.slot_min_time,
            slot_max_time: options.slot_max_time,
            first_day: options.first_day,
        }
    }
}

/// Discrete slot layout for one date profile.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineDateProfile {
    /// Start instant of every rendered slot, ascending.
    pub slots: Vec<DateMarker>,
    pub slot_duration: DurationSpec,
    pub label_interval: DurationSpec,
    /// Number of slots one header label spans.
    pub slots_per_label: usize,
    pub slot_cnt: usize,
    /// Chrono format string for header labels.
    pub label_format: String,
    /// False when slots are whole days.
    pub is_time_scale: bool,
    week_starts: Vec<bool>,
    day_starts: Vec<bool>,
}

impl TimelineDateProfile {
    pub fn slot_start(&self, index: usize) -> Option<DateMarker> {
        self.slots.get(index).copied()
    }

    pub fn slot_end(&self, index: usize) -> Option<DateMarker> {
        self.slot_start(index)
            .map(|start| start + self.slot_duration.to_chrono())
    }

    /// First rendered instant.
    pub fn range_start(&self) -> Option<DateMarker> {
        self.slots.first().copied()
    }

    /// End of the last rendered slot.
    pub fn range_end(&self) -> Option<DateMarker> {
        self.slot_cnt.checked_sub(1).and_then(|last| self.slot_end(last))
    }

    pub fn is_week_start(&self, index: usize) -> bool {
        self.week_starts.get(index).copied().unwrap_or(false)
    }

    pub fn is_day_start(&self, index: usize) -> bool {
        self.day_starts.get(index).copied().unwrap_or(false)
    }

    /// Whether a pass built on `other` can keep this profile's scroll offsets.
    ///
    /// Offsets stay meaningful while the column structure is the same: equal
    /// slot count, equal slot size and the same time of day in the first slot.
    pub fn same_structure(&self, other: &TimelineDateProfile) -> bool {
        self.slot_cnt == other.slot_cnt
            && self.slot_duration == other.slot_duration
            && self.slots_per_label == other.slots_per_label
            && self.slots.first().map(|d| d.time()) == other.slots.first().map(|d| d.time())
    }
}

/// Build the slot sequence for `profile`.
pub fn build_timeline_date_profile(
    profile: &DateProfile,
    key: &SlotOptionsKey,
) -> Result<TimelineDateProfile> {
    let slot = key.slot_duration;
    if slot.as_seconds() <= 0 {
        return Err(TlviewError::invalid_option(
            "slotDuration",
            "must be greater than zero",
        ));
    }
    if profile.active_end <= profile.active_start {
        return Err(TlviewError::Geometry(format!(
            "empty active range {} .. {}",
            profile.active_start, profile.active_end
        )));
    }

    let is_time_scale = !slot.is_whole_days();
    let slots = if is_time_scale {
        timed_slots(profile, key)?
    } else {
        day_slots(profile, slot)?
    };
    if slots.is_empty() {
        return Err(TlviewError::Geometry(
            "the active range contains no visible slots".to_string(),
        ));
    }

    let (label_interval, slots_per_label) = label_grouping(slot, key.slot_label_interval);
    let label_format = key
        .slot_label_format
        .clone()
        .unwrap_or_else(|| default_label_format(label_interval).to_string());

    let mut week_starts = Vec::with_capacity(slots.len());
    let mut day_starts = Vec::with_capacity(slots.len());
    let mut prev_date = None;
    for marker in &slots {
        let at_midnight = marker.time() == NaiveTime::MIN;
        let dow = marker.weekday().num_days_from_sunday();
        week_starts.push(at_midnight && dow == u32::from(key.first_day));
        day_starts.push(prev_date != Some(marker.date()));
        prev_date = Some(marker.date());
    }

    Ok(TimelineDateProfile {
        slot_cnt: slots.len(),
        slots,
        slot_duration: slot,
        label_interval,
        slots_per_label,
        label_format,
        is_time_scale,
        week_starts,
        day_starts,
    })
}

fn day_slots(profile: &DateProfile, slot: DurationSpec) -> Result<Vec<DateMarker>> {
    let step = slot.to_chrono();
    let mut out = Vec::new();
    let mut t = profile.active_start.date().and_time(NaiveTime::MIN);
    while t < profile.active_end {
        push_slot(&mut out, t)?;
        t += step;
    }
    Ok(out)
}

fn timed_slots(profile: &DateProfile, key: &SlotOptionsKey) -> Result<Vec<DateMarker>> {
    let step = key.slot_duration.to_chrono();
    let min = key.slot_min_time.to_chrono();
    let max = key.slot_max_time.to_chrono();
    let mut out: Vec<DateMarker> = Vec::new();

    let mut day = profile.active_start.date().and_time(NaiveTime::MIN);
    // A window reaching past midnight belongs to the previous day.
    if max > Duration::days(1) {
        day -= Duration::days(1);
    }
    while day + min < profile.active_end {
        let window_end = (day + max).min(profile.active_end);
        let mut t = day + min;
        while t < window_end {
            let after_last = out.last().map_or(true, |last| t > *last);
            if t >= profile.active_start && after_last {
                push_slot(&mut out, t)?;
            }
            t += step;
        }
        day += Duration::days(1);
    }
    Ok(out)
}

fn push_slot(out: &mut Vec<DateMarker>, marker: DateMarker) -> Result<()> {
    if out.len() >= MAX_SLOTS {
        return Err(TlviewError::Geometry(format!(
            "range produces more than {MAX_SLOTS} slots"
        )));
    }
    out.push(marker);
    Ok(())
}

/// Label interval and how many slots each label spans.
///
/// An explicit interval that is not a whole multiple of the slot falls back
/// to one label per slot.
fn label_grouping(slot: DurationSpec, explicit: Option<DurationSpec>) -> (DurationSpec, usize) {
    let interval = explicit.unwrap_or_else(|| default_label_interval(slot));
    match interval
        .whole_divide(&slot)
        .and_then(|n| usize::try_from(n).ok())
    {
        Some(n) if n >= 1 => (interval, n),
        _ => (slot, 1),
    }
}

fn default_label_interval(slot: DurationSpec) -> DurationSpec {
    let hour = DurationSpec::from_minutes(60);
    if slot < hour && hour.whole_divide(&slot).is_some() {
        hour
    } else {
        slot
    }
}

fn default_label_format(interval: DurationSpec) -> &'static str {
    if interval.is_whole_days() {
        "%a %-m/%-d"
    } else if interval.as_seconds() % 3600 == 0 {
        "%-I%P"
    } else {
        "%-I:%M%P"
    }
}
