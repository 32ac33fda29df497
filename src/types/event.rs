use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// A point on the calendar's timeline (zone-less, like the hosting calendar's markers).
pub type DateMarker = NaiveDateTime;

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_date_marker(s: &str) -> Option<DateMarker> {
    let s = s.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn de_marker<'de, D: Deserializer<'de>>(d: D) -> Result<DateMarker, D::Error> {
    let s = String::deserialize(d)?;
    parse_date_marker(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid date `{s}`")))
}

fn de_opt_marker<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateMarker>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(s) => parse_date_marker(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{s}`"))),
    }
}

/// The active range handed over by the hosting calendar's date-profile generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateProfile {
    #[serde(deserialize_with = "de_marker")]
    pub active_start: DateMarker,
    /// Exclusive end.
    #[serde(deserialize_with = "de_marker")]
    pub active_end: DateMarker,
}

impl DateProfile {
    pub fn new(active_start: DateMarker, active_end: DateMarker) -> Self {
        Self {
            active_start,
            active_end,
        }
    }

    /// A single-day profile starting at midnight of `date`.
    pub fn day(date: NaiveDate) -> Self {
        let start = date.and_time(chrono::NaiveTime::MIN);
        Self::new(start, start + Duration::days(1))
    }

    /// The profile shifted by its own length, as a "next" button would.
    #[must_use]
    pub fn next(&self) -> Self {
        let len = self.active_end - self.active_start;
        Self::new(self.active_end, self.active_end + len)
    }

    #[must_use]
    pub fn prev(&self) -> Self {
        let len = self.active_end - self.active_start;
        Self::new(self.active_start - len, self.active_start)
    }

    pub fn contains(&self, date: DateMarker) -> bool {
        date >= self.active_start && date < self.active_end
    }
}

/// One event as delivered by the event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Additional owners; an event is drawn once in every listed resource's row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_ids: Vec<String>,
    #[serde(deserialize_with = "de_marker")]
    pub start: DateMarker,
    #[serde(default, deserialize_with = "de_opt_marker")]
    pub end: Option<DateMarker>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub all_day: bool,
}

/// Assumed length of timed events without an end.
pub const DEFAULT_TIMED_EVENT_DURATION_MINUTES: i64 = 60;

impl EventRecord {
    pub fn new(
        id: impl Into<String>,
        resource_id: impl Into<String>,
        start: DateMarker,
        end: DateMarker,
    ) -> Self {
        Self {
            id: id.into(),
            resource_id: Some(resource_id.into()),
            resource_ids: Vec::new(),
            start,
            end: Some(end),
            title: String::new(),
            all_day: false,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// End instant, falling back to one hour (timed) or one day (all-day).
    pub fn effective_end(&self) -> DateMarker {
        match self.end {
            Some(end) if end > self.start => end,
            _ if self.all_day => self.start + Duration::days(1),
            _ => self.start + Duration::minutes(DEFAULT_TIMED_EVENT_DURATION_MINUTES),
        }
    }

    /// Every resource id this event belongs to, without duplicates.
    pub fn owner_ids(&self) -> impl Iterator<Item = &str> {
        let primary = self.resource_id.as_deref();
        primary.into_iter().chain(
            self.resource_ids
                .iter()
                .map(String::as_str)
                .filter(move |id| Some(*id) != primary),
        )
    }
}
