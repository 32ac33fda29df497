use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::TlviewError;

/// A non-negative duration written the way calendar options write them.
///
/// Accepted forms:
/// - `"HH:MM"` or `"HH:MM:SS"` (hours may exceed 23, e.g. `"24:00"`)
/// - `"Nd"` for whole days
/// - `"Nm"` / `"Nh"` for minutes and hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DurationSpec {
    seconds: i64,
}

const SECONDS_PER_DAY: i64 = 86_400;

impl DurationSpec {
    pub const fn from_seconds(seconds: i64) -> Self {
        Self { seconds }
    }

    pub const fn from_minutes(minutes: i64) -> Self {
        Self {
            seconds: minutes * 60,
        }
    }

    pub const fn from_days(days: i64) -> Self {
        Self {
            seconds: days * SECONDS_PER_DAY,
        }
    }

    pub fn as_seconds(&self) -> i64 {
        self.seconds
    }

    pub fn to_chrono(self) -> Duration {
        Duration::seconds(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0
    }

    /// Whole-day durations switch slot generation to day granularity.
    pub fn is_whole_days(&self) -> bool {
        self.seconds > 0 && self.seconds % SECONDS_PER_DAY == 0
    }

    /// How many times `other` fits into `self`, if it divides evenly.
    pub fn whole_divide(&self, other: &DurationSpec) -> Option<i64> {
        if other.seconds <= 0 || self.seconds % other.seconds != 0 {
            return None;
        }
        Some(self.seconds / other.seconds)
    }
}

impl FromStr for DurationSpec {
    type Err = TlviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bad = || TlviewError::invalid_option("duration", format!("cannot parse `{s}`"));

        if let Some(days) = trimmed.strip_suffix('d') {
            let n: i64 = days.trim().parse().map_err(|_| bad())?;
            return Ok(Self::from_days(n));
        }
        if let Some(hours) = trimmed.strip_suffix('h') {
            let n: i64 = hours.trim().parse().map_err(|_| bad())?;
            return Ok(Self::from_seconds(n * 3600));
        }
        if let Some(minutes) = trimmed.strip_suffix('m') {
            let n: i64 = minutes.trim().parse().map_err(|_| bad())?;
            return Ok(Self::from_minutes(n));
        }

        let mut parts = trimmed.split(':');
        let hours: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let minutes: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let seconds: i64 = match parts.next() {
            Some(sec) => sec.parse().map_err(|_| bad())?,
            None => 0,
        };
        if parts.next().is_some() || minutes >= 60 || seconds >= 60 || hours < 0 {
            return Err(bad());
        }
        Ok(Self::from_seconds(hours * 3600 + minutes * 60 + seconds))
    }
}

impl TryFrom<String> for DurationSpec {
    type Error = TlviewError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DurationSpec> for String {
    fn from(value: DurationSpec) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole_days() {
            return write!(f, "{}d", self.seconds / SECONDS_PER_DAY);
        }
        let h = self.seconds / 3600;
        let m = (self.seconds % 3600) / 60;
        let s = self.seconds % 60;
        if s == 0 {
            write!(f, "{h:02}:{m:02}")
        } else {
            write!(f, "{h:02}:{m:02}:{s:02}")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_forms() {
        assert_eq!("00:30".parse::<DurationSpec>().unwrap().as_seconds(), 1800);
        assert_eq!("24:00".parse::<DurationSpec>().unwrap().as_seconds(), 86_400);
        assert_eq!("01:00:30".parse::<DurationSpec>().unwrap().as_seconds(), 3630);
    }

    #[test]
    fn test_parse_suffix_forms() {
        assert_eq!("1d".parse::<DurationSpec>().unwrap(), DurationSpec::from_days(1));
        assert_eq!("15m".parse::<DurationSpec>().unwrap(), DurationSpec::from_minutes(15));
        assert_eq!("2h".parse::<DurationSpec>().unwrap().as_seconds(), 7200);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("abc".parse::<DurationSpec>().is_err());
        assert!("10:75".parse::<DurationSpec>().is_err());
        assert!("1:2:3:4".parse::<DurationSpec>().is_err());
    }

    #[test]
    fn test_whole_divide() {
        let hour = DurationSpec::from_minutes(60);
        assert_eq!(hour.whole_divide(&DurationSpec::from_minutes(15)), Some(4));
        assert_eq!(hour.whole_divide(&DurationSpec::from_minutes(25)), None);
    }

    #[test]
    fn test_display_roundtrips_through_serde() {
        let json = serde_json::to_string(&DurationSpec::from_minutes(90)).unwrap();
        assert_eq!(json, "\"01:30\"");
        let back: DurationSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DurationSpec::from_minutes(90));
    }
}
