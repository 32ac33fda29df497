//! Date → display string conversion.

use std::fmt::Write;

use crate::types::DateMarker;

/// Formats dates for labels and `data-date` attributes.
pub trait DateFormatter {
    /// Format with a chrono-style pattern.
    fn format(&self, date: DateMarker, pattern: &str) -> String;

    /// ISO form used in `data-date` attributes.
    fn format_iso(&self, date: DateMarker, omit_time: bool) -> String {
        if omit_time {
            date.format("%Y-%m-%d").to_string()
        } else {
            date.format("%Y-%m-%dT%H:%M:%S").to_string()
        }
    }
}

/// Formatter backed directly by chrono's strftime implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoFormatter;

impl DateFormatter for ChronoFormatter {
    fn format(&self, date: DateMarker, pattern: &str) -> String {
        let mut out = String::new();
        // chrono reports an unknown specifier as a fmt error instead of text.
        if write!(out, "{}", date.format(pattern)).is_err() {
            tracing::warn!(pattern, "invalid date format pattern");
            return self.format_iso(date, false);
        }
        out
    }
}
