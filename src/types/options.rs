use serde::{Deserialize, Serialize};

use super::DurationSpec;
use crate::error::{Result, TlviewError};

/// One spreadsheet column as configured by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnConfig {
    /// Resource field to display; `None` displays the title.
    pub field: Option<String>,
    /// Header label.
    pub header_content: String,
    /// Merge consecutive rows with equal values into one cell.
    pub group: bool,
    /// Preferred width in pixels.
    pub width: Option<f32>,
}

/// View options that shape the timeline.
///
/// Every field has a default so a host can send a partial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineOptions {
    /// Name reported to resource-render observers.
    pub view_type: String,
    pub slot_duration: DurationSpec,
    /// Label cell span; derived from `slot_duration` when absent.
    pub slot_label_interval: Option<DurationSpec>,
    /// Chrono format string for slot labels; derived when absent.
    pub slot_label_format: Option<String>,
    /// Daily window of rendered time (ignored for day-sized slots).
    pub slot_min_time: DurationSpec,
    pub slot_max_time: DurationSpec,
    /// Explicit slot width; disables label measurement.
    pub slot_min_width: Option<f32>,
    /// Initial horizontal scroll target, as a time of day.
    pub scroll_time: DurationSpec,
    /// First day of the week, 0 = Sunday.
    pub first_day: u8,
    pub row_min_height: f32,
    pub event_level_height: f32,
    pub resources_initially_expanded: bool,
    pub resource_area_header_content: String,
    pub resource_area_columns: Vec<ColumnConfig>,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            view_type: "resourceTimelineDay".to_string(),
            slot_duration: DurationSpec::from_minutes(30),
            slot_label_interval: None,
            slot_label_format: None,
            slot_min_time: DurationSpec::from_seconds(0),
            slot_max_time: DurationSpec::from_days(1),
            slot_min_width: None,
            scroll_time: DurationSpec::from_minutes(6 * 60),
            first_day: 0,
            row_min_height: 30.0,
            event_level_height: 24.0,
            resources_initially_expanded: true,
            resource_area_header_content: "Resources".to_string(),
            resource_area_columns: Vec::new(),
        }
    }
}

impl TimelineOptions {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values no layout can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.slot_duration.as_seconds() <= 0 {
            return Err(TlviewError::invalid_option(
                "slotDuration",
                "must be greater than zero",
            ));
        }
        if let Some(interval) = self.slot_label_interval {
            if interval.as_seconds() <= 0 {
                return Err(TlviewError::invalid_option(
                    "slotLabelInterval",
                    "must be greater than zero",
                ));
            }
        }
        if self.slot_min_time >= self.slot_max_time {
            return Err(TlviewError::invalid_option(
                "slotMinTime",
                format!(
                    "{} is not before slotMaxTime {}",
                    self.slot_min_time, self.slot_max_time
                ),
            ));
        }
        if self.first_day > 6 {
            return Err(TlviewError::invalid_option("firstDay", "must be 0..=6"));
        }
        if !is_positive(self.row_min_height) || !is_positive(self.event_level_height) {
            return Err(TlviewError::invalid_option(
                "rowMinHeight",
                "row and level heights must be positive",
            ));
        }
        if let Some(width) = self.slot_min_width {
            if !is_positive(width) {
                return Err(TlviewError::invalid_option(
                    "slotMinWidth",
                    "must be positive",
                ));
            }
        }
        Ok(())
    }

    /// Columns to render, falling back to a single title column.
    pub fn effective_columns(&self) -> Vec<ColumnConfig> {
        if self.resource_area_columns.is_empty() {
            vec![ColumnConfig {
                header_content: self.resource_area_header_content.clone(),
                ..ColumnConfig::default()
            }]
        } else {
            self.resource_area_columns.clone()
        }
    }
}

fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}
