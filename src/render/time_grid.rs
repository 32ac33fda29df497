//! The scrollable time-slot pane.
//!
//! Rows hold absolutely positioned event elements; horizontal position comes
//! from [`SlotCoords`] and vertical position from the segment's level.

use std::fmt::Write;
use std::rc::Rc;

use crate::layout::{level_count, row_content_height, SlotCoords, TimelineDateProfile};

use super::{html_escape, DateFormatter, PaneKind, RowContext, RowMarkup, RowPane, Theme};

/// Renders slot headers, slats and per-resource event rows.
pub struct TimeGridPane {
    tdp: Rc<TimelineDateProfile>,
    coords: SlotCoords,
    formatter: Rc<dyn DateFormatter>,
    theme: Rc<dyn Theme>,
    level_height: f32,
    row_min_height: f32,
}

impl TimeGridPane {
    pub fn new(
        tdp: Rc<TimelineDateProfile>,
        coords: SlotCoords,
        formatter: Rc<dyn DateFormatter>,
        theme: Rc<dyn Theme>,
        level_height: f32,
        row_min_height: f32,
    ) -> Self {
        Self {
            tdp,
            coords,
            formatter,
            theme,
            level_height,
            row_min_height,
        }
    }

    pub fn coords(&self) -> &SlotCoords {
        &self.coords
    }

    fn slot_classes(&self, index: usize) -> String {
        let mut classes = String::new();
        if self.tdp.is_day_start(index) {
            classes.push_str(" tl-day-start");
        }
        if self.tdp.is_week_start(index) {
            classes.push_str(" tl-week-start");
        }
        classes
    }

    /// One background cell per slot, each tagged with its date.
    pub fn slats_html(&self) -> String {
        let omit_time = !self.tdp.is_time_scale;
        let mut out = String::from("<tr class=\"tl-slats\">");
        for (i, slot) in self.tdp.slots.iter().enumerate() {
            let _ = write!(
                out,
                "<td class=\"{}{}\" data-date=\"{}\" style=\"width:{}px\"></td>",
                self.theme.class_name("widgetContent"),
                self.slot_classes(i),
                self.formatter.format_iso(*slot, omit_time),
                self.coords.slot_width()
            );
        }
        out.push_str("</tr>");
        out
    }
}

impl RowPane for TimeGridPane {
    fn kind(&self) -> PaneKind {
        PaneKind::TimeGrid
    }

    fn header_html(&self) -> String {
        let omit_time = !self.tdp.is_time_scale;
        let per_label = self.tdp.slots_per_label.max(1);
        let mut out = String::from("<tr>");
        for (group, chunk) in self.tdp.slots.chunks(per_label).enumerate() {
            let Some(first) = chunk.first() else {
                continue;
            };
            let index = group * per_label;
            let _ = write!(
                out,
                "<th class=\"{}{}\" colspan=\"{}\" data-date=\"{}\"><div class=\"tl-cell-content\"><span class=\"tl-slot-cushion\">{}</span></div></th>",
                self.theme.class_name("widgetHeader"),
                self.slot_classes(index),
                chunk.len(),
                self.formatter.format_iso(*first, omit_time),
                html_escape(&self.formatter.format(*first, &self.tdp.label_format))
            );
        }
        out.push_str("</tr>");
        out
    }

    fn render_row(&self, ctx: &RowContext<'_>) -> RowMarkup {
        let levels = level_count(ctx.segments);
        let height = row_content_height(levels, self.level_height, self.row_min_height);
        let event_class = self.theme.class_name("event");

        let mut html = String::new();
        let _ = write!(
            html,
            "<td><div class=\"tl-event-container\" style=\"height:{height}px\">"
        );
        for seg in ctx.segments {
            let left = self.coords.date_to_px(seg.start);
            let width = (self.coords.date_to_px(seg.end) - left).max(0.0);
            let level = f32::from(u16::try_from(seg.level).unwrap_or(u16::MAX));
            let top = level * self.level_height;
            let _ = write!(html, "<a class=\"{event_class}");
            if seg.is_start {
                html.push_str(" tl-event-start");
            }
            if seg.is_end {
                html.push_str(" tl-event-end");
            }
            let _ = write!(
                html,
                "\" data-event-id=\"{}\" style=\"left:{left}px;width:{width}px;top:{top}px\"><span class=\"tl-event-title\">{}</span></a>",
                html_escape(&seg.event_id),
                html_escape(&seg.title)
            );
        }
        html.push_str("</div></td>");

        RowMarkup {
            html,
            min_height: height,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::layout::{build_timeline_date_profile, slice_events, SlotOptionsKey};
    use crate::render::{ChronoFormatter, StandardTheme};
    use crate::rows::FlatResource;
    use crate::types::{parse_date_marker, DateProfile, EventRecord, Resource, TimelineOptions};

    fn pane() -> TimeGridPane {
        let profile = DateProfile::day(parse_date_marker("2015-08-07").unwrap().date());
        let options = TimelineOptions::default();
        let tdp = build_timeline_date_profile(&profile, &SlotOptionsKey::from_options(&options)).unwrap();
        let coords = SlotCoords::new(&tdp, 40.0, None);
        TimeGridPane::new(
            Rc::new(tdp),
            coords,
            Rc::new(ChronoFormatter),
            Rc::new(StandardTheme),
            24.0,
            30.0,
        )
    }

    #[test]
    fn test_header_groups_hours() {
        let html = pane().header_html();
        assert_eq!(html.matches("colspan=\"2\"").count(), 24);
        assert!(html.contains("data-date=\"2015-08-07T00:00:00\""));
        assert!(html.contains("<span class=\"tl-slot-cushion\">12am</span>"));
    }

    #[test]
    fn test_slats_carry_dates() {
        let html = pane().slats_html();
        assert_eq!(html.matches("data-date=").count(), 48);
        assert!(html.contains("data-date=\"2015-08-07T00:30:00\""));
    }

    #[test]
    fn test_overlapping_events_stack() {
        let pane = pane();
        let d = |s: &str| parse_date_marker(s).unwrap();
        let events = vec![
            EventRecord::new("e1", "a", d("2015-08-07T01:00"), d("2015-08-07T03:00")),
            EventRecord::new("e2", "a", d("2015-08-07T02:00"), d("2015-08-07T04:00")),
        ];
        let segments = slice_events(&events, &pane.tdp);
        let r = Resource::new("a", "A");
        let row = FlatResource {
            resource: &r,
            depth: 0,
            has_children: false,
            expanded: true,
            row_spans: vec![1],
        };
        let markup = pane.render_row(&RowContext {
            row: &row,
            segments: &segments["a"],
        });
        assert_eq!(markup.min_height, 48.0);
        assert!(markup.html.contains("left:80px;width:160px;top:0px"));
        assert!(markup.html.contains("left:160px;width:160px;top:24px"));
    }
}
