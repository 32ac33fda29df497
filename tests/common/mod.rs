//! Common test fixtures for timeline tests.
//!
//! Builders for the auditorium scene used across the rerendering, scroll and
//! spreadsheet tests, plus a few controller shortcuts.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::cell::Cell;
use std::rc::Rc;

use chrono::NaiveDate;
use tlview::{
    parse_date_marker, DateMarker, DateProfile, DurationSpec, EventRecord, MemoryDom, PaneKind,
    Resource, StaticSource, TimelineController, TimelineOptions,
};

// ============================================================================
// Dates
// ============================================================================

/// Single-day profile for August `day`, 2015.
pub fn aug(day: u32) -> DateProfile {
    DateProfile::day(NaiveDate::from_ymd_opt(2015, 8, day).unwrap())
}

pub fn marker(s: &str) -> DateMarker {
    parse_date_marker(s).unwrap_or_else(|| panic!("bad date literal {s}"))
}

// ============================================================================
// Scene data
// ============================================================================

/// Auditoriums A through Z. The title of E carries `suffix`, which lets a
/// test tell one fetch from the next.
pub fn auditoriums(suffix: &str) -> Vec<Resource> {
    ('a'..='z')
        .map(|c| {
            let upper = c.to_ascii_uppercase();
            let title = if c == 'e' {
                format!("Auditorium E{suffix}")
            } else {
                format!("Auditorium {upper}")
            };
            Resource::new(c.to_string(), title)
        })
        .collect()
}

pub fn three_auditoriums() -> Vec<Resource> {
    vec![
        Resource::new("a", "Auditorium A"),
        Resource::new("b", "Auditorium B"),
        Resource::new("c", "Auditorium C"),
    ]
}

pub fn auditorium_events() -> Vec<EventRecord> {
    vec![
        EventRecord::new("1", "b", marker("2015-08-07T02:00:00"), marker("2015-08-07T07:00:00"))
            .with_title("event 1"),
        EventRecord::new("2", "c", marker("2015-08-07T05:00:00"), marker("2015-08-07T22:00:00"))
            .with_title("event 2"),
        EventRecord::new("3", "d", marker("2015-08-06"), marker("2015-08-08")).with_title("event 3"),
        EventRecord::new("4", "e", marker("2015-08-07T03:00:00"), marker("2015-08-07T08:00:00"))
            .with_title("event 4"),
        EventRecord::new("5", "f", marker("2015-08-07T00:30:00"), marker("2015-08-07T02:30:00"))
            .with_title("event 5"),
    ]
}

// ============================================================================
// Controllers
// ============================================================================

/// Day view options that start scrolled to midnight.
pub fn midnight_options() -> TimelineOptions {
    TimelineOptions {
        scroll_time: DurationSpec::from_seconds(0),
        ..TimelineOptions::default()
    }
}

/// A controller on 2015-08-07 with `resources` loaded and one pass rendered.
pub fn rendered(resources: Vec<Resource>, dom: &mut MemoryDom) -> TimelineController {
    let mut controller = TimelineController::new(midnight_options(), aug(7)).unwrap();
    controller.load_resources(&mut StaticSource::new(resources));
    controller.run_pass(dom).unwrap();
    controller
}

/// Count resource-render notifications.
pub fn count_renders(controller: &mut TimelineController) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    controller.on_resource_render(move |_| seen.set(seen.get() + 1));
    count
}

/// Spreadsheet HTML of the row showing `resource_id`.
pub fn spreadsheet_html<'a>(dom: &'a MemoryDom, resource_id: &str) -> &'a str {
    let node = dom
        .find_row(PaneKind::Spreadsheet, resource_id)
        .unwrap_or_else(|| panic!("no spreadsheet row for {resource_id}"));
    dom.row_html(node).unwrap()
}

pub fn ids(dom: &MemoryDom) -> Vec<String> {
    let sheet = dom.resource_ids(PaneKind::Spreadsheet);
    assert_eq!(
        sheet,
        dom.resource_ids(PaneKind::TimeGrid),
        "panes disagree on row order"
    );
    sheet
}
