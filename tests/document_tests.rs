//! Scene document tests
//!
//! Renders `tests/fixtures/scene.json`, the same input the CLI takes.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use tlview::{render_document, render_document_html, DomHost, PaneKind, TimelineDocument};

const SCENE: &str = include_str!("fixtures/scene.json");

fn scene() -> TimelineDocument {
    TimelineDocument::from_json(SCENE).unwrap()
}

fn time_grid_html(dom: &tlview::MemoryDom, id: &str) -> String {
    let node = dom.find_row(PaneKind::TimeGrid, id).unwrap();
    dom.row_html(node).unwrap().to_string()
}

#[test]
fn test_scene_row_order() {
    let dom = render_document(&scene()).unwrap();
    assert_eq!(
        dom.resource_ids(PaneKind::Spreadsheet),
        vec!["a", "b", "b1", "c", "c1"]
    );
}

#[test]
fn test_scene_groups_buildings() {
    let dom = render_document(&scene()).unwrap();
    let a = dom.find_row(PaneKind::Spreadsheet, "a").unwrap();
    let c = dom.find_row(PaneKind::Spreadsheet, "c").unwrap();
    assert!(dom.row_html(a).unwrap().contains("rowspan=\"3\""));
    assert!(dom.row_html(c).unwrap().contains("rowspan=\"2\""));
}

#[test]
fn test_scene_event_placement() {
    let dom = render_document(&scene()).unwrap();

    // Shared event shows in both owners' rows.
    assert!(time_grid_html(&dom, "a").contains("data-event-id=\"4\""));
    assert!(time_grid_html(&dom, "c1").contains("data-event-id=\"4\""));

    // No end: one hour from 10:00 on 30px half-hour slots.
    assert!(time_grid_html(&dom, "b1").contains("left:600px;width:60px;top:0px"));

    // Clipped on both sides of the day.
    let a = time_grid_html(&dom, "a");
    assert!(a.contains("top:24px"));
    assert!(!a.contains("tl-event tl-event-start\" data-event-id=\"3\""));
}

#[test]
fn test_scene_rows_fit_stacked_events() {
    let dom = render_document(&scene()).unwrap();
    let a = dom.find_row(PaneKind::Spreadsheet, "a").unwrap();
    let b = dom.find_row(PaneKind::Spreadsheet, "b").unwrap();
    assert_eq!(dom.row_height(a), Some(48.0));
    assert_eq!(dom.row_height(b), Some(30.0));
}

#[test]
fn test_scene_starts_at_scroll_time() {
    let dom = render_document(&scene()).unwrap();
    assert_eq!(dom.scroll_state(PaneKind::TimeGrid).scroll_left, 480.0);
}

#[test]
fn test_scene_html() {
    let html = render_document_html(&scene()).unwrap();
    assert!(html.contains("Seats"));
    assert!(html.contains("width:60px"));
    assert!(html.contains("Green Room"));
    assert!(html.contains("250"));
}
