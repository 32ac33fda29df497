//! Pane synchronization tests
//!
//! Row heights, vertical scroll mirroring and scroll restore between the
//! resource list and the time grid.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::*;
use tlview::{
    DomHost, DurationSpec, EventRecord, MemoryDom, PaneKind, ScrollState, ScrollSynchronizer,
    StaticSource, TimelineController, TimelineOptions,
};

// ============================================================================
// Row heights
// ============================================================================

#[test]
fn test_rows_share_one_height() {
    let mut dom = MemoryDom::default();
    let controller = rendered(three_auditoriums(), &mut dom);

    for row in controller.row_store().rows() {
        let sheet = dom.row_height(row.handles.spreadsheet).unwrap();
        let grid = dom.row_height(row.handles.time_grid).unwrap();
        assert_eq!(sheet, grid);
        assert_eq!(row.height, Some(sheet));
        assert_eq!(sheet, 30.0);
    }
}

#[test]
fn test_stacked_events_grow_both_rows() {
    let mut dom = MemoryDom::default();
    let mut controller = TimelineController::new(midnight_options(), aug(7)).unwrap();
    controller.load_resources(&mut StaticSource::new(three_auditoriums()));
    controller.load_events(&mut StaticSource::new(vec![
        EventRecord::new("1", "b", marker("2015-08-07T09:00"), marker("2015-08-07T11:00")),
        EventRecord::new("2", "b", marker("2015-08-07T10:00"), marker("2015-08-07T12:00")),
        EventRecord::new("3", "b", marker("2015-08-07T10:30"), marker("2015-08-07T13:00")),
    ]));
    controller.run_pass(&mut dom).unwrap();

    let b = controller.row_store().get("b").unwrap();
    // Three levels of 24px outgrow the 30px minimum.
    assert_eq!(b.height, Some(72.0));
    assert_eq!(dom.row_height(b.handles.spreadsheet), Some(72.0));
    assert_eq!(controller.row_store().get("a").unwrap().height, Some(30.0));
}

#[test]
fn test_resync_after_late_content() {
    let mut dom = MemoryDom::default();
    let mut controller = rendered(three_auditoriums(), &mut dom);
    let c = controller.row_store().get("c").unwrap().handles;

    // An image in the resource cell finished loading.
    dom.set_natural_height(c.spreadsheet, 55.0);
    controller.resync_heights(&mut dom).unwrap();

    assert_eq!(dom.row_height(c.spreadsheet), Some(55.0));
    assert_eq!(dom.row_height(c.time_grid), Some(55.0));
    assert_eq!(controller.row_store().get("c").unwrap().height, Some(55.0));
}

#[test]
fn test_heights_shrink_when_content_does() {
    let mut dom = MemoryDom::default();
    let mut controller = rendered(three_auditoriums(), &mut dom);
    let a = controller.row_store().get("a").unwrap().handles;

    dom.set_natural_height(a.time_grid, 80.0);
    controller.resync_heights(&mut dom).unwrap();
    assert_eq!(dom.row_height(a.spreadsheet), Some(80.0));

    dom.set_natural_height(a.time_grid, 40.0);
    controller.resync_heights(&mut dom).unwrap();
    assert_eq!(dom.row_height(a.spreadsheet), Some(40.0));
}

// ============================================================================
// Scroll mirroring
// ============================================================================

fn tall_scene() -> (TimelineController, MemoryDom) {
    let mut dom = MemoryDom::new(400.0, 300.0);
    let controller = rendered(auditoriums(""), &mut dom);
    (controller, dom)
}

#[test]
fn test_time_grid_scroll_is_mirrored() {
    let (_controller, mut dom) = tall_scene();
    dom.set_scroll_state(PaneKind::TimeGrid, ScrollState::new(120.0, 40.0));
    ScrollSynchronizer::handle_scroll(&mut dom, PaneKind::TimeGrid);

    assert_eq!(dom.scroll_state(PaneKind::Spreadsheet), ScrollState::new(120.0, 0.0));
}

#[test]
fn test_spreadsheet_scroll_drives_time_grid() {
    let (_controller, mut dom) = tall_scene();
    dom.set_scroll_state(PaneKind::TimeGrid, ScrollState::new(0.0, 40.0));
    dom.set_scroll_state(PaneKind::Spreadsheet, ScrollState::new(80.0, 0.0));
    ScrollSynchronizer::handle_scroll(&mut dom, PaneKind::Spreadsheet);

    assert_eq!(dom.scroll_state(PaneKind::TimeGrid), ScrollState::new(80.0, 40.0));
    assert_eq!(dom.scroll_state(PaneKind::Spreadsheet), ScrollState::new(80.0, 0.0));
}

#[test]
fn test_spreadsheet_never_scrolls_horizontally() {
    let (_controller, mut dom) = tall_scene();
    dom.set_scroll_state(PaneKind::Spreadsheet, ScrollState::new(0.0, 75.0));
    assert_eq!(dom.scroll_state(PaneKind::Spreadsheet).scroll_left, 0.0);
}

// ============================================================================
// Restore
// ============================================================================

#[test]
fn test_restore_clamps_after_rows_removed() {
    let (mut controller, mut dom) = tall_scene();
    // 26 rows of 30px in a 300px viewport.
    let applied = ScrollSynchronizer::restore_scroll(&mut dom, ScrollState::new(1000.0, 0.0));
    assert_eq!(applied.scroll_top, 480.0);

    for id in ["p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z"] {
        controller.remove_resource(id);
    }
    let report = controller.run_pass(&mut dom).unwrap();

    // 15 rows remain: 450px of content.
    assert_eq!(report.scroll.scroll_top, 150.0);
    assert_eq!(dom.scroll_state(PaneKind::Spreadsheet).scroll_top, 150.0);
}

#[test]
fn test_first_pass_scrolls_to_scroll_time() {
    let mut dom = MemoryDom::new(400.0, 300.0);
    let mut controller = TimelineController::new(TimelineOptions::default(), aug(7)).unwrap();
    let report = controller.run_pass(&mut dom).unwrap();

    assert!(report.scroll_reset);
    assert_eq!(report.scroll, ScrollState::new(0.0, 360.0));
}

#[test]
fn test_slot_structure_change_resets_horizontal_only() {
    let options = TimelineOptions {
        slot_min_width: Some(40.0),
        ..TimelineOptions::default()
    };
    let mut dom = MemoryDom::new(400.0, 300.0);
    let mut controller = TimelineController::new(options.clone(), aug(7)).unwrap();
    controller.load_resources(&mut StaticSource::new(auditoriums("")));
    controller.run_pass(&mut dom).unwrap();
    ScrollSynchronizer::restore_scroll(&mut dom, ScrollState::new(150.0, 900.0));

    controller
        .set_options(TimelineOptions {
            slot_duration: DurationSpec::from_minutes(60),
            ..options
        })
        .unwrap();
    let report = controller.run_pass(&mut dom).unwrap();

    // 06:00 on 40px hourly slots.
    assert!(report.scroll_reset);
    assert_eq!(report.scroll, ScrollState::new(150.0, 240.0));
    assert_eq!(dom.grid_width(), 960.0);
}

#[test]
fn test_slot_width_change_keeps_time_at_left_edge() {
    let mut dom = MemoryDom::new(400.0, 300.0);
    let mut controller = TimelineController::new(TimelineOptions::default(), aug(7)).unwrap();
    controller.load_resources(&mut StaticSource::new(three_auditoriums()));
    controller.run_pass(&mut dom).unwrap();
    // Half way into the 06:00 slot.
    ScrollSynchronizer::restore_scroll(&mut dom, ScrollState::new(0.0, 375.0));

    controller
        .set_options(TimelineOptions {
            slot_min_width: Some(60.0),
            ..TimelineOptions::default()
        })
        .unwrap();
    let report = controller.run_pass(&mut dom).unwrap();

    assert!(!report.scroll_reset);
    assert_eq!(report.slot_width, 60.0);
    assert_eq!(report.scroll.scroll_left, 750.0);
    assert_eq!(dom.scroll_state(PaneKind::TimeGrid).scroll_left, 750.0);
}

#[test]
fn test_resize_clamps_existing_scroll() {
    let (_controller, mut dom) = tall_scene();
    ScrollSynchronizer::restore_scroll(&mut dom, ScrollState::new(400.0, 0.0));
    dom.resize(400.0, 600.0);
    assert_eq!(dom.scroll_state(PaneKind::TimeGrid).scroll_top, 180.0);
}
