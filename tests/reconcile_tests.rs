//! Keyed row diff tests
//!
//! Covers the pure plan as well as the store applying it to a document.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::*;
use test_case::test_case;
use tlview::rows::{reconcile, RowAction};
use tlview::{MemoryDom, PaneKind, Resource, StaticSource};

// ============================================================================
// Plans
// ============================================================================

#[test]
fn test_identity_plan() {
    let plan = reconcile(&["a", "b", "c"], &["a", "b", "c"]);
    assert!(plan.is_identity());
    assert_eq!(plan.created(), 0);
    assert_eq!(plan.moved(), 0);
}

#[test_case(&["a", "b", "c", "d"], &["d", "a", "b", "c"], 1 ; "last to front")]
#[test_case(&["a", "b", "c", "d"], &["b", "c", "d", "a"], 1 ; "first to back")]
#[test_case(&["a", "b", "c", "d"], &["d", "c", "b", "a"], 3 ; "reversed")]
#[test_case(&["a", "b", "c", "d"], &["b", "a", "d", "c"], 2 ; "adjacent swaps")]
#[test_case(&["a", "b", "c"], &["a", "c"], 0 ; "removal alone moves nothing")]
fn test_minimal_moves(prev: &[&str], next: &[&str], moved: usize) {
    assert_eq!(reconcile(prev, next).moved(), moved);
}

#[test]
fn test_removed_and_created() {
    let plan = reconcile(&["a", "b", "c"], &["b", "x", "c"]);
    assert_eq!(plan.removed, vec![0]);
    assert_eq!(plan.created(), 1);
    assert_eq!(plan.actions[1], RowAction::Create);
    assert_eq!(plan.actions[0], RowAction::Retain { prev: 1, moved: false });
}

#[test]
fn test_empty_lists() {
    let empty: [&str; 0] = [];
    assert!(reconcile(&empty, &empty).is_identity());
    assert_eq!(reconcile(&empty, &["a"]).created(), 1);
    assert_eq!(reconcile(&["a"], &empty).removed, vec![0]);
}

#[test]
fn test_large_shuffle_keeps_most_rows() {
    let prev: Vec<String> = (0..1000).map(|i| format!("r{i}")).collect();
    let mut next = prev.clone();
    let moved = next.remove(10);
    next.insert(900, moved);
    let plan = reconcile(&prev, &next);
    assert_eq!(plan.moved(), 1);
    assert!(plan.removed.is_empty());
}

// ============================================================================
// Store against a document
// ============================================================================

#[test]
fn test_rows_are_paired_across_panes() {
    let mut dom = MemoryDom::default();
    let controller = rendered(auditoriums(""), &mut dom);

    for row in controller.row_store().rows() {
        assert_eq!(
            dom.attribute(row.handles.spreadsheet, "data-resource-id"),
            Some(row.resource_id.as_str())
        );
        assert_eq!(
            dom.attribute(row.handles.time_grid, "data-resource-id"),
            Some(row.resource_id.as_str())
        );
    }
    assert_eq!(dom.rows(PaneKind::Spreadsheet).len(), 26);
    assert_eq!(dom.rows(PaneKind::TimeGrid).len(), 26);
}

#[test]
fn test_mixed_change_keeps_survivors() {
    let mut dom = MemoryDom::default();
    let mut controller = rendered(three_auditoriums(), &mut dom);
    let b = controller.row_store().get("b").unwrap().handles;

    let next = vec![
        Resource::new("d", "Auditorium D"),
        Resource::new("b", "Auditorium B"),
        Resource::new("a", "Auditorium A"),
    ];
    controller.load_resources(&mut StaticSource::new(next));
    let report = controller.run_pass(&mut dom).unwrap();

    assert_eq!(ids(&dom), vec!["d", "b", "a"]);
    assert_eq!(report.created, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(report.moved, 1);
    assert_eq!(controller.row_store().get("b").unwrap().handles, b);
}

#[test]
fn test_clear_empties_both_panes() {
    let mut dom = MemoryDom::default();
    let mut controller = rendered(three_auditoriums(), &mut dom);
    controller.load_resources(&mut StaticSource::new(Vec::new()));
    let report = controller.run_pass(&mut dom).unwrap();

    assert_eq!(report.removed, 3);
    assert!(ids(&dom).is_empty());
    assert!(controller.row_store().is_empty());
}
