//! Spreadsheet pane tests
//!
//! Columns, group merging, cell hooks and the resource hierarchy as seen in
//! the rendered resource list.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::*;
use tlview::render::ColSpec;
use tlview::{
    ColumnConfig, MemoryDom, PaneKind, Resource, Section, StaticSource, TimelineController,
    TimelineOptions,
};

const INDENT: &str = "<span class=\"tl-icon\"></span>";

fn with_options(options: TimelineOptions, resources: Vec<Resource>) -> (TimelineController, MemoryDom) {
    let mut dom = MemoryDom::default();
    let mut controller = TimelineController::new(options, aug(7)).unwrap();
    controller.load_resources(&mut StaticSource::new(resources));
    controller.run_pass(&mut dom).unwrap();
    (controller, dom)
}

fn column(field: Option<&str>, header: &str, group: bool) -> ColumnConfig {
    ColumnConfig {
        field: field.map(str::to_string),
        header_content: header.to_string(),
        group,
        width: None,
    }
}

// ============================================================================
// Columns
// ============================================================================

#[test]
fn test_default_column_shows_titles() {
    let mut dom = MemoryDom::default();
    let _controller = rendered(three_auditoriums(), &mut dom);

    assert!(spreadsheet_html(&dom, "a").contains("Auditorium A"));
    let header = dom.section(Section::SpreadsheetHeader).unwrap();
    assert!(header.contains("Resources"));
}

#[test]
fn test_group_column_merges_equal_values() {
    let options = TimelineOptions {
        resource_area_columns: vec![
            column(Some("building"), "Building", true),
            column(None, "Room", false),
        ],
        ..midnight_options()
    };
    let resources = vec![
        Resource::new("a", "Room A").with_prop("building", "North"),
        Resource::new("b", "Room B").with_prop("building", "North"),
        Resource::new("c", "Room C").with_prop("building", "South"),
    ];
    let (_controller, dom) = with_options(options, resources);

    let a = spreadsheet_html(&dom, "a");
    assert!(a.contains("rowspan=\"2\""));
    assert!(a.contains("North"));

    let b = spreadsheet_html(&dom, "b");
    assert!(!b.contains("North"));
    assert_eq!(b.matches("<td").count(), 1);

    let c = spreadsheet_html(&dom, "c");
    assert!(c.contains("South"));
    assert!(!c.contains("rowspan"));

    let header = dom.section(Section::SpreadsheetHeader).unwrap();
    assert!(header.contains("Building") && header.contains("Room"));
}

#[test]
fn test_main_column_carries_gutter() {
    let options = TimelineOptions {
        resource_area_columns: vec![
            column(Some("building"), "Building", true),
            column(None, "Room", false),
            column(Some("capacity"), "Capacity", false),
        ],
        ..midnight_options()
    };
    let resources = vec![Resource::new("a", "Room A")
        .with_prop("building", "North")
        .with_prop("capacity", 40)];
    let (_controller, dom) = with_options(options, resources);

    let html = spreadsheet_html(&dom, "a");
    let gutter = html.find("tl-expander-space").unwrap();
    let title = html.find("Room A").unwrap();
    let building = html.find("North").unwrap();
    assert!(building < gutter && gutter < title);
    assert!(html.contains("40"));
    assert_eq!(html.matches("tl-expander-space").count(), 1);
}

#[test]
fn test_empty_cell_renders_placeholder() {
    let options = TimelineOptions {
        resource_area_columns: vec![column(None, "Room", false), column(Some("floor"), "Floor", false)],
        ..midnight_options()
    };
    let (_controller, dom) = with_options(options, vec![Resource::new("a", "Room A")]);
    assert!(spreadsheet_html(&dom, "a").contains("&nbsp;"));
}

#[test]
fn test_text_and_render_hooks() {
    let mut dom = MemoryDom::default();
    let mut controller = TimelineController::new(midnight_options(), aug(7)).unwrap();
    let columns = ColSpec::from_configs(&[column(None, "Room", false), column(Some("floor"), "Floor", false)])
        .into_iter()
        .map(|col| {
            if col.field.is_some() {
                col.with_text(|_, value| value.map_or_else(|| "ground".to_string(), |v| format!("level {v}")))
            } else {
                col.with_render(|_, text| Some(format!("<b class=\"room\">{text}</b>")))
            }
        })
        .collect();
    controller.set_columns(columns);
    controller.load_resources(&mut StaticSource::new(vec![
        Resource::new("a", "Room A").with_prop("floor", 2),
        Resource::new("b", "Room <B>"),
    ]));
    controller.run_pass(&mut dom).unwrap();

    let a = spreadsheet_html(&dom, "a");
    assert!(a.contains("<b class=\"room\">Room A</b>"));
    assert!(a.contains("level 2"));
    assert!(spreadsheet_html(&dom, "b").contains("ground"));
}

#[test]
fn test_titles_are_escaped() {
    let mut dom = MemoryDom::default();
    let _controller = rendered(vec![Resource::new("x", "<script>alert(1)</script>")], &mut dom);
    let html = spreadsheet_html(&dom, "x");
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

// ============================================================================
// Hierarchy
// ============================================================================

fn campus() -> Vec<Resource> {
    vec![
        Resource::new("north", "North Hall")
            .with_child(Resource::new("n1", "Room N1"))
            .with_child(Resource::new("n2", "Room N2")),
        Resource::new("south", "South Hall"),
        Resource::new("s1", "Room S1").with_parent("south"),
    ]
}

#[test]
fn test_nested_and_flat_children_indent() {
    let mut dom = MemoryDom::default();
    let _controller = rendered(campus(), &mut dom);

    assert_eq!(ids(&dom), vec!["north", "n1", "n2", "south", "s1"]);
    // Leaf rows: one indent per level plus the empty expander slot.
    assert_eq!(spreadsheet_html(&dom, "n1").matches(INDENT).count(), 2);
    assert_eq!(spreadsheet_html(&dom, "s1").matches(INDENT).count(), 2);
    assert_eq!(spreadsheet_html(&dom, "north").matches(INDENT).count(), 0);
    assert!(spreadsheet_html(&dom, "north").contains("tl-icon-minus-square"));
}

#[test]
fn test_collapse_and_expand() {
    let mut dom = MemoryDom::default();
    let mut controller = rendered(campus(), &mut dom);
    let south = dom.find_row(PaneKind::Spreadsheet, "south").unwrap();

    assert!(!controller.toggle_expanded("north"));
    let report = controller.run_pass(&mut dom).unwrap();
    assert_eq!(ids(&dom), vec!["north", "south", "s1"]);
    assert_eq!(report.removed, 2);
    assert!(spreadsheet_html(&dom, "north").contains("tl-icon-plus-square"));
    assert_eq!(dom.find_row(PaneKind::Spreadsheet, "south"), Some(south));

    assert!(controller.toggle_expanded("north"));
    let report = controller.run_pass(&mut dom).unwrap();
    assert_eq!(ids(&dom), vec!["north", "n1", "n2", "south", "s1"]);
    assert_eq!(report.created, 2);
    assert_eq!(report.moved, 0);
}

#[test]
fn test_initially_collapsed() {
    let options = TimelineOptions {
        resources_initially_expanded: false,
        ..midnight_options()
    };
    let (_controller, dom) = with_options(options, campus());
    assert_eq!(ids(&dom), vec!["north", "south"]);
}

#[test]
fn test_remove_parent_takes_children() {
    let mut dom = MemoryDom::default();
    let mut controller = rendered(campus(), &mut dom);
    assert!(controller.remove_resource("south"));
    controller.run_pass(&mut dom).unwrap();
    assert_eq!(ids(&dom), vec!["north", "n1", "n2"]);
}

#[test]
fn test_unknown_parent_renders_at_top_level() {
    let mut dom = MemoryDom::default();
    let _controller = rendered(
        vec![
            Resource::new("a", "A"),
            Resource::new("orphan", "Orphan").with_parent("nowhere"),
        ],
        &mut dom,
    );
    assert_eq!(ids(&dom), vec!["a", "orphan"]);
    assert_eq!(spreadsheet_html(&dom, "orphan").matches(INDENT).count(), 1);
}

#[test]
fn test_parent_cycle_is_broken() {
    let mut dom = MemoryDom::default();
    let _controller = rendered(
        vec![
            Resource::new("p", "P").with_parent("q"),
            Resource::new("q", "Q").with_parent("p"),
        ],
        &mut dom,
    );
    let mut shown = ids(&dom);
    shown.sort();
    assert_eq!(shown, vec!["p", "q"]);
}

#[test]
fn test_duplicate_ids_render_once() {
    let mut dom = MemoryDom::default();
    let _controller = rendered(
        vec![Resource::new("a", "First"), Resource::new("a", "Second")],
        &mut dom,
    );
    assert_eq!(ids(&dom), vec!["a"]);
    assert!(spreadsheet_html(&dom, "a").contains("First"));
}
