//! Ownership of rendered resource rows.
//!
//! The store keeps one [`ResourceRow`] per visible resource, in display
//! order, each holding the paired `<tr>` handles of both panes. A commit
//! applies a [`RowPlan`] to both tables together, so the pair is always
//! created, placed and removed as a unit.

use std::collections::HashMap;

use crate::error::Result;
use crate::layout::EventSegment;
use crate::render::{DomHost, NodeId, PaneKind, RowContext, RowMarkup, RowPane};

use super::{reconcile, FlatResource, RowAction, RowPlan};

/// The two row elements rendered for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandles {
    pub spreadsheet: NodeId,
    pub time_grid: NodeId,
}

/// A rendered row.
#[derive(Debug, Clone)]
pub struct ResourceRow {
    pub resource_id: String,
    pub depth: usize,
    pub row_spans: Vec<usize>,
    pub handles: RowHandles,
    /// Height both elements were last pinned to.
    pub height: Option<f32>,
    spreadsheet_markup: RowMarkup,
    time_grid_markup: RowMarkup,
}

impl ResourceRow {
    pub fn spreadsheet_markup(&self) -> &RowMarkup {
        &self.spreadsheet_markup
    }

    pub fn time_grid_markup(&self) -> &RowMarkup {
        &self.time_grid_markup
    }
}

/// What a commit did, for logging, notifications and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub created: Vec<String>,
    /// Retained rows whose spreadsheet cells were rewritten.
    pub spreadsheet_updated: Vec<String>,
    /// Retained rows whose time-grid cells were rewritten.
    pub time_grid_updated: usize,
    pub moved: usize,
    pub removed: Vec<String>,
}

impl CommitReport {
    /// Ids whose spreadsheet cells were (re)built, in display order.
    pub fn rendered_ids(&self) -> impl Iterator<Item = &str> {
        self.created
            .iter()
            .chain(&self.spreadsheet_updated)
            .map(String::as_str)
    }

    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.spreadsheet_updated.is_empty()
            && self.time_grid_updated == 0
            && self.moved == 0
            && self.removed.is_empty()
    }
}

/// Rendered rows in display order.
#[derive(Debug, Default)]
pub struct ResourceRowStore {
    rows: Vec<ResourceRow>,
}

impl ResourceRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[ResourceRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [ResourceRow] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn resource_ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.resource_id.clone()).collect()
    }

    pub fn get(&self, resource_id: &str) -> Option<&ResourceRow> {
        self.rows.iter().find(|r| r.resource_id == resource_id)
    }

    /// Diff the current rows against `next` without touching the DOM.
    pub fn plan(&self, next: &[FlatResource<'_>]) -> RowPlan {
        let prev: Vec<&str> = self.rows.iter().map(|r| r.resource_id.as_str()).collect();
        let next: Vec<&str> = next.iter().map(|r| r.resource.id.as_str()).collect();
        reconcile(&prev, &next)
    }

    /// Bring both tables in line with `next`.
    ///
    /// Rows keep their handles whenever their resource is still present.
    /// Content is rewritten only when the rendered markup differs from what
    /// the row last showed.
    pub fn commit<H, S, T>(
        &mut self,
        host: &mut H,
        next: &[FlatResource<'_>],
        segments: &HashMap<String, Vec<EventSegment>>,
        spreadsheet: &S,
        time_grid: &T,
    ) -> Result<CommitReport>
    where
        H: DomHost + ?Sized,
        S: RowPane + ?Sized,
        T: RowPane + ?Sized,
    {
        let plan = self.plan(next);
        let mut report = CommitReport::default();

        let mut previous: Vec<Option<ResourceRow>> = self.rows.drain(..).map(Some).collect();
        for &index in &plan.removed {
            if let Some(row) = previous.get_mut(index).and_then(Option::take) {
                host.remove_row(PaneKind::Spreadsheet, row.handles.spreadsheet)?;
                host.remove_row(PaneKind::TimeGrid, row.handles.time_grid)?;
                tracing::trace!(id = %row.resource_id, "row removed");
                report.removed.push(row.resource_id);
            }
        }

        let mut anchor: Option<RowHandles> = None;
        let mut rows = Vec::with_capacity(next.len());
        for (flat, action) in next.iter().zip(&plan.actions) {
            let row_segments = segments
                .get(&flat.resource.id)
                .map_or(&[][..], Vec::as_slice);
            let ctx = RowContext {
                row: flat,
                segments: row_segments,
            };
            let sheet_markup = spreadsheet.render_row(&ctx);
            let grid_markup = time_grid.render_row(&ctx);

            let reused = match action {
                RowAction::Retain { prev, moved } => previous
                    .get_mut(*prev)
                    .and_then(Option::take)
                    .map(|row| (row, *moved)),
                RowAction::Create => None,
            };

            let row = match reused {
                Some((mut row, moved)) => {
                    if row.spreadsheet_markup != sheet_markup {
                        host.set_row_content(row.handles.spreadsheet, &sheet_markup)?;
                        row.spreadsheet_markup = sheet_markup;
                        report.spreadsheet_updated.push(row.resource_id.clone());
                    }
                    if row.time_grid_markup != grid_markup {
                        host.set_row_content(row.handles.time_grid, &grid_markup)?;
                        row.time_grid_markup = grid_markup;
                        report.time_grid_updated += 1;
                    }
                    if moved {
                        place_pair(host, row.handles, anchor)?;
                        report.moved += 1;
                        tracing::trace!(id = %row.resource_id, "row moved");
                    }
                    row.depth = flat.depth;
                    row.row_spans.clone_from(&flat.row_spans);
                    row
                }
                None => {
                    let handles = RowHandles {
                        spreadsheet: host.create_row(PaneKind::Spreadsheet)?,
                        time_grid: host.create_row(PaneKind::TimeGrid)?,
                    };
                    for node in [handles.spreadsheet, handles.time_grid] {
                        host.set_attribute(node, "data-resource-id", &flat.resource.id)?;
                    }
                    host.set_row_content(handles.spreadsheet, &sheet_markup)?;
                    host.set_row_content(handles.time_grid, &grid_markup)?;
                    place_pair(host, handles, anchor)?;
                    tracing::trace!(id = %flat.resource.id, "row created");
                    report.created.push(flat.resource.id.clone());
                    ResourceRow {
                        resource_id: flat.resource.id.clone(),
                        depth: flat.depth,
                        row_spans: flat.row_spans.clone(),
                        handles,
                        height: None,
                        spreadsheet_markup: sheet_markup,
                        time_grid_markup: grid_markup,
                    }
                }
            };
            anchor = Some(row.handles);
            rows.push(row);
        }

        self.rows = rows;
        Ok(report)
    }

    /// Remove every row from both tables.
    pub fn clear<H: DomHost + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        for row in self.rows.drain(..) {
            host.remove_row(PaneKind::Spreadsheet, row.handles.spreadsheet)?;
            host.remove_row(PaneKind::TimeGrid, row.handles.time_grid)?;
        }
        Ok(())
    }
}

fn place_pair<H: DomHost + ?Sized>(
    host: &mut H,
    handles: RowHandles,
    anchor: Option<RowHandles>,
) -> Result<()> {
    host.place_row(
        PaneKind::Spreadsheet,
        handles.spreadsheet,
        anchor.map(|a| a.spreadsheet),
    )?;
    host.place_row(
        PaneKind::TimeGrid,
        handles.time_grid,
        anchor.map(|a| a.time_grid),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::render::MemoryDom;
    use crate::rows::{flatten_resources, ExpansionState};
    use crate::types::Resource;

    struct TitlePane(PaneKind);

    impl RowPane for TitlePane {
        fn kind(&self) -> PaneKind {
            self.0
        }

        fn header_html(&self) -> String {
            String::new()
        }

        fn render_row(&self, ctx: &RowContext<'_>) -> RowMarkup {
            RowMarkup {
                html: format!("<td>{}</td>", ctx.row.resource.title),
                min_height: 20.0,
            }
        }
    }

    fn commit(store: &mut ResourceRowStore, dom: &mut MemoryDom, resources: &[Resource]) -> CommitReport {
        let flat = flatten_resources(resources, &ExpansionState::new(true));
        store
            .commit(
                dom,
                &flat,
                &HashMap::new(),
                &TitlePane(PaneKind::Spreadsheet),
                &TitlePane(PaneKind::TimeGrid),
            )
            .unwrap()
    }

    fn abc() -> Vec<Resource> {
        vec![
            Resource::new("a", "A"),
            Resource::new("b", "B"),
            Resource::new("c", "C"),
        ]
    }

    #[test]
    fn test_pairs_stay_aligned() {
        let mut store = ResourceRowStore::new();
        let mut dom = MemoryDom::default();
        commit(&mut store, &mut dom, &abc());

        let mut shuffled = abc();
        shuffled.rotate_left(1);
        shuffled.push(Resource::new("d", "D"));
        commit(&mut store, &mut dom, &shuffled);

        for pane in [PaneKind::Spreadsheet, PaneKind::TimeGrid] {
            assert_eq!(dom.resource_ids(pane), vec!["b", "c", "a", "d"]);
        }
        assert_eq!(store.resource_ids(), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_unchanged_commit_is_noop() {
        let mut store = ResourceRowStore::new();
        let mut dom = MemoryDom::default();
        commit(&mut store, &mut dom, &abc());
        dom.reset_stats();

        let report = commit(&mut store, &mut dom, &abc());
        assert!(report.is_noop());
        assert_eq!(dom.stats().content_writes, 0);
        assert_eq!(dom.stats().rows_placed, 0);
    }

    #[test]
    fn test_title_change_rewrites_one_row() {
        let mut store = ResourceRowStore::new();
        let mut dom = MemoryDom::default();
        commit(&mut store, &mut dom, &abc());
        let before = store.rows()[0].handles;

        let mut next = abc();
        next[1].title = "B2".into();
        let report = commit(&mut store, &mut dom, &next);

        assert_eq!(report.spreadsheet_updated, vec!["b".to_string()]);
        assert_eq!(store.rows()[0].handles, before);
        assert_eq!(report.rendered_ids().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_clear() {
        let mut store = ResourceRowStore::new();
        let mut dom = MemoryDom::default();
        commit(&mut store, &mut dom, &abc());
        store.clear(&mut dom).unwrap();
        assert!(store.is_empty());
        assert!(dom.rows(PaneKind::Spreadsheet).is_empty());
    }
}
