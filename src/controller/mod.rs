//! Render-pass orchestration.
//!
//! [`TimelineController`] owns the resource and event lists, the row store
//! and the memoized slot profile. State changes only mark the controller
//! dirty; DOM work happens in [`TimelineController::run_pass`], which runs
//! the whole pipeline (geometry, flatten, diff, commit, height sync, scroll
//! restore) against a [`DomHost`].

mod fetch;

pub use fetch::{
    EventSource, FetchArg, FetchOutcome, FetchRequest, FetchSequencer, FetchToken,
    ResourceSource, StaticSource,
};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use crate::error::{FetchKind, Result, TlviewError};
use crate::layout::{
    build_timeline_date_profile, resolve_slot_min_width, slice_events, ScrollState,
    ScrollSynchronizer, SlotCoords, SlotOptionsKey, TimelineDateProfile,
};
use crate::render::{
    ChronoFormatter, ColSpec, DateFormatter, DomHost, MemoCache, RowPane, Section,
    SpreadsheetPane, StandardTheme, Theme, TimeGridPane,
};
use crate::rows::{
    compute_row_spans, flatten_resources, ExpansionState, ResourceRowStore, RowHandles,
};
use crate::types::{DateProfile, EventRecord, Resource, TimelineOptions};

/// Profiles kept for back-and-forth navigation.
const DATE_PROFILE_CACHE_CAPACITY: usize = 8;

/// Label widths closer than this produce the same layout.
const LABEL_WIDTH_EPSILON: f32 = 0.5;

/// Passed to the resource-render hook each time a row's cells are built.
#[derive(Debug)]
pub struct ResourceRenderInfo<'a> {
    pub resource: &'a Resource,
    pub handles: RowHandles,
    pub view_type: &'a str,
}

type ResourceRenderHook = Box<dyn FnMut(&ResourceRenderInfo<'_>)>;
type FetchErrorHook = Box<dyn FnMut(&TlviewError)>;

/// Summary of one [`TimelineController::run_pass`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub created: usize,
    /// Retained rows whose cells were rewritten in either pane.
    pub updated: usize,
    pub moved: usize,
    pub removed: usize,
    /// Rows reported to the resource-render hook.
    pub rendered: usize,
    pub slot_width: f32,
    pub scroll: ScrollState,
    /// Whether the scroll offsets were reset instead of restored.
    pub scroll_reset: bool,
    /// Whether a slot-width correction pass ran after label measurement.
    pub corrected: bool,
}

impl PassReport {
    fn absorb(&mut self, later: PassReport) {
        self.created += later.created;
        self.updated += later.updated;
        self.moved += later.moved;
        self.removed += later.removed;
        self.rendered += later.rendered;
        self.slot_width = later.slot_width;
        self.scroll = later.scroll;
        self.scroll_reset |= later.scroll_reset;
    }
}

/// The resource timeline view.
pub struct TimelineController {
    options: TimelineOptions,
    date_profile: DateProfile,
    resources: Vec<Resource>,
    events: Vec<EventRecord>,
    expansion: ExpansionState,
    columns: Vec<ColSpec>,
    theme: Rc<dyn Theme>,
    formatter: Rc<dyn DateFormatter>,
    profiles: MemoCache<(DateProfile, SlotOptionsKey), TimelineDateProfile>,
    store: ResourceRowStore,
    fetches: FetchSequencer,
    measured_label_width: Option<f32>,
    last_profile: Option<Rc<TimelineDateProfile>>,
    last_coords: Option<SlotCoords>,
    sections: BTreeMap<Section, String>,
    dirty: bool,
    render_hook: Option<ResourceRenderHook>,
    fetch_error_hook: Option<FetchErrorHook>,
}

impl TimelineController {
    /// Create a controller for `date_profile`.
    ///
    /// Fails when the options cannot produce a slot layout for the range.
    pub fn new(options: TimelineOptions, date_profile: DateProfile) -> Result<Self> {
        options.validate()?;
        let mut profiles = MemoCache::new(DATE_PROFILE_CACHE_CAPACITY);
        let key = SlotOptionsKey::from_options(&options);
        profiles.get_or_try_insert_with(&(date_profile, key.clone()), || {
            build_timeline_date_profile(&date_profile, &key)
        })?;

        Ok(Self {
            columns: ColSpec::from_configs(&options.effective_columns()),
            expansion: ExpansionState::new(options.resources_initially_expanded),
            options,
            date_profile,
            resources: Vec::new(),
            events: Vec::new(),
            theme: Rc::new(StandardTheme),
            formatter: Rc::new(ChronoFormatter),
            profiles,
            store: ResourceRowStore::new(),
            fetches: FetchSequencer::new(),
            measured_label_width: None,
            last_profile: None,
            last_coords: None,
            sections: BTreeMap::new(),
            dirty: true,
            render_hook: None,
            fetch_error_hook: None,
        })
    }

    pub fn options(&self) -> &TimelineOptions {
        &self.options
    }

    pub fn date_profile(&self) -> DateProfile {
        self.date_profile
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn row_store(&self) -> &ResourceRowStore {
        &self.store
    }

    /// Number of slot profiles built so far; stays put on cache hits.
    pub fn profile_builds(&self) -> u64 {
        self.profiles.misses()
    }

    /// The memoized slot profile for the current range and options.
    pub fn timeline_date_profile(&mut self) -> Result<Rc<TimelineDateProfile>> {
        let key = SlotOptionsKey::from_options(&self.options);
        let profile = self.date_profile;
        self.profiles
            .get_or_try_insert_with(&(profile, key.clone()), || {
                build_timeline_date_profile(&profile, &key)
            })
    }

    #[must_use]
    pub fn with_theme(mut self, theme: impl Theme + 'static) -> Self {
        self.theme = Rc::new(theme);
        self.sections.clear();
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: impl DateFormatter + 'static) -> Self {
        self.formatter = Rc::new(formatter);
        self.sections.clear();
        self
    }

    /// Replace the spreadsheet columns, e.g. to attach `text`/`render` hooks.
    pub fn set_columns(&mut self, columns: Vec<ColSpec>) {
        self.columns = columns;
        self.sections.clear();
        self.dirty = true;
    }

    pub fn on_resource_render(&mut self, hook: impl FnMut(&ResourceRenderInfo<'_>) + 'static) {
        self.render_hook = Some(Box::new(hook));
    }

    pub fn on_fetch_error(&mut self, hook: impl FnMut(&TlviewError) + 'static) {
        self.fetch_error_hook = Some(Box::new(hook));
    }

    /// Whether a pass is queued.
    pub fn needs_pass(&self) -> bool {
        self.dirty
    }

    /// Queue a pass without fetching anything.
    pub fn render(&mut self) {
        self.dirty = true;
    }

    /// Replace the options; cached geometry and expansion state are reset.
    pub fn set_options(&mut self, options: TimelineOptions) -> Result<()> {
        options.validate()?;
        let key = SlotOptionsKey::from_options(&options);
        build_timeline_date_profile(&self.date_profile, &key)?;

        if options.resources_initially_expanded != self.options.resources_initially_expanded {
            self.expansion.reset(options.resources_initially_expanded);
        }
        if options.resource_area_columns != self.options.resource_area_columns
            || options.resource_area_header_content != self.options.resource_area_header_content
        {
            self.columns = ColSpec::from_configs(&options.effective_columns());
        }
        self.options = options;
        self.profiles.invalidate();
        self.measured_label_width = None;
        self.sections.clear();
        self.dirty = true;
        Ok(())
    }

    /// Switch to a new range. Resources are kept; events must be refetched.
    pub fn navigate(&mut self, date_profile: DateProfile) -> FetchRequest {
        if date_profile == self.date_profile {
            return FetchRequest::None;
        }
        tracing::debug!(start = %date_profile.active_start, end = %date_profile.active_end, "navigate");
        self.date_profile = date_profile;
        self.dirty = true;
        FetchRequest::Events(self.begin_event_fetch())
    }

    pub fn begin_resource_fetch(&mut self) -> FetchToken {
        self.fetches.begin(FetchKind::Resources, self.date_profile)
    }

    pub fn begin_event_fetch(&mut self) -> FetchToken {
        self.fetches.begin(FetchKind::Events, self.date_profile)
    }

    /// Apply a resource fetch result if it is still the newest.
    pub fn receive_resources(
        &mut self,
        token: FetchToken,
        result: Result<Vec<Resource>>,
    ) -> FetchOutcome {
        if !self.fetches.is_current(&token, &self.date_profile) {
            tracing::debug!(generation = token.generation, "stale resource result dropped");
            return FetchOutcome::Stale;
        }
        match result {
            Ok(resources) => {
                self.fetches.accept(&token, &self.date_profile);
                tracing::debug!(count = resources.len(), "resources applied");
                self.resources = resources;
                self.dirty = true;
                FetchOutcome::Applied
            }
            Err(err) => {
                self.report_fetch_error(FetchKind::Resources, err);
                FetchOutcome::Failed
            }
        }
    }

    /// Apply an event fetch result if it is the newest for the active range.
    pub fn receive_events(
        &mut self,
        token: FetchToken,
        result: Result<Vec<EventRecord>>,
    ) -> FetchOutcome {
        if !self.fetches.is_current(&token, &self.date_profile) {
            tracing::debug!(generation = token.generation, "stale event result dropped");
            return FetchOutcome::Stale;
        }
        match result {
            Ok(events) => {
                self.fetches.accept(&token, &self.date_profile);
                tracing::debug!(count = events.len(), "events applied");
                self.events = events;
                self.dirty = true;
                FetchOutcome::Applied
            }
            Err(err) => {
                self.report_fetch_error(FetchKind::Events, err);
                FetchOutcome::Failed
            }
        }
    }

    fn report_fetch_error(&mut self, kind: FetchKind, err: TlviewError) {
        let err = match err {
            fetch @ TlviewError::Fetch { .. } => fetch,
            other => TlviewError::Fetch {
                kind,
                message: other.to_string(),
            },
        };
        tracing::warn!(error = %err, "fetch failed, keeping previous data");
        if let Some(hook) = self.fetch_error_hook.as_mut() {
            hook(&err);
        }
    }

    /// Fetch resources synchronously from `source`.
    pub fn load_resources(&mut self, source: &mut impl ResourceSource) -> FetchOutcome {
        let token = self.begin_resource_fetch();
        let result = source.fetch_resources(&token.arg());
        self.receive_resources(token, result)
    }

    /// Fetch events for the active range synchronously from `source`.
    pub fn load_events(&mut self, source: &mut impl EventSource) -> FetchOutcome {
        let token = self.begin_event_fetch();
        let result = source.fetch_events(&token.arg());
        self.receive_events(token, result)
    }

    /// Append a top-level resource, or a child when its `parent_id` resolves.
    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
        self.dirty = true;
    }

    /// Remove a resource and all of its descendants. Returns false if unknown.
    pub fn remove_resource(&mut self, id: &str) -> bool {
        let mut doomed: HashSet<String> = HashSet::from([id.to_string()]);
        // Flat children point at their parent; grow the set to a fixed point.
        loop {
            let before = doomed.len();
            collect_flat_descendants(&self.resources, &mut doomed);
            if doomed.len() == before {
                break;
            }
        }
        let removed = prune(&mut self.resources, &doomed);
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Flip a resource's expanded state, returning the new state.
    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        self.dirty = true;
        self.expansion.toggle(id)
    }

    /// Feed a label measurement taken by the host.
    ///
    /// Returns true when it changes the slot width; a pass is then queued.
    /// Has no effect when `slotMinWidth` is set explicitly.
    pub fn report_label_width(&mut self, width: f32) -> bool {
        if self.options.slot_min_width.is_some() || !width.is_finite() {
            return false;
        }
        let per_label = self
            .last_profile
            .as_ref()
            .map_or(1, |tdp| tdp.slots_per_label);
        let current = resolve_slot_min_width(None, self.measured_label_width, per_label);
        let next = resolve_slot_min_width(None, Some(width), per_label);
        self.measured_label_width = Some(width);
        if (current - next).abs() < LABEL_WIDTH_EPSILON {
            return false;
        }
        self.dirty = true;
        true
    }

    /// Resource ids in display order, as last committed.
    pub fn rendered_resource_ids(&self) -> Vec<String> {
        self.store.resource_ids()
    }

    /// Run a pass if one is queued.
    pub fn flush<H: DomHost>(&mut self, host: &mut H) -> Result<Option<PassReport>> {
        if !self.dirty {
            return Ok(None);
        }
        self.run_pass(host).map(Some)
    }

    /// Re-equalize row heights after late content (images, fonts) loaded.
    pub fn resync_heights<H: DomHost>(&mut self, host: &mut H) -> Result<()> {
        ScrollSynchronizer::sync_row_heights(host, self.store.rows_mut())
    }

    /// Render the current state into `host`.
    ///
    /// After the commit the host's label width is measured; if it changes
    /// the slot width a single correction pass follows. A scroll reset from
    /// the first pass is redone against the corrected slot width.
    pub fn run_pass<H: DomHost>(&mut self, host: &mut H) -> Result<PassReport> {
        let mut report = self.pass_once(host, false)?;
        if self.options.slot_min_width.is_none() {
            if let Some(width) = host.measure_max_label_width() {
                if self.report_label_width(width) {
                    let correction = self.pass_once(host, report.scroll_reset)?;
                    report.absorb(correction);
                    report.corrected = true;
                }
            }
        }
        self.dirty = false;
        Ok(report)
    }

    fn pass_once<H: DomHost>(&mut self, host: &mut H, force_reset: bool) -> Result<PassReport> {
        let tdp = self.timeline_date_profile()?;
        let captured = ScrollSynchronizer::capture_scroll(&*host);
        let structure_changed = force_reset
            || self
                .last_profile
                .as_ref()
                .map_or(true, |prev| !prev.same_structure(&tdp));

        let min_width = resolve_slot_min_width(
            self.options.slot_min_width,
            self.measured_label_width,
            tdp.slots_per_label,
        );
        let coords = SlotCoords::new(&tdp, min_width, host.available_grid_width());
        let scroll_time_left = self.scroll_time_offset(&tdp, &coords);
        let slot_width = coords.slot_width();
        let grid_width = coords.total_width();

        let spreadsheet = SpreadsheetPane::new(
            self.columns.clone(),
            Rc::clone(&self.theme),
            self.options.row_min_height,
        );
        let time_grid = TimeGridPane::new(
            Rc::clone(&tdp),
            coords,
            Rc::clone(&self.formatter),
            Rc::clone(&self.theme),
            self.options.event_level_height,
            self.options.row_min_height,
        );

        self.write_section(host, Section::SpreadsheetHeader, spreadsheet.header_html())?;
        self.write_section(host, Section::TimeHeader, time_grid.header_html())?;
        self.write_section(host, Section::TimeSlats, time_grid.slats_html())?;
        host.set_grid_width(grid_width)?;

        let mut flat = flatten_resources(&self.resources, &self.expansion);
        compute_row_spans(&mut flat, &spreadsheet.group_fields());
        let segments = slice_events(&self.events, &tdp);

        let commit = self
            .store
            .commit(host, &flat, &segments, &spreadsheet, &time_grid)?;
        ScrollSynchronizer::sync_row_heights(host, self.store.rows_mut())?;

        // Horizontal scroll follows time, not pixels, across slot width changes.
        let target = match self.last_coords.as_ref() {
            Some(prev) if !structure_changed => ScrollState::new(
                captured.scroll_top,
                prev.translate_x(captured.scroll_left, time_grid.coords()),
            ),
            _ => ScrollState::new(captured.scroll_top, scroll_time_left),
        };
        let scroll = ScrollSynchronizer::restore_scroll(host, target);

        let mut rendered = 0;
        if let Some(hook) = self.render_hook.as_mut() {
            let by_id: HashMap<&str, &Resource> = flat
                .iter()
                .map(|f| (f.resource.id.as_str(), f.resource))
                .collect();
            for id in commit.rendered_ids() {
                let (Some(&resource), Some(row)) = (by_id.get(id), self.store.get(id)) else {
                    continue;
                };
                hook(&ResourceRenderInfo {
                    resource,
                    handles: row.handles,
                    view_type: &self.options.view_type,
                });
                rendered += 1;
            }
        } else {
            rendered = commit.rendered_ids().count();
        }

        tracing::debug!(
            created = commit.created.len(),
            updated = commit.spreadsheet_updated.len() + commit.time_grid_updated,
            moved = commit.moved,
            removed = commit.removed.len(),
            slot_width,
            scroll_reset = structure_changed,
            "timeline pass committed"
        );

        self.last_profile = Some(tdp);
        self.last_coords = Some(time_grid.coords().clone());
        Ok(PassReport {
            created: commit.created.len(),
            updated: commit.spreadsheet_updated.len() + commit.time_grid_updated,
            moved: commit.moved,
            removed: commit.removed.len(),
            rendered,
            slot_width,
            scroll,
            scroll_reset: structure_changed,
            corrected: false,
        })
    }

    /// Horizontal offset of `scrollTime` on the first day of the range.
    fn scroll_time_offset(&self, tdp: &TimelineDateProfile, coords: &SlotCoords) -> f32 {
        if !tdp.is_time_scale {
            return 0.0;
        }
        let Some(first) = tdp.range_start() else {
            return 0.0;
        };
        let midnight = first.date().and_time(chrono::NaiveTime::MIN);
        coords.date_to_px(midnight + self.options.scroll_time.to_chrono())
    }

    fn write_section<H: DomHost>(&mut self, host: &mut H, section: Section, html: String) -> Result<()> {
        if self.sections.get(&section) == Some(&html) {
            return Ok(());
        }
        host.set_section(section, &html)?;
        self.sections.insert(section, html);
        Ok(())
    }
}

fn collect_flat_descendants(resources: &[Resource], doomed: &mut HashSet<String>) {
    for resource in resources {
        let parent_doomed = resource
            .parent_id
            .as_ref()
            .is_some_and(|p| doomed.contains(p));
        if parent_doomed {
            doomed.insert(resource.id.clone());
        }
        collect_flat_descendants(&resource.children, doomed);
    }
}

/// Drop every resource in `doomed` (nested children go with their parent).
fn prune(resources: &mut Vec<Resource>, doomed: &HashSet<String>) -> bool {
    let before = resources.len();
    resources.retain(|r| !doomed.contains(&r.id));
    let mut removed = resources.len() != before;
    for resource in resources.iter_mut() {
        removed |= prune(&mut resource.children, doomed);
    }
    removed
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::render::{MemoryDom, PaneKind};
    use chrono::NaiveDate;

    fn aug(d: u32) -> DateProfile {
        DateProfile::day(NaiveDate::from_ymd_opt(2015, 8, d).unwrap())
    }

    fn controller() -> TimelineController {
        TimelineController::new(TimelineOptions::default(), aug(7)).unwrap()
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = TimelineOptions {
            slot_duration: crate::types::DurationSpec::from_seconds(0),
            ..TimelineOptions::default()
        };
        assert!(matches!(
            TimelineController::new(options, aug(7)),
            Err(TlviewError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_profile_is_memoized_across_navigation() {
        let mut c = controller();
        let first = c.timeline_date_profile().unwrap();
        c.navigate(aug(8));
        c.timeline_date_profile().unwrap();
        c.navigate(aug(7));
        let again = c.timeline_date_profile().unwrap();
        assert!(Rc::ptr_eq(&first, &again));
        assert_eq!(c.profile_builds(), 2);
    }

    #[test]
    fn test_navigate_requests_events_only() {
        let mut c = controller();
        assert_eq!(c.navigate(aug(7)), FetchRequest::None);
        let FetchRequest::Events(token) = c.navigate(aug(8)) else {
            panic!("expected an event fetch");
        };
        assert_eq!(token.kind, FetchKind::Events);
        assert_eq!(token.range, aug(8));
    }

    #[test]
    fn test_failed_fetch_keeps_data() {
        let mut c = controller();
        c.add_resource(Resource::new("a", "A"));
        let errors = Rc::new(std::cell::Cell::new(0));
        let seen = Rc::clone(&errors);
        c.on_fetch_error(move |_| seen.set(seen.get() + 1));

        let token = c.begin_resource_fetch();
        let outcome = c.receive_resources(token, Err(TlviewError::Other("offline".into())));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(errors.get(), 1);
        assert_eq!(c.resources().len(), 1);
    }

    #[test]
    fn test_remove_resource_takes_descendants() {
        let mut c = controller();
        c.add_resource(Resource::new("a", "A").with_child(Resource::new("a1", "A1")));
        c.add_resource(Resource::new("a2", "A2").with_parent("a"));
        c.add_resource(Resource::new("a21", "A21").with_parent("a2"));
        c.add_resource(Resource::new("b", "B"));
        assert!(c.remove_resource("a"));
        let ids: Vec<&str> = c.resources().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert!(!c.remove_resource("zzz"));
    }

    #[test]
    fn test_label_width_correction_is_bounded() {
        let options = TimelineOptions {
            slot_label_format: Some("%A %-I:%M%P".into()),
            ..TimelineOptions::default()
        };
        let mut c = TimelineController::new(options, aug(7)).unwrap();
        c.add_resource(Resource::new("a", "A"));
        let mut dom = MemoryDom::new(100.0, 400.0);

        // "Friday 12:00am": 14 chars at 7px plus 8px padding, spread over 2 slots.
        let report = c.run_pass(&mut dom).unwrap();
        assert!(report.corrected);
        assert_eq!(report.slot_width, 53.0);
        assert!(!c.needs_pass());

        // 06:00 is still the left edge once the slots widen.
        assert!(report.scroll_reset);
        assert_eq!(report.scroll.scroll_left, 12.0 * 53.0);
        assert_eq!(dom.scroll_state(PaneKind::TimeGrid).scroll_left, 636.0);

        // The same measurement again changes nothing.
        assert!(!c.report_label_width(106.0));
        assert!(c.flush(&mut dom).unwrap().is_none());
    }

    #[test]
    fn test_short_labels_keep_fallback_width() {
        let mut c = controller();
        let mut dom = MemoryDom::new(100.0, 400.0);
        let report = c.run_pass(&mut dom).unwrap();
        assert!(!report.corrected);
        assert_eq!(report.slot_width, 30.0);
    }

    #[test]
    fn test_explicit_slot_width_ignores_measurement() {
        let options = TimelineOptions {
            slot_min_width: Some(50.0),
            ..TimelineOptions::default()
        };
        let mut c = TimelineController::new(options, aug(7)).unwrap();
        assert!(!c.report_label_width(500.0));
    }

    #[test]
    fn test_first_pass_scrolls_to_scroll_time() {
        let mut c = controller();
        let mut dom = MemoryDom::new(200.0, 400.0);
        let report = c.run_pass(&mut dom).unwrap();
        // 06:00 is slot 12 of 30px slots.
        assert_eq!(report.scroll.scroll_left, 360.0);
        assert!(report.scroll_reset);
        assert_eq!(dom.scroll_state(PaneKind::Spreadsheet).scroll_left, 0.0);
    }
}
