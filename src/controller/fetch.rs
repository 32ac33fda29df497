//! Fetch sequencing.
//!
//! Every fetch is stamped with a generation number when it starts. Results
//! can arrive in any order; a result is applied only if no newer fetch of the
//! same kind has been applied already, and event results additionally only
//! while their range is still the active one. Anything else is dropped.

use serde::Serialize;

use crate::error::{FetchKind, Result};
use crate::types::{DateMarker, DateProfile, EventRecord, Resource};

/// Range handed to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchArg {
    pub start: DateMarker,
    pub end: DateMarker,
}

impl From<&DateProfile> for FetchArg {
    fn from(profile: &DateProfile) -> Self {
        Self {
            start: profile.active_start,
            end: profile.active_end,
        }
    }
}

/// Ticket for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchToken {
    pub kind: FetchKind,
    pub generation: u64,
    pub range: DateProfile,
}

impl FetchToken {
    pub fn arg(&self) -> FetchArg {
        FetchArg::from(&self.range)
    }
}

/// Fetches a caller must start after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRequest {
    None,
    Events(FetchToken),
}

/// How a fetch result was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The data replaced the previous data and a pass was queued.
    Applied,
    /// A newer result or a range change superseded this one.
    Stale,
    /// The source failed; previous data keeps rendering.
    Failed,
}

/// Issues tokens and decides which results may still be applied.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    next_generation: u64,
    applied_resources: u64,
    applied_events: u64,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, kind: FetchKind, range: DateProfile) -> FetchToken {
        self.next_generation += 1;
        FetchToken {
            kind,
            generation: self.next_generation,
            range,
        }
    }

    /// Whether a result for `token` is still current.
    pub fn is_current(&self, token: &FetchToken, active: &DateProfile) -> bool {
        match token.kind {
            FetchKind::Resources => token.generation > self.applied_resources,
            FetchKind::Events => token.generation > self.applied_events && token.range == *active,
        }
    }

    /// Check `token` and, when current, record it as the newest applied.
    pub fn accept(&mut self, token: &FetchToken, active: &DateProfile) -> bool {
        if !self.is_current(token, active) {
            return false;
        }
        match token.kind {
            FetchKind::Resources => self.applied_resources = token.generation,
            FetchKind::Events => self.applied_events = token.generation,
        }
        true
    }
}

/// Supplies the resource list. Invoked on initial load and explicit refetch.
pub trait ResourceSource {
    fn fetch_resources(&mut self, arg: &FetchArg) -> Result<Vec<Resource>>;
}

/// Supplies events for a range.
pub trait EventSource {
    fn fetch_events(&mut self, arg: &FetchArg) -> Result<Vec<EventRecord>>;
}

impl<F> ResourceSource for F
where
    F: FnMut(&FetchArg) -> Result<Vec<Resource>>,
{
    fn fetch_resources(&mut self, arg: &FetchArg) -> Result<Vec<Resource>> {
        self(arg)
    }
}

impl<F> EventSource for F
where
    F: FnMut(&FetchArg) -> Result<Vec<EventRecord>>,
{
    fn fetch_events(&mut self, arg: &FetchArg) -> Result<Vec<EventRecord>> {
        self(arg)
    }
}

/// A fixed in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticSource<T> {
    pub items: Vec<T>,
    /// Number of fetches served so far.
    pub calls: usize,
}

impl<T> StaticSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, calls: 0 }
    }
}

impl ResourceSource for StaticSource<Resource> {
    fn fetch_resources(&mut self, _arg: &FetchArg) -> Result<Vec<Resource>> {
        self.calls += 1;
        Ok(self.items.clone())
    }
}

impl EventSource for StaticSource<EventRecord> {
    fn fetch_events(&mut self, arg: &FetchArg) -> Result<Vec<EventRecord>> {
        self.calls += 1;
        Ok(self
            .items
            .iter()
            .filter(|e| e.start < arg.end && e.effective_end() > arg.start)
            .cloned()
            .collect())
    }
}
