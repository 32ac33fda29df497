//! Whole-scene rendering without a browser.
//!
//! A [`TimelineDocument`] bundles options, range and data. Rendering it runs
//! one full pass against [`MemoryDom`] and serializes the result.

use serde::{Deserialize, Serialize};

use crate::controller::{FetchOutcome, StaticSource, TimelineController};
use crate::error::{Result, TlviewError};
use crate::render::MemoryDom;
use crate::types::{DateProfile, EventRecord, Resource, TimelineOptions};

/// Viewport used when a document does not specify one.
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1200.0,
    height: 800.0,
};

/// Size of the time-grid viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// A complete timeline scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDocument {
    #[serde(default)]
    pub options: TimelineOptions,
    pub date_profile: DateProfile,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

impl TimelineDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(json)?;
        doc.options.validate()?;
        Ok(doc)
    }
}

/// Render `doc` into an in-memory DOM.
pub fn render_document(doc: &TimelineDocument) -> Result<MemoryDom> {
    let mut controller = TimelineController::new(doc.options.clone(), doc.date_profile)?;
    let mut resources = StaticSource::new(doc.resources.clone());
    let mut events = StaticSource::new(doc.events.clone());
    for outcome in [
        controller.load_resources(&mut resources),
        controller.load_events(&mut events),
    ] {
        if outcome != FetchOutcome::Applied {
            return Err(TlviewError::Other(format!(
                "in-memory source not applied: {outcome:?}"
            )));
        }
    }

    let viewport = doc.viewport.unwrap_or(DEFAULT_VIEWPORT);
    let mut dom = MemoryDom::new(viewport.width, viewport.height);
    controller.run_pass(&mut dom)?;
    Ok(dom)
}

/// Render `doc` to a standalone HTML fragment.
pub fn render_document_html(doc: &TimelineDocument) -> Result<String> {
    render_document(doc).map(|dom| dom.to_html())
}
