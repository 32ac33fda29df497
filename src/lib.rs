//! tlview - resource timeline view for the web
//!
//! Lays out time slots along one axis and resources (rooms, staff, equipment)
//! along the other, with a frozen resource list beside a scrollable time grid:
//! - Incremental re-rendering that keeps row elements across refetches
//! - Row heights and vertical scroll kept in lockstep between both panes
//! - Slot geometry with date-to-pixel mapping for event placement
//! - Out-of-order fetch results discarded by generation
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { TlView } from 'tlview';
//! await init();
//! const view = new TlView(container, { slotDuration: '00:30' }, '2015-08-07', '2015-08-08');
//! view.setResourceSource(async ({ start, end }) => fetchResources());
//! view.setEventSource(async ({ start, end }) => fetchEvents(start, end));
//! view.next();
//! ```
//!
//! # Usage (Rust)
//!
//! ```
//! use tlview::{DateProfile, MemoryDom, Resource, StaticSource, TimelineController, TimelineOptions};
//!
//! let day = chrono::NaiveDate::from_ymd_opt(2015, 8, 7).unwrap();
//! let mut view = TimelineController::new(TimelineOptions::default(), DateProfile::day(day)).unwrap();
//! view.load_resources(&mut StaticSource::new(vec![Resource::new("a", "Auditorium A")]));
//! let mut dom = MemoryDom::default();
//! view.run_pass(&mut dom).unwrap();
//! assert_eq!(view.rendered_resource_ids(), vec!["a"]);
//! ```

// Data model
pub mod error;
pub mod types;

// Geometry, rows and rendering
pub mod controller;
pub mod document;
pub mod layout;
pub mod render;
pub mod rows;
pub mod viewer;

use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub use viewer::TlView;

pub use controller::{
    EventSource, FetchArg, FetchOutcome, FetchRequest, FetchToken, PassReport,
    ResourceRenderInfo, ResourceSource, StaticSource, TimelineController,
};
pub use document::{render_document, render_document_html, TimelineDocument, Viewport};
pub use error::{FetchKind, Result, TlviewError};
pub use layout::{ScrollState, ScrollSynchronizer, SlotCoords, TimelineDateProfile};
pub use render::{DomHost, MemoryDom, NodeId, PaneKind, Section};
pub use rows::{ResourceRow, ResourceRowStore};
pub use types::*;

/// Render a JSON scene (`options`, `dateProfile`, `resources`, `events`) to
/// static HTML.
///
/// # Errors
/// Returns an error if the JSON is malformed or the options are invalid.
#[wasm_bindgen(js_name = renderDocumentHtml)]
pub fn render_document_html_js(json: &str) -> std::result::Result<String, JsValue> {
    let doc = TimelineDocument::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    render_document_html(&doc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
