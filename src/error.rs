//! Structured error types for tlview.
//!
//! Every fallible operation in the crate returns [`Result`]; the wasm layer
//! converts errors into `JsValue` strings at the boundary.

/// Which external data feed a fetch error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Resources,
    Events,
}

impl std::fmt::Display for FetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resources => f.write_str("resources"),
            Self::Events => f.write_str("events"),
        }
    }
}

/// All errors that can occur while building or committing a timeline pass.
#[derive(Debug, thiserror::Error)]
pub enum TlviewError {
    /// An option value that cannot produce a usable layout.
    #[error("Invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    /// Slot geometry could not be derived from the date profile.
    #[error("Slot geometry: {0}")]
    Geometry(String),

    /// The DOM host rejected a mutation or lookup.
    #[error("DOM: {0}")]
    Dom(String),

    /// A resource or event source rejected a fetch.
    #[error("Fetching {kind} failed: {message}")]
    Fetch { kind: FetchKind, message: String },

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for string errors from host callbacks.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TlviewError>;

impl TlviewError {
    pub(crate) fn invalid_option(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name,
            reason: reason.into(),
        }
    }
}

impl From<String> for TlviewError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for TlviewError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<TlviewError> for wasm_bindgen::JsValue {
    fn from(e: TlviewError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
