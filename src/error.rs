//! Error types for slicestore.

use thiserror::Error;

/// Errors surfaced by store construction, registration and typed access.
///
/// State writes themselves never fail: malformed updates degrade to a full
/// replacement of the slice and overlapping async transitions simply race.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Fatal setup error raised while building a slice factory.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A slice is already registered under '{name}'")]
    DuplicateSlice { name: String },

    #[error("No method '{method}' registered for slice '{slice}'")]
    UnknownMethod { slice: String, method: String },

    #[error("Failed to convert state of slice '{slice}': {source}")]
    Codec {
        slice: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
