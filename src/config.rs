//! Store configuration.

use serde::{Deserialize, Serialize};

/// Settings for a [`Store`](crate::Store).
///
/// Every field has a default, so a partial section of an application config
/// file deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Label attached to log events emitted for this store.
    pub label: String,

    /// Emit a `debug` event for every committed slice transition.
    pub log_transitions: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "default".to_string(),
            log_transitions: cfg!(debug_assertions),
        }
    }
}

impl StoreConfig {
    /// Config with the given label and default settings otherwise.
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}
