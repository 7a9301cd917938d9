//! Acknowledgement gating on companion documents
//!
//! An acknowledgement is enabled only after its companion document has been
//! opened at least once. Opening is enough; nothing tracks whether the
//! document was read to the end.

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Map of gate key to "has been opened"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentGate {
    opened: BTreeMap<String, bool>,
}

impl DocumentGate {
    /// A gate with no documents opened
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore gate state persisted by a prior session. Anything that is not an
    /// object of booleans is ignored.
    pub fn restore(value: Option<&serde_json::Value>) -> Self {
        let opened = value
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
                    .collect()
            })
            .unwrap_or_default();
        Self { opened }
    }

    /// Record that the document was opened
    pub fn open(&mut self, key: &str) {
        self.opened.insert(key.to_string(), true);
    }

    /// Whether the document has been opened
    pub fn is_open(&self, key: &str) -> bool {
        self.opened.get(key).copied().unwrap_or(false)
    }

    /// Whether the acknowledgement control is enabled
    pub fn can_acknowledge(&self, key: &str) -> bool {
        self.is_open(key)
    }

    /// Guard an acknowledgement
    pub fn require_open(&self, key: &str) -> Result<(), CoreError> {
        if self.is_open(key) {
            Ok(())
        } else {
            Err(CoreError::ValidationError(format!(
                "Open the {} document before acknowledging",
                key.replace('_', " ")
            )))
        }
    }
}
