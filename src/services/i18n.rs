//! User-facing message lookup.
//!
//! The gate only needs one key (`invalidCredentials`), but messages are resolved through
//! [`Localizer`] so deployments can ship their own wording without touching the gate.

use std::{collections::HashMap, fs, path::Path};

use thiserror::Error;

pub const INVALID_CREDENTIALS: &str = "invalidCredentials";

pub trait Localizer: Send + Sync {
    /// Resolve `key` to a message. Unknown keys must resolve to something (usually the key).
    fn translate(&self, key: &str) -> String;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read locale file: {0}")]
    Io(#[from] std::io::Error),
    #[error("locale file must be a flat JSON object of strings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Flat `{ "key": "message" }` catalog. Missing keys fall back to the key itself.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn new(messages: HashMap<String, String>) -> Self {
        Self { messages }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let messages: HashMap<String, String> = serde_json::from_str(raw)?;
        Ok(Self::new(messages))
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Localizer for MessageCatalog {
    fn translate(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
