//! LabelDictionary - canonical metric names and their aliases.
//!
//! Loaded once from a JSON object `{ "Peso (kg)": ["peso", "weight"], ... }`
//! and read-only afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ExtractionError, Result};

/// Canonical name -> aliases, with a fixed iteration order.
#[derive(Debug, Clone, Default)]
pub struct LabelDictionary {
    entries: BTreeMap<String, Vec<String>>,
    order: Vec<String>,
}

impl LabelDictionary {
    /// Dictionary with no entries; every label falls back to its cleaned text.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from in-memory entries
    pub fn from_entries<I, K, V, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let entries: BTreeMap<String, Vec<String>> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into_iter().map(Into::into).collect()))
            .collect();
        let order = entries.keys().cloned().collect();
        Self { entries, order }
    }

    /// Parse a JSON dictionary document
    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        let entries: BTreeMap<String, Vec<String>> = serde_json::from_str(content)?;
        Ok(Self::from_entries(entries))
    }

    /// Load a dictionary file.
    ///
    /// # Errors
    /// `ExtractionError::Dictionary` when the file is missing, unreadable or
    /// not a JSON object of string arrays.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ExtractionError::dictionary(path, e.to_string()))?;
        let dictionary = Self::from_json_str(&content)
            .map_err(|e| ExtractionError::dictionary(path, e.to_string()))?;
        debug!(path = %path.display(), entries = dictionary.len(), "dictionary loaded");
        Ok(dictionary)
    }

    /// Load a dictionary file, degrading to an empty dictionary on failure.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(dictionary) => dictionary,
            Err(e) => {
                warn!(error = %e, "continuing with an empty label dictionary");
                Self::empty()
            }
        }
    }

    /// Put `priority` names first (in the given order); the rest stay lexical.
    /// Names absent from the dictionary are ignored.
    pub fn with_priority(mut self, priority: &[String]) -> Self {
        let mut order: Vec<String> = Vec::with_capacity(self.entries.len());
        for name in priority {
            if self.entries.contains_key(name) && !order.contains(name) {
                order.push(name.clone());
            }
        }
        for name in self.entries.keys() {
            if !order.contains(name) {
                order.push(name.clone());
            }
        }
        self.order = order;
        self
    }

    /// Entries in priority order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order.iter().filter_map(|name| {
            self.entries
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v.as_slice()))
        })
    }

    pub fn aliases(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
