//! Layered error definitions
//!
//! Categorized by source: config / recognition / analysis / store / archive

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Recognition Errors =====
    /// The text-extraction step could not produce usable text
    #[error("recognition failed for '{}': {message}", path.display())]
    Recognition { path: PathBuf, message: String },

    // ===== Analysis Errors =====
    /// A capture analyzer could not interpret its input
    #[error("analysis failed for '{}': {message}", path.display())]
    Analysis { path: PathBuf, message: String },

    // ===== Store Errors =====
    /// Reading existing rows from the record store failed
    #[error("store '{store}' read error: {message}")]
    StoreRead { store: String, message: String },

    /// Appending rows to the record store failed
    #[error("store '{store}' write error: {message}")]
    StoreWrite { store: String, message: String },

    // ===== Archive Errors =====
    /// Moving a file into the processed tree failed
    #[error("archive error for '{}': {message}", path.display())]
    Archive { path: PathBuf, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create recognition error
    pub fn recognition(path: &Path, message: impl Into<String>) -> Self {
        Self::Recognition {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create analysis error
    pub fn analysis(path: &Path, message: impl Into<String>) -> Self {
        Self::Analysis {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create store read error
    pub fn store_read(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreRead {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create store write error
    pub fn store_write(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create archive error
    pub fn archive(path: &Path, message: impl Into<String>) -> Self {
        Self::Archive {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}
