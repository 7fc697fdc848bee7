//! Extraction error types

use std::path::{Path, PathBuf};

use contracts::ContractError;
use thiserror::Error;

/// Extraction-specific errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Label dictionary could not be loaded
    #[error("dictionary '{}' unavailable: {message}", path.display())]
    Dictionary { path: PathBuf, message: String },

    /// A capture file could not be interpreted
    #[error("cannot analyze '{}': {message}", path.display())]
    Analysis { path: PathBuf, message: String },

    /// A fixed-format label could not be compiled into a pattern
    #[error("invalid pattern for label '{label}': {message}")]
    Pattern { label: String, message: String },

    /// Analyzer was handed input it does not consume
    #[error("analyzer '{analyzer}' does not accept {input}")]
    UnsupportedInput {
        analyzer: &'static str,
        input: &'static str,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub fn dictionary(path: &Path, message: impl Into<String>) -> Self {
        Self::Dictionary {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn analysis(path: &Path, message: impl Into<String>) -> Self {
        Self::Analysis {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl From<ExtractionError> for ContractError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Analysis { path, message } => ContractError::Analysis { path, message },
            ExtractionError::Io(e) => ContractError::Io(e),
            other => ContractError::Other(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
