//! Recognition error types

use std::path::{Path, PathBuf};

use contracts::ContractError;
use thiserror::Error;

/// Recognition adapter errors
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The engine process could not be started
    #[error("cannot launch '{binary}': {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran but reported failure
    #[error("engine failed on '{}' ({status}): {stderr}", path.display())]
    EngineFailed {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    /// The engine produced nothing usable
    #[error("no text recognized in '{}'", path.display())]
    Empty { path: PathBuf },

    /// No pre-recognized text next to the capture
    #[error("no sidecar text for '{}'", path.display())]
    MissingSidecar { path: PathBuf },

    /// Injected failure (mock engine)
    #[error("recognition rejected '{}': {message}", path.display())]
    Rejected { path: PathBuf, message: String },

    #[error("io error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecognitionError {
    pub fn empty(path: &Path) -> Self {
        Self::Empty {
            path: path.to_path_buf(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Capture the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Launch { .. } => None,
            Self::EngineFailed { path, .. }
            | Self::Empty { path }
            | Self::MissingSidecar { path }
            | Self::Rejected { path, .. }
            | Self::Io { path, .. } => Some(path),
        }
    }

    /// Convert into the contract error for the capture at `image`
    pub fn into_contract(self, image: &Path) -> ContractError {
        let path = self.path().unwrap_or(image).to_path_buf();
        ContractError::recognition(&path, self.to_string())
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, RecognitionError>;
