//! Publisher error types

use std::path::{Path, PathBuf};

use contracts::ContractError;
use thiserror::Error;

/// Publisher-specific errors
#[derive(Debug, Error)]
pub enum PublisherError {
    /// Store backend could not be created
    #[error("failed to create store '{name}': {message}")]
    StoreCreation { name: String, message: String },

    /// A stored line is not a 4-column record
    #[error("store '{store}' line {line}: {message}")]
    CorruptRecord {
        store: String,
        line: usize,
        message: String,
    },

    /// The file is not under the incoming root
    #[error("'{}' is outside the incoming root '{}'", path.display(), root.display())]
    OutsideIncoming { path: PathBuf, root: PathBuf },

    /// Moving a file into the processed tree failed
    #[error("cannot archive '{}' to '{}': {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store or contract level error
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublisherError {
    pub fn store_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn outside_incoming(path: &Path, root: &Path) -> Self {
        Self::OutsideIncoming {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        }
    }
}

impl From<PublisherError> for ContractError {
    fn from(err: PublisherError) -> Self {
        match err {
            PublisherError::Contract(inner) => inner,
            PublisherError::OutsideIncoming { ref path, .. } => ContractError::archive(path, err.to_string()),
            PublisherError::Move { ref from, .. } => ContractError::archive(from, err.to_string()),
            PublisherError::CorruptRecord { ref store, .. } => {
                ContractError::store_read(store.clone(), err.to_string())
            }
            PublisherError::Io(io) => ContractError::Io(io),
            other => ContractError::Other(other.to_string()),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, PublisherError>;
