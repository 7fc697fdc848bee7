//! Watcher error types

use std::path::PathBuf;

use thiserror::Error;

/// Watcher errors
#[derive(Debug, Error)]
pub enum WatcherError {
    /// Walking the watched tree failed
    #[error("cannot scan '{}': {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `start` called on a running watcher
    #[error("watcher on '{}' is already running", root.display())]
    AlreadyRunning { root: PathBuf },
}

/// Watcher Result type alias
pub type Result<T> = std::result::Result<T, WatcherError>;
