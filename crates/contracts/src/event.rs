//! Filesystem events delivered to the orchestrator.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind of filesystem change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsEventKind {
    Created,
    Modified,
    Moved,
}

impl FsEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Moved => "moved",
        }
    }
}

/// A change under a watched hot folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
    pub is_dir: bool,
}

impl FsEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Created,
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Modified,
            path: path.into(),
            is_dir: false,
        }
    }
}
