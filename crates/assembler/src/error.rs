//! Assembler error types

use std::path::PathBuf;

use thiserror::Error;

/// Assembler-specific errors
#[derive(Debug, Error)]
pub enum AssemblerError {
    /// Hot folder listing failed
    #[error("cannot list '{}': {source}", dir.display())]
    Scan {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssemblerError {
    pub fn scan(dir: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Scan {
            dir: dir.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
