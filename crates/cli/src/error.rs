//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Device id not present in the configuration
    #[error("Unknown device '{device}' (configured: {known})")]
    UnknownDevice { device: String, known: String },

    /// A sensor export set is missing members
    #[error("No complete capture set contains {}", path.display())]
    IncompleteCaptureSet { path: PathBuf },

    /// Pipeline execution error
    #[error("Pipeline execution failed: {message}")]
    PipelineExecution { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn unknown_device<'a>(device: impl Into<String>, known: impl IntoIterator<Item = &'a str>) -> Self {
        Self::UnknownDevice {
            device: device.into(),
            known: known.into_iter().collect::<Vec<_>>().join(", "),
        }
    }

    pub fn pipeline_execution(message: impl Into<String>) -> Self {
        Self::PipelineExecution {
            message: message.into(),
        }
    }
}
