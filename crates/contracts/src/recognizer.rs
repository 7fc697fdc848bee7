//! TextRecognizer trait - image to plain text
//!
//! Recognition engines are external collaborators. Preprocessing filters, if
//! any, live inside the implementation; callers only see recognized text.

use std::future::Future;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Language / layout hints forwarded to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionHint {
    /// Engine language spec, e.g. `spa+eng`
    pub language: String,

    /// Page segmentation mode
    pub page_segmentation: u8,
}

impl Default for RecognitionHint {
    fn default() -> Self {
        Self {
            language: "spa+eng".to_string(),
            page_segmentation: 3,
        }
    }
}

/// Produces plain text from a capture artifact.
pub trait TextRecognizer: Send + Sync {
    /// Engine name (used for logging)
    fn name(&self) -> &str;

    /// Recognize the text in `image`
    ///
    /// # Errors
    /// `ContractError::Recognition` when the engine is unavailable or yields
    /// no usable text. The failure is scoped to this one capture.
    fn recognize(
        &self,
        image: &Path,
        hint: &RecognitionHint,
    ) -> impl Future<Output = Result<String, ContractError>> + Send;
}
