//! RecognizerBackend - configured engine selection

use std::path::Path;

use contracts::{ContractError, RecognitionConfig, RecognitionEngine, RecognitionHint, TextRecognizer};
use tracing::info;

use crate::mock::MockRecognizer;
use crate::sidecar::SidecarRecognizer;
use crate::tesseract::TesseractRecognizer;

/// Engine chosen at startup
#[derive(Debug)]
pub enum RecognizerBackend {
    Tesseract(TesseractRecognizer),
    Sidecar(SidecarRecognizer),
    Mock(MockRecognizer),
}

impl RecognizerBackend {
    /// Build the engine named by the `[recognition]` section
    pub fn from_config(config: &RecognitionConfig) -> Self {
        let backend = match config.engine {
            RecognitionEngine::Tesseract => Self::Tesseract(TesseractRecognizer::new(&config.binary)),
            RecognitionEngine::Sidecar => Self::Sidecar(SidecarRecognizer::new()),
        };
        info!(engine = backend.name(), "text recognizer configured");
        backend
    }
}

impl From<MockRecognizer> for RecognizerBackend {
    fn from(mock: MockRecognizer) -> Self {
        Self::Mock(mock)
    }
}

impl TextRecognizer for RecognizerBackend {
    fn name(&self) -> &str {
        match self {
            Self::Tesseract(r) => r.name(),
            Self::Sidecar(r) => r.name(),
            Self::Mock(r) => r.name(),
        }
    }

    async fn recognize(&self, image: &Path, hint: &RecognitionHint) -> Result<String, ContractError> {
        match self {
            Self::Tesseract(r) => r.recognize(image, hint).await,
            Self::Sidecar(r) => r.recognize(image, hint).await,
            Self::Mock(r) => r.recognize(image, hint).await,
        }
    }
}
