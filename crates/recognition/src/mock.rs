//! Mock recognizer
//!
//! Canned text per file name, with injectable failures.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use contracts::{ContractError, RecognitionHint, TextRecognizer};

use crate::error::RecognitionError;

/// Mock recognizer configuration
#[derive(Debug, Default, Clone)]
pub struct MockRecognizerConfig {
    /// File name -> recognized text
    pub texts: HashMap<String, String>,
    /// File names that fail recognition
    pub fail: Vec<String>,
    /// Text for file names not listed in `texts`; `None` fails them
    pub fallback: Option<String>,
}

#[derive(Debug, Default)]
pub struct MockRecognizer {
    config: MockRecognizerConfig,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::with_config(MockRecognizerConfig::default())
    }

    pub fn with_config(config: MockRecognizerConfig) -> Self {
        Self {
            config,
            calls: AtomicUsize::new(0),
        }
    }

    /// Register canned text for a file name
    pub fn with_text(mut self, file_name: impl Into<String>, text: impl Into<String>) -> Self {
        self.config.texts.insert(file_name.into(), text.into());
        self
    }

    /// Make recognition of `file_name` fail
    pub fn failing(mut self, file_name: impl Into<String>) -> Self {
        self.config.fail.push(file_name.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, image: &Path) -> Result<String, RecognitionError> {
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.config.fail.contains(&name) {
            return Err(RecognitionError::Rejected {
                path: image.to_path_buf(),
                message: "injected failure".to_string(),
            });
        }
        self.config
            .texts
            .get(&name)
            .or(self.config.fallback.as_ref())
            .cloned()
            .ok_or_else(|| RecognitionError::empty(image))
    }
}

impl TextRecognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(
        &self,
        image: &Path,
        _hint: &RecognitionHint,
    ) -> Result<String, ContractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(image).map_err(|e| e.into_contract(image))
    }
}
