//! Tesseract command-line adapter.

use std::path::Path;
use std::process::Stdio;

use contracts::{ContractError, RecognitionHint, TextRecognizer};
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{RecognitionError, Result};

/// OCR engine mode passed to every invocation (LSTM only)
const ENGINE_MODE: &str = "3";

/// Runs `<binary> <image> stdout -l <lang> --oem 3 --psm <n>` per capture
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
}

impl TesseractRecognizer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Arguments for one invocation
    pub fn args(image: &Path, hint: &RecognitionHint) -> Vec<String> {
        vec![
            image.display().to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            hint.language.clone(),
            "--oem".to_string(),
            ENGINE_MODE.to_string(),
            "--psm".to_string(),
            hint.page_segmentation.to_string(),
        ]
    }

    #[instrument(name = "tesseract_run", skip(self, image, hint), fields(image = %image.display()))]
    pub async fn run(&self, image: &Path, hint: &RecognitionHint) -> Result<String> {
        let output = Command::new(&self.binary)
            .args(Self::args(image, hint))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RecognitionError::Launch {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RecognitionError::EngineFailed {
                path: image.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(RecognitionError::empty(image));
        }
        debug!(chars = text.len(), "text recognized");
        Ok(text)
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(
        &self,
        image: &Path,
        hint: &RecognitionHint,
    ) -> std::result::Result<String, ContractError> {
        self.run(image, hint).await.map_err(|e| e.into_contract(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_layout() {
        let hint = RecognitionHint {
            language: "spa+eng".into(),
            page_segmentation: 6,
        };
        let args = TesseractRecognizer::args(Path::new("/in/starfit/a.jpg"), &hint);
        assert_eq!(
            args,
            vec!["/in/starfit/a.jpg", "stdout", "-l", "spa+eng", "--oem", "3", "--psm", "6"]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_recognition_error() {
        let recognizer = TesseractRecognizer::new("/nonexistent/bin/tesseract");
        let err = recognizer
            .recognize(Path::new("/in/a.jpg"), &RecognitionHint::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Recognition { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_of_engine_is_returned() {
        // `echo` stands in for the engine and prints its arguments
        let recognizer = TesseractRecognizer::new("echo");
        let text = recognizer
            .run(Path::new("capture.jpg"), &RecognitionHint::default())
            .await
            .unwrap();
        assert!(text.starts_with("capture.jpg stdout -l spa+eng"));
    }
}
