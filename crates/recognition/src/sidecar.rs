//! Sidecar adapter: text recognized elsewhere, stored as `<image>.txt`.

use std::path::{Path, PathBuf};

use contracts::{ContractError, RecognitionHint, TextRecognizer};
use tracing::debug;

use crate::error::{RecognitionError, Result};

#[derive(Debug, Clone, Default)]
pub struct SidecarRecognizer;

impl SidecarRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// `photo.jpg` -> `photo.jpg.txt`
    pub fn sidecar_path(image: &Path) -> PathBuf {
        let mut name = image.as_os_str().to_owned();
        name.push(".txt");
        PathBuf::from(name)
    }

    pub async fn read(&self, image: &Path) -> Result<String> {
        let sidecar = Self::sidecar_path(image);
        let text = match tokio::fs::read_to_string(&sidecar).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RecognitionError::MissingSidecar {
                    path: image.to_path_buf(),
                });
            }
            Err(e) => return Err(RecognitionError::io(&sidecar, e)),
        };
        if text.trim().is_empty() {
            return Err(RecognitionError::empty(image));
        }
        debug!(sidecar = %sidecar.display(), "sidecar text loaded");
        Ok(text)
    }
}

impl TextRecognizer for SidecarRecognizer {
    fn name(&self) -> &str {
        "sidecar"
    }

    async fn recognize(
        &self,
        image: &Path,
        _hint: &RecognitionHint,
    ) -> std::result::Result<String, ContractError> {
        self.read(image).await.map_err(|e| e.into_contract(image))
    }
}
