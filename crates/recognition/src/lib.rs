//! # Recognition
//!
//! Text recognition adapters behind `contracts::TextRecognizer`.
//!
//! Responsibilities:
//! - Run the tesseract command line per capture
//! - Read pre-recognized sidecar text
//! - Provide a mock engine with injectable failures
//!
//! Every failure surfaces as `ContractError::Recognition` and is scoped to the
//! capture being recognized.

pub mod backend;
pub mod error;
pub mod mock;
pub mod sidecar;
pub mod tesseract;

pub use backend::RecognizerBackend;
pub use contracts::{RecognitionHint, TextRecognizer};
pub use error::{RecognitionError, Result};
pub use mock::{MockRecognizer, MockRecognizerConfig};
pub use sidecar::SidecarRecognizer;
pub use tesseract::TesseractRecognizer;
