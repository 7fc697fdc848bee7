//! # Contracts
//!
//! Shared data model and collaborator interfaces for the ingestion pipeline.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data flow
//! `FsEvent` -> `RawFile` -> `CaptureGroup` -> `CanonicalMetric` -> `UploadRow`

mod blueprint;
mod capture;
mod device_id;
mod error;
mod event;
mod metric;
mod recognizer;
mod store;

pub use blueprint::*;
pub use capture::*;
pub use device_id::DeviceId;
pub use error::*;
pub use event::*;
pub use metric::*;
pub use recognizer::{RecognitionHint, TextRecognizer};
pub use store::*;
