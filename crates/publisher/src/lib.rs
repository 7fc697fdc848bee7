//! # Publisher
//!
//! Output side of the pipeline.
//!
//! Responsibilities:
//! - Record store backends (JSON-lines file, log, in-memory)
//! - Dedup rows against what the store already holds
//! - Move processed captures into the processed tree

pub mod archive;
pub mod dedup;
pub mod error;
pub mod stores;

pub use archive::{ArchiveReport, Archiver};
pub use contracts::{RecordStore, UploadRow};
pub use dedup::{filter_new_rows, upload_new_rows, UploadReport};
pub use error::{PublisherError, Result};
pub use stores::{JsonlStore, LogStore, MemoryStore, StoreBackend};
