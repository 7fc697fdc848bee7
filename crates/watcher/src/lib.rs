//! # Watcher
//!
//! Filesystem event source for the incoming tree.
//!
//! Responsibilities:
//! - Poll the incoming root recursively at a fixed interval
//! - Emit `FsEvent`s for new and changed files
//! - Deliver them over a bounded async-channel
//!
//! ## Usage
//!
//! ```ignore
//! use watcher::{PollingWatcher, WatcherConfig};
//!
//! let mut watcher = PollingWatcher::new(WatcherConfig::new(incoming, &blueprint.watch));
//! let rx = watcher.take_receiver().unwrap();
//! watcher.start().await?;
//! while let Ok(event) = rx.recv().await {
//!     // handle event
//! }
//! ```

mod error;
mod metrics;
mod snapshot;
mod watcher;

pub use error::{Result, WatcherError};
pub use metrics::{WatcherMetrics, WatcherMetricsSnapshot};
pub use snapshot::{diff, take_snapshot, FileStamp, Snapshot};
pub use watcher::{PollingWatcher, WatcherConfig};
