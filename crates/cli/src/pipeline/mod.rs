//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{GroupOutcome, IngestionOrchestrator};
pub use stats::IngestStats;
