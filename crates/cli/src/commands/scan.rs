//! `scan` command implementation.

use anyhow::Result;
use publisher::StoreBackend;
use recognition::RecognizerBackend;
use tracing::info;

use super::{apply_dry_run, load_blueprint};
use crate::cli::ScanArgs;
use crate::pipeline::IngestionOrchestrator;

/// Execute the `scan` command: one startup scan, no watching
pub async fn run_scan(args: &ScanArgs) -> Result<()> {
    let mut blueprint = load_blueprint(&args.config)?;
    if args.dry_run {
        apply_dry_run(&mut blueprint);
    }

    let recognizer = RecognizerBackend::from_config(&blueprint.recognition);
    let store = StoreBackend::from_blueprint(&blueprint);
    let mut orchestrator = IngestionOrchestrator::new(&blueprint, recognizer, store)?;
    orchestrator.ensure_hot_folders();

    let outcomes = orchestrator.startup_scan().await;
    let retired = outcomes.iter().filter(|o| o.retires_group()).count();
    info!(
        groups = outcomes.len(),
        retired,
        left_in_place = outcomes.len() - retired,
        "Scan finished"
    );

    orchestrator.finish().print_summary();
    Ok(())
}
