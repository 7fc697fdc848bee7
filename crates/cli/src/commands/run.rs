//! `run` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use publisher::StoreBackend;
use recognition::RecognizerBackend;
use tracing::{info, warn};
use watcher::{PollingWatcher, WatcherConfig};

use super::{apply_dry_run, load_blueprint};
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::IngestionOrchestrator;

const WATCHER_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(&args.config)?;

    // Apply CLI overrides
    if args.dry_run {
        apply_dry_run(&mut blueprint);
    }
    if let Some(secs) = args.rescan_interval {
        info!(secs, "Overriding rescan interval from CLI");
        blueprint.watch.rescan_interval_secs = secs;
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)
            .context("Failed to start metrics exporter")?;
        info!(port = args.metrics_port, "Prometheus exporter listening");
    }

    let recognizer = RecognizerBackend::from_config(&blueprint.recognition);
    let store = StoreBackend::from_blueprint(&blueprint);
    let mut orchestrator = IngestionOrchestrator::new(&blueprint, recognizer, store)?;
    orchestrator.ensure_hot_folders();

    // Baseline first: files dropped while the startup scan runs become
    // queued events instead of part of the baseline
    let mut watcher = PollingWatcher::new(WatcherConfig::new(
        blueprint.incoming_root(),
        &blueprint.watch,
    ));
    let events = watcher
        .take_receiver()
        .ok_or_else(|| CliError::pipeline_execution("watcher event receiver already taken"))?;
    let handle = watcher
        .start()
        .await
        .map_err(|e| CliError::pipeline_execution(e.to_string()))?;

    if args.skip_startup_scan {
        info!("Startup scan skipped");
    } else {
        orchestrator.startup_scan().await;
    }

    info!(root = %blueprint.incoming_root().display(), "Watching hot folders, Ctrl+C to stop");
    orchestrator.run(events, shutdown_signal()).await;

    watcher.stop();
    if tokio::time::timeout(WATCHER_JOIN_TIMEOUT, handle).await.is_err() {
        warn!("Watcher did not stop in time");
    }

    let watch = watcher.metrics().snapshot();
    info!(
        polls = watch.polls,
        events = watch.events_sent,
        scan_errors = watch.scan_errors,
        "Watcher stopped"
    );

    let stats = orchestrator.finish();
    info!(
        groups = stats.aggregator.total_groups,
        rows_uploaded = stats.aggregator.rows_uploaded,
        duration_secs = stats.duration.as_secs_f64(),
        "healthsync finished"
    );
    stats.print_summary();
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
