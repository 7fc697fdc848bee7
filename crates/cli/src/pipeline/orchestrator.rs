//! Ingestion orchestrator - coordinates all components.
//!
//! One logical thread of control: events are handled one at a time, and
//! every ready group is analyzed, uploaded and archived before the next
//! event is looked at.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use assembler::{scan_directory, CaptureSetAssembler, Observation};
use async_channel::Receiver;
use chrono::{Local, NaiveDate};
use contracts::{
    dedup_first_wins, resolve_capture_date, CanonicalMetric, CaptureGroup, DeviceConfig, DeviceId,
    FsEvent, IngestBlueprint, RawFile, RecognitionHint, RecordStore, TextRecognizer, UploadRow,
};
use extraction::CaptureAnalyzer;
use observability::GroupRecord;
use publisher::{upload_new_rows, Archiver};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use super::IngestStats;

/// What happened to one capture group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// New rows appended and every member archived
    Uploaded {
        metrics: usize,
        rows: usize,
        duplicates: usize,
    },
    /// Every row was already stored; members archived
    AlreadyUploaded { metrics: usize },
    /// Analysis produced nothing; files stay in place
    NoMetricsFound,
    RecognitionFailure { message: String },
    AnalysisFailure { message: String },
    /// Store read or write failed; files stay in place
    UploadFailure { message: String },
    /// Rows are stored but some members could not be moved
    ArchiveFailure {
        metrics: usize,
        rows: usize,
        failed: usize,
    },
}

impl GroupOutcome {
    /// Labels of outcomes that leave the group's files in the hot folder
    pub const RETAINED_LABELS: [&'static str; 4] = [
        "no_metrics_found",
        "recognition_failure",
        "analysis_failure",
        "upload_failure",
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Uploaded { .. } => "uploaded",
            Self::AlreadyUploaded { .. } => "already_uploaded",
            Self::NoMetricsFound => "no_metrics_found",
            Self::RecognitionFailure { .. } => "recognition_failure",
            Self::AnalysisFailure { .. } => "analysis_failure",
            Self::UploadFailure { .. } => "upload_failure",
            Self::ArchiveFailure { .. } => "archive_failure",
        }
    }

    /// Whether the group is consumed (never retried) rather than abandoned
    /// until the next full rescan
    pub fn retires_group(&self) -> bool {
        matches!(
            self,
            Self::Uploaded { .. } | Self::AlreadyUploaded { .. } | Self::ArchiveFailure { .. }
        )
    }

    pub fn metrics_extracted(&self) -> usize {
        match self {
            Self::Uploaded { metrics, .. }
            | Self::AlreadyUploaded { metrics }
            | Self::ArchiveFailure { metrics, .. } => *metrics,
            _ => 0,
        }
    }

    pub fn rows_uploaded(&self) -> usize {
        match self {
            Self::Uploaded { rows, .. } | Self::ArchiveFailure { rows, .. } => *rows,
            _ => 0,
        }
    }
}

/// Per-device state
struct DeviceLane {
    config: DeviceConfig,
    incoming_dir: PathBuf,
    assembler: CaptureSetAssembler,
    analyzer: CaptureAnalyzer,
    hint: RecognitionHint,
}

/// Main ingestion orchestrator
pub struct IngestionOrchestrator<R, S> {
    lanes: BTreeMap<DeviceId, DeviceLane>,
    recognizer: R,
    store: S,
    archiver: Archiver,
    rescan_interval: Option<Duration>,
    stats: IngestStats,
    started: Instant,
}

impl<R, S> IngestionOrchestrator<R, S>
where
    R: TextRecognizer,
    S: RecordStore,
{
    /// Build one lane per configured device
    ///
    /// # Errors
    /// A device analyzer that cannot be built (e.g. an invalid fixed-format label).
    pub fn new(blueprint: &IngestBlueprint, recognizer: R, store: S) -> Result<Self> {
        let mut lanes = BTreeMap::new();
        for device in &blueprint.devices {
            let analyzer = CaptureAnalyzer::build(device, blueprint)
                .with_context(|| format!("Failed to build analyzer for device '{}'", device.id))?;
            lanes.insert(
                device.id.clone(),
                DeviceLane {
                    config: device.clone(),
                    incoming_dir: blueprint.incoming_dir(device),
                    assembler: CaptureSetAssembler::new(device.id.clone(), device.grouping.clone()),
                    analyzer,
                    hint: device.recognition_hint(&blueprint.recognition),
                },
            );
        }

        let rescan_interval = match blueprint.watch.rescan_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        info!(
            devices = lanes.len(),
            recognizer = recognizer.name(),
            store = store.name(),
            "orchestrator ready"
        );

        Ok(Self {
            stats: IngestStats {
                devices: lanes.len(),
                ..Default::default()
            },
            lanes,
            recognizer,
            store,
            archiver: Archiver::new(blueprint.incoming_root(), blueprint.processed_root()),
            rescan_interval,
            started: Instant::now(),
        })
    }

    /// Override the periodic rescan (`None` = off)
    pub fn with_rescan_interval(mut self, interval: Option<Duration>) -> Self {
        self.rescan_interval = interval.filter(|d| !d.is_zero());
        self
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Incomplete groups currently held for `device`
    pub fn pending_len(&self, device: &str) -> usize {
        self.lanes
            .get(device)
            .map_or(0, |lane| lane.assembler.pending_len())
    }

    /// Create missing hot folders
    pub fn ensure_hot_folders(&self) {
        for lane in self.lanes.values() {
            if let Err(e) = std::fs::create_dir_all(&lane.incoming_dir) {
                warn!(
                    device = %lane.config.id,
                    dir = %lane.incoming_dir.display(),
                    error = %e,
                    "cannot create hot folder"
                );
            }
        }
    }

    /// Rebuild every device from its hot folder and process what is ready
    #[instrument(name = "startup_scan", skip(self))]
    pub async fn startup_scan(&mut self) -> Vec<GroupOutcome> {
        let outcomes = self.full_rescan().await;
        self.stats.startup_groups += outcomes.len();
        info!(groups = outcomes.len(), "startup scan complete");
        outcomes
    }

    async fn full_rescan(&mut self) -> Vec<GroupOutcome> {
        let devices: Vec<DeviceId> = self.lanes.keys().cloned().collect();
        let mut outcomes = Vec::new();
        for device in devices {
            self.rescan_device(&device);
            outcomes.extend(self.process_ready(&device).await);
        }
        outcomes
    }

    fn rescan_device(&mut self, device: &DeviceId) {
        let Some(lane) = self.lanes.get_mut(device) else {
            return;
        };
        match scan_directory(&lane.incoming_dir, device, &lane.config.extensions) {
            Ok(files) => {
                let ready = lane.assembler.rescan(files);
                debug!(device = %device, ready, pending = lane.assembler.pending_len(), "device rescanned");
            }
            Err(e) => warn!(device = %device, error = %e, "hot folder scan failed"),
        }
        observability::record_pending_groups(device, lane.assembler.pending_len());
    }

    /// Route one filesystem event and process any group it completes
    #[instrument(
        name = "handle_event",
        skip(self, event),
        fields(kind = event.kind.as_str(), path = %event.path.display())
    )]
    pub async fn handle_event(&mut self, event: FsEvent) -> Vec<GroupOutcome> {
        let admitted = self.admit(&event);
        observability::record_event(event.kind.as_str(), admitted.is_some());
        self.stats.aggregator.record_event(admitted.is_some());
        match admitted {
            Some(device) => self.process_ready(&device).await,
            None => Vec::new(),
        }
    }

    /// Device the event's file was admitted to, if any
    fn admit(&mut self, event: &FsEvent) -> Option<DeviceId> {
        if event.is_dir {
            return None;
        }
        let folder = event.path.parent()?.file_name()?.to_str()?;
        let Some(lane) = self
            .lanes
            .values_mut()
            .find(|lane| lane.config.folder.eq_ignore_ascii_case(folder))
        else {
            debug!(folder, "not a hot folder");
            return None;
        };

        let file = RawFile::new(event.path.clone(), lane.config.id.clone());
        if !lane.config.accepts_extension(&file.extension) {
            debug!(extension = %file.extension, "extension not accepted");
            return None;
        }
        if !file.exists() {
            debug!("file no longer exists");
            return None;
        }

        let observation = lane.assembler.observe(file);
        debug!(device = %lane.config.id, ?observation, "file observed");
        observability::record_pending_groups(&lane.config.id, lane.assembler.pending_len());
        match observation {
            Observation::Admitted(_) | Observation::Fired(_) => Some(lane.config.id.clone()),
            Observation::Duplicate | Observation::Ignored(_) => None,
        }
    }

    /// Process ready groups of `device` until none is left
    async fn process_ready(&mut self, device: &DeviceId) -> Vec<GroupOutcome> {
        let Self {
            lanes,
            recognizer,
            store,
            archiver,
            stats,
            ..
        } = self;
        let Some(lane) = lanes.get_mut(device) else {
            return Vec::new();
        };

        let mut outcomes = Vec::new();
        // consuming a group may promote a pending one under the same key
        while let Some(group) = lane.assembler.ready_groups().into_iter().next() {
            let started = Instant::now();
            let outcome =
                process_group(&lane.analyzer, &lane.hint, &*recognizer, store, archiver, &group).await;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            if outcome.retires_group() {
                lane.assembler.consume(&group.key);
            } else {
                lane.assembler.abandon(&group.key);
            }

            log_outcome(&group, &outcome, elapsed_ms);
            observability::record_group_outcome(device, outcome.label(), elapsed_ms);
            observability::record_metrics_extracted(device, outcome.metrics_extracted());
            observability::record_rows_uploaded(device, outcome.rows_uploaded());
            stats.aggregator.update(&GroupRecord {
                device,
                outcome: outcome.label(),
                metrics_extracted: outcome.metrics_extracted(),
                rows_uploaded: outcome.rows_uploaded(),
                elapsed_ms,
            });
            outcomes.push(outcome);
        }
        observability::record_pending_groups(device, lane.assembler.pending_len());
        outcomes
    }

    /// Consume events until `shutdown` resolves or the channel closes
    pub async fn run<F>(&mut self, events: Receiver<FsEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut rescan = self.rescan_interval.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        info!(rescan_secs = ?self.rescan_interval.map(|d| d.as_secs()), "event loop running");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        self.handle_event(event).await;
                    }
                    Err(_) => {
                        warn!("event channel closed");
                        break;
                    }
                },
                _ = next_tick(&mut rescan) => {
                    self.stats.rescans += 1;
                    let outcomes = self.full_rescan().await;
                    debug!(groups = outcomes.len(), "periodic rescan complete");
                }
            }
        }
    }

    /// Stop the clock and hand back the run statistics
    pub fn finish(mut self) -> IngestStats {
        self.stats.duration = self.started.elapsed();
        self.stats
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Analyze, upload and archive one ready group. Never fails: every problem
/// becomes an outcome.
async fn process_group<R, S>(
    analyzer: &CaptureAnalyzer,
    hint: &RecognitionHint,
    recognizer: &R,
    store: &mut S,
    archiver: &Archiver,
    group: &CaptureGroup,
) -> GroupOutcome
where
    R: TextRecognizer,
    S: RecordStore,
{
    let metrics = match extract_metrics(analyzer, hint, recognizer, group).await {
        Ok(metrics) => dedup_first_wins(metrics),
        Err(outcome) => return outcome,
    };
    if metrics.is_empty() {
        return GroupOutcome::NoMetricsFound;
    }

    let rows = render_rows(group, &metrics, Local::now().date_naive());
    let report = match upload_new_rows(store, rows).await {
        Ok(report) => report,
        Err(e) => {
            return GroupOutcome::UploadFailure {
                message: e.to_string(),
            }
        }
    };

    let archived = archiver
        .archive_all(group.members().map(|member| member.path()))
        .await;
    if !archived.is_complete() {
        return GroupOutcome::ArchiveFailure {
            metrics: metrics.len(),
            rows: report.appended,
            failed: archived.failed.len(),
        };
    }

    if report.only_duplicates() {
        GroupOutcome::AlreadyUploaded {
            metrics: metrics.len(),
        }
    } else {
        GroupOutcome::Uploaded {
            metrics: metrics.len(),
            rows: report.appended,
            duplicates: report.duplicates,
        }
    }
}

async fn extract_metrics<R>(
    analyzer: &CaptureAnalyzer,
    hint: &RecognitionHint,
    recognizer: &R,
    group: &CaptureGroup,
) -> std::result::Result<Vec<CanonicalMetric>, GroupOutcome>
where
    R: TextRecognizer,
{
    if !analyzer.needs_recognition() {
        // Spline and spectral work stays off the event loop
        let (analyzer, group) = (analyzer.clone(), group.clone());
        return match tokio::task::spawn_blocking(move || analyzer.analyze_files(&group)).await {
            Ok(result) => result.map_err(|e| GroupOutcome::AnalysisFailure {
                message: e.to_string(),
            }),
            Err(e) => Err(GroupOutcome::AnalysisFailure {
                message: format!("analysis task failed: {e}"),
            }),
        };
    }

    let mut metrics = Vec::new();
    for member in group.members() {
        let text = recognizer
            .recognize(member.path(), hint)
            .await
            .map_err(|e| GroupOutcome::RecognitionFailure {
                message: e.to_string(),
            })?;
        let found = analyzer
            .analyze_text(&text)
            .map_err(|e| GroupOutcome::AnalysisFailure {
                message: e.to_string(),
            })?;
        debug!(file = %member.file_name(), metrics = found.len(), "member analyzed");
        metrics.extend(found);
    }
    Ok(metrics)
}

/// Rows for a group: date from the first member's name (else `today`),
/// source = first member's file name
pub(crate) fn render_rows(
    group: &CaptureGroup,
    metrics: &[CanonicalMetric],
    today: NaiveDate,
) -> Vec<UploadRow> {
    let (date, source) = match group.first_member() {
        Some(first) => (
            resolve_capture_date(first.date_token.as_deref(), today),
            first.file_name(),
        ),
        None => (today, String::new()),
    };
    metrics
        .iter()
        .map(|metric| UploadRow::from_metric(date, metric, &source))
        .collect()
}

fn log_outcome(group: &CaptureGroup, outcome: &GroupOutcome, elapsed_ms: f64) {
    let elapsed_ms = (elapsed_ms * 10.0).round() / 10.0;
    match outcome {
        GroupOutcome::Uploaded { metrics, rows, duplicates } => info!(
            device = %group.device,
            key = %group.key,
            members = group.len(),
            metrics,
            rows,
            duplicates,
            elapsed_ms,
            outcome = outcome.label(),
            "capture group uploaded and archived"
        ),
        GroupOutcome::AlreadyUploaded { metrics } => info!(
            device = %group.device,
            key = %group.key,
            members = group.len(),
            metrics,
            elapsed_ms,
            outcome = outcome.label(),
            "capture group already stored, archived"
        ),
        GroupOutcome::NoMetricsFound => warn!(
            device = %group.device,
            key = %group.key,
            members = group.len(),
            elapsed_ms,
            outcome = outcome.label(),
            "no metrics found, files left in place"
        ),
        GroupOutcome::RecognitionFailure { message }
        | GroupOutcome::AnalysisFailure { message }
        | GroupOutcome::UploadFailure { message } => warn!(
            device = %group.device,
            key = %group.key,
            members = group.len(),
            error = %message,
            elapsed_ms,
            outcome = outcome.label(),
            "capture group failed, files left in place"
        ),
        GroupOutcome::ArchiveFailure { rows, failed, .. } => warn!(
            device = %group.device,
            key = %group.key,
            rows,
            failed,
            elapsed_ms,
            outcome = outcome.label(),
            "rows stored but archiving failed"
        ),
    }
}
