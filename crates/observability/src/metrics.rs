//! Ingest pipeline metrics
//!
//! Prometheus-facing counters plus an in-memory aggregator for run summaries.

use std::collections::BTreeMap;

use contracts::DeviceId;
use metrics::{counter, gauge, histogram};

/// Record one filesystem event reaching the orchestrator
pub fn record_event(kind: &str, accepted: bool) {
    let status = if accepted { "accepted" } else { "ignored" };
    counter!(
        "healthsync_events_total",
        "kind" => kind.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record the outcome of processing one capture group
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_group_outcome;
///
/// let outcome = orchestrator.process_group(group).await;
/// record_group_outcome(&device, outcome.label(), started.elapsed().as_secs_f64() * 1000.0);
/// ```
pub fn record_group_outcome(device: &DeviceId, outcome: &str, elapsed_ms: f64) {
    counter!(
        "healthsync_groups_total",
        "device" => device.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(
        "healthsync_group_duration_ms",
        "device" => device.to_string()
    )
    .record(elapsed_ms);
}

/// Record canonical metrics produced for one group
pub fn record_metrics_extracted(device: &DeviceId, count: usize) {
    counter!(
        "healthsync_metrics_extracted_total",
        "device" => device.to_string()
    )
    .increment(count as u64);
}

/// Record rows that reached the store for one device
pub fn record_rows_uploaded(device: &DeviceId, count: usize) {
    counter!(
        "healthsync_rows_uploaded_by_device_total",
        "device" => device.to_string()
    )
    .increment(count as u64);
}

/// Incomplete capture groups currently held for a device
pub fn record_pending_groups(device: &DeviceId, pending: usize) {
    gauge!(
        "healthsync_pending_groups",
        "device" => device.to_string()
    )
    .set(pending as f64);
}

/// One processed group as seen by the aggregator
#[derive(Debug, Clone)]
pub struct GroupRecord<'a> {
    pub device: &'a DeviceId,
    pub outcome: &'a str,
    pub metrics_extracted: usize,
    pub rows_uploaded: usize,
    pub elapsed_ms: f64,
}

/// Aggregates group outcomes in memory for the end-of-run summary
#[derive(Debug, Clone, Default)]
pub struct IngestMetricsAggregator {
    pub events_seen: u64,

    pub events_ignored: u64,

    pub total_groups: u64,

    pub rows_uploaded: u64,

    pub metrics_extracted: u64,

    /// Groups per outcome label
    pub outcome_counts: BTreeMap<String, u64>,

    /// Groups per device
    pub device_counts: BTreeMap<String, u64>,

    /// Per-group processing time (ms)
    pub latency_stats: RunningStats,

    /// Metrics per successful group
    pub metrics_per_group: RunningStats,
}

impl IngestMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self, accepted: bool) {
        self.events_seen += 1;
        if !accepted {
            self.events_ignored += 1;
        }
    }

    pub fn update(&mut self, record: &GroupRecord<'_>) {
        self.total_groups += 1;
        self.rows_uploaded += record.rows_uploaded as u64;
        self.metrics_extracted += record.metrics_extracted as u64;
        *self
            .outcome_counts
            .entry(record.outcome.to_string())
            .or_insert(0) += 1;
        *self
            .device_counts
            .entry(record.device.to_string())
            .or_insert(0) += 1;
        self.latency_stats.push(record.elapsed_ms);
        if record.metrics_extracted > 0 {
            self.metrics_per_group.push(record.metrics_extracted as f64);
        }
    }

    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.outcome_counts.get(outcome).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            events_seen: self.events_seen,
            events_ignored: self.events_ignored,
            total_groups: self.total_groups,
            rows_uploaded: self.rows_uploaded,
            metrics_extracted: self.metrics_extracted,
            outcome_counts: self.outcome_counts.clone(),
            device_counts: self.device_counts.clone(),
            latency_ms: StatsSummary::from(&self.latency_stats),
            metrics_per_group: StatsSummary::from(&self.metrics_per_group),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub events_seen: u64,
    pub events_ignored: u64,
    pub total_groups: u64,
    pub rows_uploaded: u64,
    pub metrics_extracted: u64,
    pub outcome_counts: BTreeMap<String, u64>,
    pub device_counts: BTreeMap<String, u64>,
    pub latency_ms: StatsSummary,
    pub metrics_per_group: StatsSummary,
}

impl std::fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Ingest Summary ===")?;
        writeln!(
            f,
            "Events: {} ({} ignored)",
            self.events_seen, self.events_ignored
        )?;
        writeln!(f, "Groups processed: {}", self.total_groups)?;
        writeln!(f, "Metrics extracted: {}", self.metrics_extracted)?;
        writeln!(f, "Rows uploaded: {}", self.rows_uploaded)?;
        writeln!(f, "Group latency (ms): {}", self.latency_ms)?;
        writeln!(f, "Metrics per group: {}", self.metrics_per_group)?;

        if !self.outcome_counts.is_empty() {
            writeln!(f, "Outcomes:")?;
            for (outcome, count) in &self.outcome_counts {
                writeln!(f, "  {}: {}", outcome, count)?;
            }
        }
        if !self.device_counts.is_empty() {
            writeln!(f, "Devices:")?;
            for (device, count) in &self.device_counts {
                writeln!(f, "  {}: {}", device, count)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
