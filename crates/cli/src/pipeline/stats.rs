//! Ingest run statistics.

use std::time::Duration;

use observability::IngestMetricsAggregator;

/// Statistics from a `scan` or `run`
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Wall time of the run
    pub duration: Duration,

    /// Devices with a hot folder
    pub devices: usize,

    /// Groups processed by the startup scan
    pub startup_groups: usize,

    /// Full rescans triggered by the rescan timer
    pub rescans: u64,

    /// Group outcome aggregator
    pub aggregator: IngestMetricsAggregator,
}

impl IngestStats {
    /// Share of processed groups left in place for a retry, as percentage
    pub fn failure_rate(&self) -> f64 {
        let total = self.aggregator.total_groups;
        if total == 0 {
            return 0.0;
        }
        let retained: u64 = super::GroupOutcome::RETAINED_LABELS
            .iter()
            .map(|label| self.aggregator.outcome_count(label))
            .sum();
        retained as f64 / total as f64 * 100.0
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let summary = self.aggregator.summary();

        println!("\n=== healthsync run summary ===\n");
        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Devices: {}", self.devices);
        println!("   ├─ Startup groups: {}", self.startup_groups);
        println!("   ├─ Rescans: {}", self.rescans);
        println!(
            "   ├─ Events: {} ({} ignored)",
            summary.events_seen, summary.events_ignored
        );
        println!("   └─ Groups: {} ({:.1}% retained)", summary.total_groups, self.failure_rate());

        println!("\nOutput");
        println!("   ├─ Metrics extracted: {}", summary.metrics_extracted);
        println!("   ├─ Rows uploaded: {}", summary.rows_uploaded);
        println!("   ├─ Metrics per group: {}", summary.metrics_per_group);
        println!("   └─ Group latency (ms): {}", summary.latency_ms);

        if !summary.outcome_counts.is_empty() {
            println!("\nOutcomes");
            for (outcome, count) in &summary.outcome_counts {
                println!("   ├─ {}: {}", outcome, count);
            }
        }

        println!();
    }
}
