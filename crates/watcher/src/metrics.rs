//! Watcher counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Watcher metrics, shared with the polling task
#[derive(Debug, Default)]
pub struct WatcherMetrics {
    /// Completed polls
    pub polls: AtomicU64,

    /// Events delivered to the channel
    pub events_sent: AtomicU64,

    /// Polls that failed to walk the tree
    pub scan_errors: AtomicU64,
}

impl WatcherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        self.events_sent.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("healthsync_watch_events_total").increment(1);
    }

    pub fn record_scan_error(&self) {
        self.scan_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WatcherMetricsSnapshot {
        WatcherMetricsSnapshot {
            polls: self.polls.load(Ordering::Relaxed),
            events_sent: self.events_sent.load(Ordering::Relaxed),
            scan_errors: self.scan_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`WatcherMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatcherMetricsSnapshot {
    pub polls: u64,
    pub events_sent: u64,
    pub scan_errors: u64,
}
