//! PollingWatcher - interval polling of the incoming tree.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{bounded, Receiver, Sender};
use contracts::{FsEvent, WatchConfig};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, WatcherError};
use crate::metrics::WatcherMetrics;
use crate::snapshot::{diff, take_snapshot, Snapshot};

/// Polling cadence and channel sizing
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Tree to watch, recursively
    pub root: PathBuf,

    pub poll_interval: Duration,

    pub channel_capacity: usize,
}

impl WatcherConfig {
    pub fn new(root: impl Into<PathBuf>, watch: &WatchConfig) -> Self {
        Self {
            root: root.into(),
            poll_interval: Duration::from_millis(watch.poll_interval_ms.max(10)),
            channel_capacity: watch.channel_capacity.max(1),
        }
    }
}

/// Emits `FsEvent`s for files appearing or changing under the root.
///
/// Files already present when `start` returns are part of the baseline and
/// produce no events; a startup rescan run after `start` covers them.
pub struct PollingWatcher {
    config: WatcherConfig,
    running: Arc<AtomicBool>,
    metrics: Arc<WatcherMetrics>,
    tx: Sender<FsEvent>,
    rx: Option<Receiver<FsEvent>>,
}

impl PollingWatcher {
    pub fn new(config: WatcherConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity);
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(WatcherMetrics::new()),
            tx,
            rx: Some(rx),
        }
    }

    /// Event stream receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<FsEvent>> {
        self.rx.take()
    }

    pub fn metrics(&self) -> Arc<WatcherMetrics> {
        self.metrics.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Take the baseline snapshot, then spawn the polling task. Every file
    /// written after this returns produces an event.
    ///
    /// # Errors
    /// `WatcherError::AlreadyRunning` if started twice.
    #[instrument(name = "watcher_start", skip(self), fields(root = %self.config.root.display()))]
    pub async fn start(&self) -> Result<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(WatcherError::AlreadyRunning {
                root: self.config.root.clone(),
            });
        }

        let baseline = match scan(&self.config).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "initial scan failed, starting from an empty baseline");
                self.metrics.record_scan_error();
                Snapshot::new()
            }
        };
        debug!(files = baseline.len(), "baseline taken");

        let config = self.config.clone();
        let running = self.running.clone();
        let metrics = self.metrics.clone();
        let tx = self.tx.clone();

        info!(interval_ms = config.poll_interval.as_millis() as u64, "watcher started");
        Ok(tokio::spawn(async move {
            poll_loop(config, baseline, running, metrics, tx).await;
        }))
    }

    /// Ask the polling task to exit after its current poll
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!(root = %self.config.root.display(), "watcher stopping");
        }
    }
}

impl Drop for PollingWatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

async fn poll_loop(
    config: WatcherConfig,
    mut previous: Snapshot,
    running: Arc<AtomicBool>,
    metrics: Arc<WatcherMetrics>,
    tx: Sender<FsEvent>,
) {
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    while running.load(Ordering::Relaxed) {
        ticker.tick().await;
        if !running.load(Ordering::Relaxed) {
            break;
        }

        let current = match scan(&config).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "poll failed");
                metrics.record_scan_error();
                continue;
            }
        };
        metrics.record_poll();

        for event in diff(&previous, &current) {
            debug!(kind = event.kind.as_str(), path = %event.path.display(), "fs event");
            if tx.send(event).await.is_err() {
                debug!("event receiver dropped, watcher exiting");
                running.store(false, Ordering::SeqCst);
                return;
            }
            metrics.record_event();
        }
        previous = current;
    }
    debug!(root = %config.root.display(), "watcher stopped");
}

async fn scan(config: &WatcherConfig) -> Result<Snapshot> {
    let root = config.root.clone();
    match tokio::task::spawn_blocking(move || take_snapshot(&root)).await {
        Ok(result) => result,
        Err(join) => Err(WatcherError::Scan {
            path: config.root.clone(),
            source: std::io::Error::other(join.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FsEventKind;

    fn config(root: &std::path::Path) -> WatcherConfig {
        WatcherConfig {
            root: root.to_path_buf(),
            poll_interval: Duration::from_millis(20),
            channel_capacity: 16,
        }
    }

    #[tokio::test]
    async fn test_new_file_produces_created_event() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("starfit")).unwrap();
        std::fs::write(dir.path().join("starfit/old.jpg"), b"x").unwrap();

        let mut watcher = PollingWatcher::new(config(dir.path()));
        let rx = watcher.take_receiver().unwrap();
        let handle = watcher.start().await.unwrap();

        let new_path = dir.path().join("starfit/new.jpg");
        std::fs::write(&new_path, b"x").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within timeout")
            .unwrap();
        assert_eq!(event.kind, FsEventKind::Created);
        assert_eq!(event.path, new_path);

        watcher.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(watcher.metrics().snapshot().events_sent >= 1);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = PollingWatcher::new(config(dir.path()));
        let _handle = watcher.start().await.unwrap();
        assert!(matches!(
            watcher.start().await,
            Err(WatcherError::AlreadyRunning { .. })
        ));
        watcher.stop();
    }

    #[tokio::test]
    async fn test_file_written_right_after_start_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("baseline.png"), b"x").unwrap();

        let mut watcher = PollingWatcher::new(config(dir.path()));
        let rx = watcher.take_receiver().unwrap();
        let _handle = watcher.start().await.unwrap();

        // lands before the first poll
        let dropped = dir.path().join("during_scan.png");
        std::fs::write(&dropped, b"x").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within timeout")
            .unwrap();
        assert_eq!(event.path, dropped);
        assert_eq!(event.kind, FsEventKind::Created);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(rx.is_empty());
        watcher.stop();
    }

    #[test]
    fn test_config_from_watch_section() {
        let watch = WatchConfig {
            poll_interval_ms: 0,
            rescan_interval_secs: 0,
            channel_capacity: 0,
        };
        let config = WatcherConfig::new("/data/incoming", &watch);
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.channel_capacity, 1);
    }
}
