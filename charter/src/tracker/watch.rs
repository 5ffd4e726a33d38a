//! Periodic commit-history sync.
//!
//! [`watch_and_sync`] spawns a tokio task that calls the tracker's commit
//! source on a fixed interval, advancing `since` to the start of the previous
//! poll. Polls are serialized: the loop awaits each sync before waiting for
//! the next tick, and ticks that fall due during a slow sync are skipped.
//!
//! Once [`SyncWatcher::cancel`] is called (or the watcher is dropped) no new
//! poll starts. A poll already in flight runs to completion.

use super::{GitSyncOptions, ProgressTracker};
use crate::models::TaskProgressUpdate;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::Instrument;

/// Poll interval when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Watcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Options for each pass; `since` is the lower bound of the first poll
    pub sync: GitSyncOptions,
    pub interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            sync: GitSyncOptions::default(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WatchOptions {
    pub fn new(sync: GitSyncOptions) -> Self {
        Self {
            sync,
            ..Default::default()
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Outcome of one poll, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// 1-based poll number
    pub poll: u64,
    pub started_at: DateTime<Utc>,
    /// Lower bound used for this poll's commit query
    pub since: Option<DateTime<Utc>>,
    pub applied: Vec<TaskProgressUpdate>,
}

/// Handle to a running watcher.
#[derive(Debug)]
pub struct SyncWatcher {
    cancel_tx: watch::Sender<bool>,
    report_tx: broadcast::Sender<PollReport>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWatcher {
    /// Stop scheduling polls.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Receive a report after every completed poll.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PollReport> {
        self.report_tx.subscribe()
    }

    /// Cancel and wait for the background task, including any in-flight poll.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Watcher task ended abnormally");
            }
        }
    }
}

impl Drop for SyncWatcher {
    fn drop(&mut self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Start polling commit history into `tracker` every `options.interval`.
///
/// The first poll happens one interval after the call. Must be called from
/// within a tokio runtime.
pub fn watch_and_sync(tracker: Arc<Mutex<ProgressTracker>>, options: WatchOptions) -> SyncWatcher {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (report_tx, _) = broadcast::channel(16);

    let handle = tokio::spawn(poll_loop(tracker, options, cancel_rx, report_tx.clone()));

    SyncWatcher {
        cancel_tx,
        report_tx,
        handle: Some(handle),
    }
}

async fn poll_loop(
    tracker: Arc<Mutex<ProgressTracker>>,
    options: WatchOptions,
    mut cancel_rx: watch::Receiver<bool>,
    report_tx: broadcast::Sender<PollReport>,
) {
    let source = tracker.lock().await.commit_source();
    let pattern = options.sync.pattern_or_warn();
    let interval = options.interval.max(Duration::from_millis(1));

    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut since = options.sync.since;
    let mut poll: u64 = 0;

    tracing::info!(
        target: "charter.events",
        interval_ms = interval.as_millis() as u64,
        "Watcher started"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel_rx.changed() => break,
            _ = ticker.tick() => {}
        }
        if *cancel_rx.borrow() {
            break;
        }

        poll += 1;
        let started_at = Utc::now();
        let mut sync = options.sync.clone();
        sync.since = since;

        let applied = async {
            let commits = source.list_commits(&sync).await;
            tracker.lock().await.apply_commits(&commits, pattern.as_ref())
        }
        .instrument(charter_telemetry::watch_poll_span(poll))
        .await;

        tracing::debug!(poll, applied = applied.len(), "Watcher poll finished");
        let _ = report_tx.send(PollReport {
            poll,
            started_at,
            since,
            applied,
        });
        since = Some(started_at);
    }

    tracing::info!(target: "charter.events", polls = poll, "Watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DerivedTask, Tasks};
    use crate::tracker::{CommitRecord, CommitSource};
    use async_trait::async_trait;

    struct SilentSource;

    #[async_trait]
    impl CommitSource for SilentSource {
        async fn list_commits(&self, _options: &GitSyncOptions) -> Vec<CommitRecord> {
            Vec::new()
        }
    }

    fn tracker() -> Arc<Mutex<ProgressTracker>> {
        let tasks = Tasks::new(vec![DerivedTask::new("P1-001", "Parse")]);
        Arc::new(Mutex::new(ProgressTracker::with_commit_source(
            &tasks,
            Arc::new(SilentSource),
        )))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_after_one_interval() {
        let watcher = watch_and_sync(
            tracker(),
            WatchOptions::default().interval(Duration::from_secs(10)),
        );
        let mut reports = watcher.subscribe();

        let before = Instant::now();
        let report = reports.recv().await.unwrap();
        assert_eq!(report.poll, 1);
        assert!(report.since.is_none());
        assert!(Instant::now() - before >= Duration::from_secs(10));

        watcher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let watcher = watch_and_sync(tracker(), WatchOptions::default());
        let mut reports = watcher.subscribe();
        watcher.cancel();
        assert!(watcher.is_cancelled());
        watcher.shutdown().await;
        assert!(matches!(
            reports.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
