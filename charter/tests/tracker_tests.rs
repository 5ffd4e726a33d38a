//! Tests for progress tracking, git mining and the background watcher.

use async_trait::async_trait;
use charter::tracker::{
    extract_task_references, CommitAction, CommitRecord, CommitSource, GitCli, GitSyncOptions,
};
use charter::{
    parse_tasks, watch_and_sync, CharterError, DerivedTask, ProgressStatus, ProgressTracker,
    TaskProgressUpdate, TaskState, Tasks, WatchOptions,
};
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;

const TASKS: &str = r#"# Tasks

### P4-001: Progress tracker
### P4-002: Git mining
### P4-003: Watcher
### P4-004: Reports
"#;

fn tasks() -> Tasks {
    parse_tasks(TASKS)
}

fn commit(hash: &str, subject: &str, day: u32) -> CommitRecord {
    CommitRecord {
        hash: hash.to_string(),
        subject: subject.to_string(),
        date: Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap(),
        author: "dev".to_string(),
    }
}

/// Serves a fixed history and records every query it receives.
#[derive(Default)]
struct FakeHistory {
    commits: Vec<CommitRecord>,
    queries: StdMutex<Vec<GitSyncOptions>>,
}

#[async_trait]
impl CommitSource for FakeHistory {
    async fn list_commits(&self, options: &GitSyncOptions) -> Vec<CommitRecord> {
        self.queries.lock().unwrap().push(options.clone());
        self.commits.clone()
    }
}

mod progress_tests {
    use super::*;

    #[test]
    fn test_half_complete() {
        let mut tracker = ProgressTracker::new(&tasks());
        let applied = tracker
            .update_multiple(vec![
                TaskProgressUpdate::completed("P4-001"),
                TaskProgressUpdate::completed("P4-003"),
            ])
            .unwrap();
        assert_eq!(applied, 2);

        let stats = tracker.calculate_completion();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.remaining, 2);
        assert_eq!(stats.percent_complete, 50);
    }

    #[test]
    fn test_empty_tracker_is_zero_percent() {
        let tracker = ProgressTracker::new(&Tasks::default());
        assert_eq!(tracker.calculate_completion().percent_complete, 0);
        assert!(tracker.generate_progress_markdown().contains("**Status**: Starting"));
    }

    #[test]
    fn test_repeated_ids_tracked_once() {
        let tasks = Tasks::new(vec![
            DerivedTask::new("P4-001", "Progress tracker"),
            DerivedTask::new("P4-002", "Git mining"),
            DerivedTask::new("P4-001", "Progress tracker again"),
        ]);
        assert_eq!(tasks.duplicate_ids(), vec!["P4-001".to_string()]);

        let mut tracker = ProgressTracker::new(&tasks);
        tracker
            .update_progress(TaskProgressUpdate::completed("P4-001"))
            .unwrap();

        let stats = tracker.calculate_completion();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.percent_complete, 50);
        assert_eq!(tracker.statuses().count(), 2);
    }

    #[test]
    fn test_update_multiple_stops_at_unknown_id() {
        let mut tracker = ProgressTracker::new(&tasks());
        let err = tracker
            .update_multiple(vec![
                TaskProgressUpdate::completed("P4-001"),
                TaskProgressUpdate::completed("P9-999"),
                TaskProgressUpdate::completed("P4-002"),
            ])
            .unwrap_err();

        assert!(matches!(err, CharterError::UnknownTask(ref id) if id == "P9-999"));
        assert!(tracker.status("P4-001").unwrap().completed());
        assert!(!tracker.status("P4-002").unwrap().completed());
    }

    #[test]
    fn test_in_progress_and_blocked_are_distinct() {
        let mut tracker = ProgressTracker::new(&tasks());
        tracker
            .update_multiple(vec![
                TaskProgressUpdate::in_progress("P4-001"),
                TaskProgressUpdate::blocked("P4-002").with_notes("waiting on review"),
            ])
            .unwrap();
        assert_eq!(tracker.status("P4-001").unwrap().state(), TaskState::InProgress);
        assert_eq!(tracker.status("P4-002").unwrap().state(), TaskState::Blocked);
        assert_eq!(tracker.calculate_completion().completed, 0);
    }

    #[test]
    fn test_completed_task_can_be_reopened() {
        let mut tracker = ProgressTracker::new(&tasks());
        tracker.update_progress(TaskProgressUpdate::completed("P4-004")).unwrap();
        tracker.update_progress(TaskProgressUpdate::in_progress("P4-004")).unwrap();
        let status = tracker.status("P4-004").unwrap();
        assert!(!status.completed());
        assert!(status.completed_at().is_none());
    }

    #[test]
    fn test_checkbox_round_trip() {
        let mut tracker = ProgressTracker::new(&tasks());
        tracker
            .update_multiple(vec![
                TaskProgressUpdate::completed("P4-002").with_notes("fix in commit abcdef0"),
                TaskProgressUpdate::completed("P4-004"),
                TaskProgressUpdate::in_progress("P4-001"),
            ])
            .unwrap();
        let markdown = tracker.generate_progress_markdown();

        let mut fresh = ProgressTracker::new(&tasks());
        assert_eq!(fresh.load_progress(&markdown), 2);

        let completed = |t: &ProgressTracker| -> HashSet<String> {
            t.statuses()
                .filter(|s| s.completed())
                .map(|s| s.id().to_string())
                .collect()
        };
        assert_eq!(completed(&tracker), completed(&fresh));
        assert_eq!(fresh.status("P4-002").unwrap().notes(), Some("fix in commit abcdef0"));
    }

    #[tokio::test]
    async fn test_progress_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.md");

        let mut tracker = ProgressTracker::new(&tasks());
        tracker.update_progress(TaskProgressUpdate::completed("P4-003")).unwrap();
        tracker.save_progress(&path).await.unwrap();

        let mut fresh = ProgressTracker::new(&tasks());
        assert_eq!(fresh.load_progress_from_file(&path).await.unwrap(), 1);
        assert!(fresh.status("P4-003").unwrap().completed());
    }

    #[tokio::test]
    async fn test_missing_progress_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = ProgressTracker::new(&tasks());
        let err = tracker
            .load_progress_from_file(dir.path().join("absent.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, CharterError::Io { .. }));
    }
}

mod git_tests {
    use super::*;

    #[test]
    fn test_fixes_yields_exactly_one_reference() {
        let refs = extract_task_references("fixes P4-001 progress tracker", None);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].task_id, "P4-001");
        assert_eq!(refs[0].action, CommitAction::Fix);
    }

    #[tokio::test]
    async fn test_sync_outside_repository_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = ProgressTracker::new(&tasks());
        let applied = tracker
            .sync_from_git(&GitSyncOptions::new().repo_path(dir.path()))
            .await;
        assert!(applied.is_empty());
        assert_eq!(tracker.calculate_completion().completed, 0);
    }

    #[tokio::test]
    async fn test_sync_with_missing_directory_is_empty() {
        let cli = GitCli::new();
        let options = GitSyncOptions::new().repo_path("/definitely/not/here");
        assert!(cli.list_commits(&options).await.is_empty());
    }

    #[tokio::test]
    async fn test_sync_applies_references() {
        let history = Arc::new(FakeHistory {
            commits: vec![
                commit("3333333333", "docs: mention P4-004", 3),
                commit("2222222222", "Resolves P4-002 and touches P4-003", 2),
                commit("1111111111", "fixes P4-001 progress tracker", 1),
            ],
            ..Default::default()
        });
        let mut tracker = ProgressTracker::with_commit_source(&tasks(), history.clone());

        let since = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let applied = tracker
            .sync_from_git(&GitSyncOptions::new().since(since).branch("main"))
            .await;

        let summary: Vec<_> = applied
            .iter()
            .map(|u| (u.task_id.as_str(), u.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("P4-001", ProgressStatus::Completed),
                ("P4-002", ProgressStatus::Completed),
                ("P4-003", ProgressStatus::InProgress),
                ("P4-004", ProgressStatus::InProgress),
            ]
        );

        let p1 = tracker.status("P4-001").unwrap();
        assert_eq!(p1.notes(), Some("fix in commit 1111111"));
        assert_eq!(p1.completed_at(), Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()));
        assert_eq!(tracker.calculate_completion().percent_complete, 50);

        let queries = history.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].since, Some(since));
        assert_eq!(queries[0].branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_mention_after_completion_reopens_task() {
        let mut tracker = ProgressTracker::new(&tasks());
        tracker
            .update_progress(TaskProgressUpdate::completed("P4-001"))
            .unwrap();

        let applied =
            tracker.apply_commits(&[commit("6666666666", "refactor around P4-001", 6)], None);

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].status, ProgressStatus::InProgress);
        let status = tracker.status("P4-001").unwrap();
        assert!(!status.completed());
        assert_eq!(status.state(), TaskState::InProgress);
        assert_eq!(status.notes(), Some("mention in commit 6666666"));
    }

    #[tokio::test]
    async fn test_custom_pattern_references() {
        let history = Arc::new(FakeHistory {
            commits: vec![commit("4444444444", "wip on [P4-003]", 4)],
            ..Default::default()
        });
        let mut tracker = ProgressTracker::with_commit_source(&tasks(), history);
        let applied = tracker
            .sync_from_git(&GitSyncOptions::new().task_id_pattern(r"\[([A-Z0-9]+-\d+)\]"))
            .await;
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].notes.as_deref(), Some("custom in commit 4444444"));
        assert_eq!(tracker.status("P4-003").unwrap().state(), TaskState::InProgress);
    }
}

mod watcher_tests {
    use super::*;

    /// Sleeps longer than the poll interval and tracks overlapping calls.
    struct SlowHistory {
        delay: Duration,
        active: AtomicUsize,
        max_active: AtomicUsize,
        calls: AtomicUsize,
        commits: Vec<CommitRecord>,
    }

    #[async_trait]
    impl CommitSource for SlowHistory {
        async fn list_commits(&self, _options: &GitSyncOptions) -> Vec<CommitRecord> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.commits.clone()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_never_overlap() {
        let history = Arc::new(SlowHistory {
            delay: Duration::from_secs(25),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            commits: vec![commit("5555555555", "closes P4-004", 5)],
        });
        let tracker = Arc::new(Mutex::new(ProgressTracker::with_commit_source(
            &tasks(),
            history.clone(),
        )));

        let watcher = watch_and_sync(
            Arc::clone(&tracker),
            WatchOptions::default().interval(Duration::from_secs(10)),
        );
        let mut reports = watcher.subscribe();
        for expected in 1..=3 {
            let report = reports.recv().await.unwrap();
            assert_eq!(report.poll, expected);
        }
        watcher.shutdown().await;

        // a tick missed during a slow poll may start one more poll before
        // the cancel lands; it still runs alone
        assert_eq!(history.max_active.load(Ordering::SeqCst), 1);
        assert!(history.calls.load(Ordering::SeqCst) >= 3);
        assert!(tracker.lock().await.status("P4-004").unwrap().completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_since_advances_to_previous_poll_start() {
        let history = Arc::new(FakeHistory::default());
        let tracker = Arc::new(Mutex::new(ProgressTracker::with_commit_source(
            &tasks(),
            history.clone(),
        )));
        let initial = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let watcher = watch_and_sync(
            tracker,
            WatchOptions::new(GitSyncOptions::new().since(initial))
                .interval(Duration::from_secs(5)),
        );
        let mut reports = watcher.subscribe();
        let first = reports.recv().await.unwrap();
        let second = reports.recv().await.unwrap();
        watcher.shutdown().await;

        assert_eq!(first.since, Some(initial));
        assert_eq!(second.since, Some(first.started_at));

        let queries = history.queries.lock().unwrap();
        assert_eq!(queries[0].since, Some(initial));
        assert_eq!(queries[1].since, Some(first.started_at));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_polls_after_cancel() {
        let history = Arc::new(FakeHistory::default());
        let tracker = Arc::new(Mutex::new(ProgressTracker::with_commit_source(
            &tasks(),
            history.clone(),
        )));

        let watcher = watch_and_sync(
            tracker,
            WatchOptions::default().interval(Duration::from_secs(1)),
        );
        let mut reports = watcher.subscribe();
        reports.recv().await.unwrap();
        watcher.cancel();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(history.queries.lock().unwrap().len(), 1);
        watcher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_watcher() {
        let history = Arc::new(FakeHistory::default());
        let tracker = Arc::new(Mutex::new(ProgressTracker::with_commit_source(
            &tasks(),
            history.clone(),
        )));

        let watcher = watch_and_sync(
            tracker,
            WatchOptions::default().interval(Duration::from_secs(1)),
        );
        drop(watcher);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(history.queries.lock().unwrap().is_empty());
    }
}
