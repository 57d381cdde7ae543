//! End-to-end polling cycles against a scripted release source.
//!
//! These tests drive a real `ReleaseMonitor` with a file-backed `StateStore`
//! in a temporary directory and inspect both the hand-off channel and the
//! persisted file.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use github_releases::ReleaseError;
use parking_lot::Mutex;
use release_watch::domain::{NodeId, ReleaseSnapshot, RepositorySnapshot};
use release_watch::monitor::{
    Interruption, NewRelease, ReleaseMonitor, ReleaseMonitorConfig, ReleaseSource,
};
use release_watch::state::StateStore;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Release source answering from per-repository queues.
#[derive(Default)]
struct FakeSource {
    responses: Mutex<HashMap<String, VecDeque<Result<RepositorySnapshot, ReleaseError>>>>,
}

impl FakeSource {
    fn respond(&self, key: &str, response: Result<RepositorySnapshot, ReleaseError>) {
        self.responses
            .lock()
            .entry(key.to_string())
            .or_default()
            .push_back(response);
    }
}

#[async_trait]
impl ReleaseSource for FakeSource {
    async fn fetch_latest_release(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<RepositorySnapshot, ReleaseError> {
        self.responses
            .lock()
            .get_mut(&format!("{owner}/{name}"))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ReleaseError::no_release_found(owner, name)))
    }
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn release(key: &str, version: &str, published_at: DateTime<Utc>) -> RepositorySnapshot {
    let (owner, name) = key.split_once('/').unwrap();
    RepositorySnapshot {
        id: NodeId::new(format!("R_{owner}_{name}")),
        name: name.to_string(),
        owner: owner.to_string(),
        description: format!("The {name} project"),
        url: format!("https://github.com/{key}"),
        release: ReleaseSnapshot {
            id: NodeId::new(format!("RE_{name}_{version}")),
            name: version.to_string(),
            description: format!("Changes in {version}"),
            url: format!("https://github.com/{key}/releases/tag/{version}"),
            published_at,
        },
    }
}

struct Harness {
    dir: TempDir,
    source: Arc<FakeSource>,
    monitor: ReleaseMonitor<Arc<FakeSource>>,
    rx: mpsc::Receiver<NewRelease>,
    cancel: CancellationToken,
}

impl Harness {
    async fn new(keys: &[&str]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        Self::in_dir(dir, keys, Arc::new(FakeSource::default())).await
    }

    async fn in_dir(dir: TempDir, keys: &[&str], source: Arc<FakeSource>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let config = ReleaseMonitorConfig {
            repositories: keys.iter().map(|k| k.parse().unwrap()).collect(),
            poll_interval: Duration::from_millis(10),
        };
        let store = StateStore::new(dir.path().join("releases.json"));
        let mut monitor = ReleaseMonitor::new(config, source.clone(), store, tx);
        monitor.load_state().await;

        Self {
            dir,
            source,
            monitor,
            rx,
            cancel: CancellationToken::new(),
        }
    }

    /// Run one cycle while accepting every release it hands over.
    async fn cycle(&mut self) -> Vec<RepositorySnapshot> {
        let mut emitted = Vec::new();
        let cycle = self.monitor.run_cycle(&self.cancel);
        tokio::pin!(cycle);

        let report = loop {
            tokio::select! {
                report = &mut cycle => break report,
                Some(release) = self.rx.recv() => emitted.push(release.accept()),
            }
        };
        assert_eq!(report.interrupted, None);
        emitted
    }

    fn store(&self) -> StateStore {
        StateStore::new(self.dir.path().join("releases.json"))
    }
}

#[tokio::test]
async fn test_first_observation_is_recorded_without_notifying() {
    let mut harness = Harness::new(&["acme/widget"]).await;
    harness
        .source
        .respond("acme/widget", Ok(release("acme/widget", "v1.0.0", date(2024, 1, 1))));

    let emitted = harness.cycle().await;
    assert!(emitted.is_empty());

    let saved = harness.store().load().await.unwrap();
    let stored = &saved["acme/widget"].release;
    assert_eq!(stored.name, "v1.0.0");
    assert_eq!(stored.published_at, date(2024, 1, 1));
}

#[tokio::test]
async fn test_baseline_ignores_how_recent_the_release_is() {
    let mut harness = Harness::new(&["acme/widget"]).await;
    harness
        .source
        .respond("acme/widget", Ok(release("acme/widget", "v9.0.0", Utc::now())));

    assert!(harness.cycle().await.is_empty());
    assert_eq!(harness.monitor.state()["acme/widget"].release.name, "v9.0.0");
}

#[tokio::test]
async fn test_newer_release_is_emitted_once_then_settles() {
    let mut harness = Harness::new(&["acme/widget"]).await;
    let v1 = release("acme/widget", "v1.0.0", date(2024, 1, 1));
    let v11 = release("acme/widget", "v1.1.0", date(2024, 2, 1));
    harness.source.respond("acme/widget", Ok(v1));
    harness.source.respond("acme/widget", Ok(v11.clone()));
    harness.source.respond("acme/widget", Ok(v11.clone()));

    assert!(harness.cycle().await.is_empty());

    let emitted = harness.cycle().await;
    assert_eq!(emitted, vec![v11.clone()]);
    assert_eq!(harness.store().load().await.unwrap()["acme/widget"], v11);

    let before = tokio::fs::read(harness.store().path()).await.unwrap();
    assert!(harness.cycle().await.is_empty());
    let after = tokio::fs::read(harness.store().path()).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_equal_or_older_timestamps_never_notify() {
    let mut harness = Harness::new(&["acme/widget"]).await;
    let stored = release("acme/widget", "v2.0.0", date(2024, 3, 1));
    harness.source.respond("acme/widget", Ok(stored.clone()));
    // Same instant under a different name, then an older release.
    harness.source.respond(
        "acme/widget",
        Ok(release("acme/widget", "v2.0.0-hotfix", date(2024, 3, 1))),
    );
    harness
        .source
        .respond("acme/widget", Ok(release("acme/widget", "v1.9.0", date(2024, 2, 1))));

    assert!(harness.cycle().await.is_empty());
    assert!(harness.cycle().await.is_empty());
    assert!(harness.cycle().await.is_empty());
    assert_eq!(harness.monitor.state()["acme/widget"], stored);
}

#[tokio::test]
async fn test_failing_repository_does_not_block_others() {
    let mut harness = Harness::new(&["acme/widget", "foo/bar"]).await;
    harness
        .source
        .respond("foo/bar", Ok(release("foo/bar", "v1", date(2024, 1, 1))));
    harness
        .source
        .respond("acme/widget", Err(ReleaseError::no_release_found("acme", "widget")));
    harness
        .source
        .respond("foo/bar", Ok(release("foo/bar", "v2", date(2024, 2, 1))));

    assert!(harness.cycle().await.is_empty());

    // Nothing is scripted for the second acme/widget query, so it fails again.
    let emitted = harness.cycle().await;
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].full_name(), "foo/bar");
    assert_eq!(emitted[0].release.name, "v2");
    assert!(!harness.monitor.state().contains_key("acme/widget"));
}

#[tokio::test]
async fn test_restart_resumes_from_saved_state() {
    let harness = {
        let mut harness = Harness::new(&["acme/widget"]).await;
        harness
            .source
            .respond("acme/widget", Ok(release("acme/widget", "v1.0.0", date(2024, 1, 1))));
        harness.cycle().await;
        harness
    };

    // A new process over the same file sees the known release as unchanged.
    let source = Arc::new(FakeSource::default());
    source.respond("acme/widget", Ok(release("acme/widget", "v1.0.0", date(2024, 1, 1))));
    source.respond("acme/widget", Ok(release("acme/widget", "v1.0.1", date(2024, 1, 5))));
    let mut restarted = Harness::in_dir(harness.dir, &["acme/widget"], source).await;

    assert!(restarted.cycle().await.is_empty());
    let emitted = restarted.cycle().await;
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].release.name, "v1.0.1");
}

#[tokio::test]
async fn test_saved_state_round_trips() {
    let mut harness = Harness::new(&["acme/widget", "foo/bar"]).await;
    harness
        .source
        .respond("acme/widget", Ok(release("acme/widget", "v1.0.0", date(2024, 1, 1))));
    harness
        .source
        .respond("foo/bar", Ok(release("foo/bar", "v3", date(2023, 6, 1))));
    harness.cycle().await;

    let store = harness.store();
    let loaded = store.load().await.unwrap();
    assert_eq!(&loaded, harness.monitor.state());

    let before = tokio::fs::read(store.path()).await.unwrap();
    store.save(&loaded).await.unwrap();
    let after = tokio::fs::read(store.path()).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_release_is_recorded_only_after_acceptance() {
    let mut harness = Harness::new(&["acme/widget"]).await;
    let v1 = release("acme/widget", "v1.0.0", date(2024, 1, 1));
    harness.source.respond("acme/widget", Ok(v1.clone()));
    harness
        .source
        .respond("acme/widget", Ok(release("acme/widget", "v1.1.0", date(2024, 2, 1))));
    assert!(harness.cycle().await.is_empty());

    // Nobody accepts: the cycle stays blocked on the hand-off.
    let blocked = tokio::time::timeout(
        Duration::from_millis(200),
        harness.monitor.run_cycle(&harness.cancel),
    )
    .await;
    assert!(blocked.is_err());
    assert_eq!(harness.store().load().await.unwrap()["acme/widget"], v1);

    // The abandoned cycle's release was never accepted.
    let pending = harness.rx.try_recv().unwrap();
    assert_eq!(pending.repository().release.name, "v1.1.0");
    drop(pending);
    assert_eq!(harness.monitor.state()["acme/widget"], v1);
}

#[tokio::test]
async fn test_cancel_leaves_unaccepted_release_for_next_start() {
    let mut harness = Harness::new(&["acme/widget"]).await;
    let v1 = release("acme/widget", "v1.0.0", date(2024, 1, 1));
    harness.source.respond("acme/widget", Ok(v1.clone()));
    harness
        .source
        .respond("acme/widget", Ok(release("acme/widget", "v1.1.0", date(2024, 2, 1))));
    assert!(harness.cycle().await.is_empty());

    let cancel = harness.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });
    let report = harness.monitor.run_cycle(&harness.cancel).await;

    assert_eq!(report.interrupted, Some(Interruption::Cancelled));
    assert_eq!(report.emitted, 0);
    assert_eq!(harness.store().load().await.unwrap()["acme/widget"], v1);
}
