//! Release monitor service implementation.
//!
//! The ReleaseMonitor owns the persisted state, polls every watched repository
//! once per cycle and forwards strictly newer releases to the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::handoff::NewRelease;
use super::source::ReleaseSource;
use crate::domain::WatchKey;
use crate::state::{PersistedState, StateStore};

/// Default delay between two polling cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Configuration for the release monitor.
#[derive(Debug, Clone)]
pub struct ReleaseMonitorConfig {
    /// Repositories to watch, queried in this order.
    pub repositories: Vec<WatchKey>,
    /// Sleep between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
}

impl Default for ReleaseMonitorConfig {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Why a cycle stopped before visiting every repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// Shutdown was requested.
    Cancelled,
    /// The hand-off receiver is gone.
    DispatcherClosed,
}

/// Counters for one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Successful queries.
    pub checked: usize,
    /// First observations recorded without notifying.
    pub baselined: usize,
    /// New releases handed to the dispatcher.
    pub emitted: usize,
    /// Queries whose release was not newer than the stored one.
    pub unchanged: usize,
    /// Failed queries.
    pub failed: usize,
    /// Set when the cycle stopped before visiting every repository.
    pub interrupted: Option<Interruption>,
}

/// The release monitor.
pub struct ReleaseMonitor<S> {
    source: S,
    store: StateStore,
    state: PersistedState,
    state_loaded: bool,
    repositories: Arc<[WatchKey]>,
    poll_interval: Duration,
    tx: mpsc::Sender<NewRelease>,
}

impl<S: ReleaseSource> ReleaseMonitor<S> {
    /// Create a new release monitor.
    ///
    /// State is read from `store` on the first call to [`run`](Self::run)
    /// unless [`load_state`](Self::load_state) was called before.
    pub fn new(
        config: ReleaseMonitorConfig,
        source: S,
        store: StateStore,
        tx: mpsc::Sender<NewRelease>,
    ) -> Self {
        Self {
            source,
            store,
            state: PersistedState::new(),
            state_loaded: false,
            repositories: config.repositories.into(),
            poll_interval: config.poll_interval,
            tx,
        }
    }

    /// Current in-memory state.
    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    /// Watched repositories in query order.
    pub fn repositories(&self) -> &[WatchKey] {
        &self.repositories
    }

    /// Load persisted state, falling back to an empty state on failure.
    ///
    /// With an empty state every repository gets a fresh baseline, so a
    /// corrupt file costs at most one missed notification per repository.
    pub async fn load_state(&mut self) {
        match self.store.load().await {
            Ok(state) => {
                info!(
                    path = %self.store.path().display(),
                    repositories = state.len(),
                    "Loaded releases"
                );
                self.state = state;
            }
            Err(e) => {
                error!(error = %e, "Failed to load releases, starting with an empty state");
                self.state = PersistedState::new();
            }
        }
        self.state_loaded = true;
    }

    async fn persist(&self) {
        if let Err(e) = self.store.save(&self.state).await {
            error!(
                path = %self.store.path().display(),
                error = %e,
                "Failed to save releases"
            );
        }
    }

    /// Query every watched repository once, in configured order.
    ///
    /// A newer release is only recorded once the dispatcher has accepted it.
    /// A failing repository is logged and skipped. The cycle only stops early
    /// when `cancel` fires or the dispatcher has gone away; in both cases the
    /// release being handed over is not recorded as seen.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();
        let repositories = Arc::clone(&self.repositories);

        for key in repositories.iter() {
            if cancel.is_cancelled() {
                report.interrupted = Some(Interruption::Cancelled);
                break;
            }

            let next = match self
                .source
                .fetch_latest_release(key.owner(), key.name())
                .await
            {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(
                        owner = key.owner(),
                        name = key.name(),
                        transient = e.is_transient(),
                        error = %e,
                        "Failed to query the repository's releases"
                    );
                    report.failed += 1;
                    continue;
                }
            };
            report.checked += 1;

            info!(
                repo = %key,
                latest_release = %next.release.name,
                published_at = %next.release.published_at.to_rfc3339(),
                "Repository checked"
            );

            let state_key = key.key();
            let Some(current) = self.state.get(&state_key) else {
                debug!(
                    repo = %key,
                    version = %next.release.name,
                    published = next.release.is_published(),
                    "Recording baseline release"
                );
                self.state.insert(state_key, next);
                self.persist().await;
                report.baselined += 1;
                continue;
            };

            if !next.release.is_newer_than(&current.release) {
                debug!(
                    owner = key.owner(),
                    name = key.name(),
                    "No new release for repository"
                );
                report.unchanged += 1;
                continue;
            }

            info!(
                repo = %key,
                previous_version = %current.release.name,
                new_version = %next.release.name,
                "New release found"
            );

            let (release, mut accepted) = NewRelease::new(next.clone());
            let handed_over = tokio::select! {
                biased;

                _ = cancel.cancelled() => Err(Interruption::Cancelled),
                result = async {
                    self.tx
                        .send(release)
                        .await
                        .map_err(|_| Interruption::DispatcherClosed)?;
                    (&mut accepted)
                        .await
                        .map_err(|_| Interruption::DispatcherClosed)
                } => result,
            };
            // An acceptance that raced the cancellation still counts.
            let handed_over =
                handed_over.or_else(|reason| accepted.try_recv().map_err(|_| reason));
            if let Err(reason) = handed_over {
                report.interrupted = Some(reason);
                break;
            }

            self.state.insert(state_key, next);
            self.persist().await;
            report.emitted += 1;
        }

        report
    }

    /// Poll forever until `cancel` fires or the dispatcher goes away.
    pub async fn run(mut self, cancel: CancellationToken) {
        if !self.state_loaded {
            self.load_state().await;
        }

        info!(
            repositories = self.repositories.len(),
            interval = ?self.poll_interval,
            "Release monitor started"
        );

        loop {
            let report = self.run_cycle(&cancel).await;
            if let Some(reason) = report.interrupted {
                info!(reason = ?reason, "Release monitor stopping");
                break;
            }

            info!(
                checked = report.checked,
                baselined = report.baselined,
                emitted = report.emitted,
                unchanged = report.unchanged,
                failed = report.failed,
                "Release check cycle finished"
            );

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Release monitor shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        debug!("Release monitor stopped");
    }
}
