//! Dispatch loop draining the hand-off channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::channels::{ChannelConfig, NotificationChannel, release_label};
use super::stability::is_nonstable;
use crate::domain::RepositorySnapshot;
use crate::monitor::NewRelease;

/// Result of dispatching one release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Dropped by the non-stable filter.
    SkippedNonstable,
    /// Sent to every enabled channel; `failed` deliveries were dropped.
    Delivered { sent: usize, failed: usize },
}

/// Forwards new releases to the notification channels.
pub struct Dispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    ignore_nonstable: bool,
}

impl Dispatcher {
    pub fn new(ignore_nonstable: bool) -> Self {
        Self {
            channels: Vec::new(),
            ignore_nonstable,
        }
    }

    /// Build a dispatcher from channel configs, skipping disabled ones.
    pub fn from_configs(configs: &[ChannelConfig], ignore_nonstable: bool) -> Self {
        let mut dispatcher = Self::new(ignore_nonstable);
        for config in configs.iter().filter(|c| c.is_enabled()) {
            debug!(channel = config.channel_type(), "Adding notification channel");
            dispatcher.add_channel(config.build());
        }
        dispatcher
    }

    pub fn add_channel(&mut self, channel: Arc<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver one release. Failures are logged and not retried.
    pub async fn dispatch(&self, repository: &RepositorySnapshot) -> DispatchOutcome {
        let version = release_label(repository);

        if self.ignore_nonstable && is_nonstable(&repository.release.name) {
            debug!(
                repo = %repository.full_name(),
                version,
                "Not notifying about non-stable version"
            );
            return DispatchOutcome::SkippedNonstable;
        }

        if self.channels.is_empty() {
            info!(
                repo = %repository.full_name(),
                version,
                url = %repository.release.url,
                "New release (no notification channels configured)"
            );
        }

        let mut sent = 0;
        let mut failed = 0;
        for channel in self.channels.iter().filter(|c| c.is_enabled()) {
            match channel.send(repository).await {
                Ok(()) => {
                    sent += 1;
                    info!(
                        channel = channel.channel_type(),
                        repo = %repository.full_name(),
                        version,
                        description = %repository.release.description,
                        url = %repository.release.url,
                        "Notification sent"
                    );
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        channel = channel.channel_type(),
                        repo = %repository.full_name(),
                        error = %e,
                        "Failed to send release notification"
                    );
                }
            }
        }

        DispatchOutcome::Delivered { sent, failed }
    }

    /// Drain `rx` until it closes or `cancel` fires.
    ///
    /// Each release is accepted on receipt, which lets the monitor record it.
    /// Releases still queued at cancellation are dropped unaccepted and will
    /// be detected again after restart.
    pub async fn run(self, mut rx: mpsc::Receiver<NewRelease>, cancel: CancellationToken) {
        info!(channels = self.channels.len(), "Waiting for new releases");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("Dispatcher shutting down");
                    break;
                }
                received = rx.recv() => match received {
                    Some(release) => {
                        let repository = release.accept();
                        self.dispatch(&repository).await;
                    }
                    None => {
                        debug!("Release channel closed");
                        break;
                    }
                },
            }
        }
        debug!("Dispatcher stopped");
    }
}
