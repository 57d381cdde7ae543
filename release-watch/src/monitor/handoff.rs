//! Rendezvous between the monitor and the dispatcher.

use tokio::sync::oneshot;

use crate::domain::RepositorySnapshot;

/// A new release waiting for the dispatcher.
///
/// The monitor stays blocked until [`accept`](Self::accept) is called. Dropping
/// a `NewRelease` without accepting it leaves the release unrecorded.
#[derive(Debug)]
pub struct NewRelease {
    repository: RepositorySnapshot,
    accepted: oneshot::Sender<()>,
}

impl NewRelease {
    pub(crate) fn new(repository: RepositorySnapshot) -> (Self, oneshot::Receiver<()>) {
        let (accepted, rx) = oneshot::channel();
        (
            Self {
                repository,
                accepted,
            },
            rx,
        )
    }

    pub fn repository(&self) -> &RepositorySnapshot {
        &self.repository
    }

    /// Take the release and release the blocked monitor.
    pub fn accept(self) -> RepositorySnapshot {
        // The monitor may already have been cancelled.
        let _ = self.accepted.send(());
        self.repository
    }
}
