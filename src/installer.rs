use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{self, MissedTickBehavior};

use crate::api::client::GameBackend;
use crate::api::envelope::{Enveloped, StageResponse};
use crate::progress::ProgressTracker;
use crate::state::Stage;
use crate::updater::{Notify, Phase, WorkflowEvent};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallKind {
    Clone,
    Update,
}

impl InstallKind {
    pub fn stage(self) -> Stage {
        match self {
            InstallKind::Clone => Stage::Clone,
            InstallKind::Update => Stage::Update,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            InstallKind::Clone => Phase::Cloning,
            InstallKind::Update => Phase::Updating,
        }
    }
}

/// Runs a clone or update and polls `/game/progress` until it returns.
pub struct Installer<'a, B> {
    backend: &'a B,
    poll_interval: Duration,
}

impl<'a, B: GameBackend> Installer<'a, B> {
    pub fn new(backend: &'a B, poll_interval: Duration) -> Self {
        Self {
            backend,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub async fn install<N: Notify + Sync>(&self, kind: InstallKind, notify: &N) -> StageResponse {
        tracing::info!(?kind, "installing game files");
        let response = match kind {
            InstallKind::Clone => self.track(kind, self.backend.clone_game(), notify).await,
            InstallKind::Update => self.track(kind, self.backend.update_game(), notify).await,
        };

        if response.is_ok() {
            tracing::info!(?kind, version = ?response.version, "install finished");
        } else {
            tracing::warn!(?kind, code = response.envelope.code().as_str(), "install failed");
        }
        response
    }

    /// Polls immediately, then every interval; stops once `request` resolves or
    /// a complete sample has been seen.
    async fn track<F, N>(&self, kind: InstallKind, request: F, notify: &N) -> StageResponse
    where
        F: Future<Output = StageResponse> + Send,
        N: Notify + Sync,
    {
        tokio::pin!(request);

        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tracker = ProgressTracker::default();

        loop {
            tokio::select! {
                biased;

                response = &mut request => return response,
                _ = ticker.tick(), if !tracker.is_complete() => {
                    // a slow progress call must not hide the request finishing
                    let sample = tokio::select! {
                        biased;

                        response = &mut request => return response,
                        sample = self.backend.progress() => sample,
                    };
                    let update = tracker.observe(&sample);
                    notify.notify(WorkflowEvent::Progress { kind, update });
                }
            }
        }
    }
}
