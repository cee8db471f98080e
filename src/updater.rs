use std::sync::mpsc::Sender;
use std::time::Duration;

use serde::Serialize;

use crate::api::client::GameBackend;
use crate::api::envelope::{CheckResponse, Envelope, Enveloped, Status, StageResponse};
use crate::installer::{InstallKind, Installer};
use crate::progress::ProgressUpdate;
use crate::state::{GameState, Stage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Checking,
    Cloning,
    Updating,
    Launching,
    Done,
    Failed,
}

/// A finished stage together with what the backend answered.
#[derive(Clone, Debug, PartialEq)]
pub enum StageReport {
    Check(CheckResponse),
    Clone(StageResponse),
    Update(StageResponse),
    Launch(StageResponse),
}

impl StageReport {
    pub fn stage(&self) -> Stage {
        match self {
            StageReport::Check(_) => Stage::Check,
            StageReport::Clone(_) => Stage::Clone,
            StageReport::Update(_) => Stage::Update,
            StageReport::Launch(_) => Stage::Launch,
        }
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            StageReport::Check(check) => &check.envelope,
            StageReport::Clone(response)
            | StageReport::Update(response)
            | StageReport::Launch(response) => &response.envelope,
        }
    }

    fn install(kind: InstallKind, response: StageResponse) -> Self {
        match kind {
            InstallKind::Clone => StageReport::Clone(response),
            InstallKind::Update => StageReport::Update(response),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowEvent {
    Phase(Phase),
    Stage(StageReport),
    Progress {
        kind: InstallKind,
        update: ProgressUpdate,
    },
}

/// Receives workflow events as they happen.
pub trait Notify {
    fn notify(&self, event: WorkflowEvent);
}

impl Notify for Sender<WorkflowEvent> {
    fn notify(&self, event: WorkflowEvent) {
        if self.send(event).is_err() {
            tracing::debug!("workflow event dropped, receiver is gone");
        }
    }
}

/// Writes events to the log; used when there is no window.
pub struct LogNotifier;

impl Notify for LogNotifier {
    fn notify(&self, event: WorkflowEvent) {
        match event {
            WorkflowEvent::Phase(phase) => tracing::info!(?phase, "workflow phase"),
            WorkflowEvent::Stage(report) => tracing::info!(
                stage = %report.stage(),
                status = ?report.envelope().status,
                "stage finished"
            ),
            WorkflowEvent::Progress { kind, update } => {
                tracing::info!(?kind, percent = update.display, "{}", update.message)
            }
        }
    }
}

/// Every stage result seen during one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WorkflowTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone: Option<StageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<StageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch: Option<StageResponse>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReport {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    pub details: WorkflowTrace,
}

impl WorkflowReport {
    fn aborted(stage: Stage, envelope: &Envelope, details: WorkflowTrace) -> Self {
        Self {
            status: Status::Error,
            message: Some(format!("{}: {}", stage.failure_title(), envelope.user_message())),
            error_code: Some(envelope.code().as_str().to_owned()),
            failed_stage: Some(stage),
            details,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

/// Drives check → clone/update → launch against a backend.
pub struct Updater<'a, B> {
    backend: &'a B,
    poll_interval: Duration,
}

impl<'a, B: GameBackend> Updater<'a, B> {
    pub fn new(backend: &'a B, poll_interval: Duration) -> Self {
        Self {
            backend,
            poll_interval,
        }
    }

    pub async fn check<N: Notify + Sync>(
        &self,
        state: GameState,
        notify: &N,
    ) -> (GameState, CheckResponse) {
        notify.notify(WorkflowEvent::Phase(Phase::Checking));
        let check = self.backend.check().await;

        if check.is_ok() {
            tracing::info!(
                exists = check.game_exists,
                needs_update = check.needs_update,
                current = ?check.current_version,
                remote = ?check.remote_version,
                path = ?check.game_path,
                "game version checked"
            );
        } else {
            tracing::warn!(code = check.envelope.code().as_str(), "version check failed");
        }

        notify.notify(WorkflowEvent::Stage(StageReport::Check(check.clone())));
        (state.with_check(&check), check)
    }

    pub async fn install<N: Notify + Sync>(
        &self,
        kind: InstallKind,
        state: GameState,
        notify: &N,
    ) -> (GameState, StageResponse) {
        notify.notify(WorkflowEvent::Phase(kind.phase()));
        let response = Installer::new(self.backend, self.poll_interval)
            .install(kind, notify)
            .await;

        notify.notify(WorkflowEvent::Stage(StageReport::install(kind, response.clone())));
        let state = if response.is_ok() {
            state.with_installed(response.version.as_deref())
        } else {
            state
        };
        (state, response)
    }

    pub async fn launch<N: Notify + Sync>(&self, notify: &N) -> StageResponse {
        notify.notify(WorkflowEvent::Phase(Phase::Launching));
        let response = self.backend.launch().await;

        if response.is_ok() {
            tracing::info!(launcher = ?response.launcher_path, "game launched");
        } else {
            tracing::warn!(code = response.envelope.code().as_str(), "launch failed");
        }

        notify.notify(WorkflowEvent::Stage(StageReport::Launch(response.clone())));
        response
    }

    /// Runs the whole chain and returns exactly one report.
    pub async fn run<N: Notify + Sync>(
        &self,
        state: GameState,
        notify: &N,
    ) -> (GameState, WorkflowReport) {
        let (state, report) = self.run_stages(state, notify).await;
        let phase = if report.is_ok() {
            Phase::Done
        } else {
            Phase::Failed
        };
        notify.notify(WorkflowEvent::Phase(phase));
        (state, report)
    }

    async fn run_stages<N: Notify + Sync>(
        &self,
        state: GameState,
        notify: &N,
    ) -> (GameState, WorkflowReport) {
        let mut trace = WorkflowTrace::default();

        let (state, check) = self.check(state, notify).await;
        trace.check = Some(check.clone());
        if !check.is_ok() {
            return (
                state,
                WorkflowReport::aborted(Stage::Check, &check.envelope, trace),
            );
        }

        let install = if !check.game_exists {
            Some(InstallKind::Clone)
        } else if check.needs_update {
            Some(InstallKind::Update)
        } else {
            None
        };

        let state = match install {
            Some(kind) => {
                let (state, response) = self.install(kind, state, notify).await;
                let failed = !response.is_ok();
                let envelope = response.envelope.clone();
                match kind {
                    InstallKind::Clone => trace.clone = Some(response),
                    InstallKind::Update => trace.update = Some(response),
                }
                if failed {
                    return (
                        state,
                        WorkflowReport::aborted(kind.stage(), &envelope, trace),
                    );
                }
                state
            }
            None => state,
        };

        let launch = self.launch(notify).await;
        let report = WorkflowReport {
            status: launch.envelope.status,
            message: launch.envelope.message.clone(),
            error_code: launch.envelope.error_code.clone(),
            failed_stage: (!launch.is_ok()).then_some(Stage::Launch),
            details: WorkflowTrace {
                launch: Some(launch),
                ..trace
            },
        };
        (state, report)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::api::client::GameBackend;
    use crate::api::envelope::{CheckResponse, Envelope, ProgressResponse, StageResponse};

    pub fn progress(percentage: f64, total_objects: u64, is_complete: bool) -> ProgressResponse {
        ProgressResponse {
            envelope: Envelope::ok(),
            percentage,
            total_objects,
            received_objects: total_objects,
            is_complete,
            ..Default::default()
        }
    }

    pub fn ok_stage(version: Option<&str>) -> StageResponse {
        StageResponse {
            envelope: Envelope::ok(),
            version: version.map(str::to_owned),
            launcher_path: None,
        }
    }

    /// Backend answering from fixed responses and recording which calls were made.
    pub struct ScriptedBackend {
        pub check: CheckResponse,
        pub clone: StageResponse,
        pub update: StageResponse,
        pub launch: StageResponse,
        clone_delay: Duration,
        update_delay: Duration,
        progress_delay: Duration,
        progress: Mutex<Vec<ProgressResponse>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Default for ScriptedBackend {
        fn default() -> Self {
            Self {
                check: CheckResponse {
                    envelope: Envelope::ok(),
                    game_exists: true,
                    current_version: Some("1.0.0".into()),
                    remote_version: Some("1.0.0".into()),
                    ..Default::default()
                },
                clone: ok_stage(Some("1.0.0")),
                update: ok_stage(Some("1.0.0")),
                launch: ok_stage(None),
                clone_delay: Duration::ZERO,
                update_delay: Duration::ZERO,
                progress_delay: Duration::ZERO,
                progress: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ScriptedBackend {
        pub fn with_check(mut self, check: CheckResponse) -> Self {
            self.check = check;
            self
        }

        pub fn clone_returns(mut self, response: StageResponse) -> Self {
            self.clone = response;
            self
        }

        pub fn update_returns(mut self, response: StageResponse) -> Self {
            self.update = response;
            self
        }

        pub fn launch_returns(mut self, response: StageResponse) -> Self {
            self.launch = response;
            self
        }

        pub fn clone_after(mut self, delay: Duration) -> Self {
            self.clone_delay = delay;
            self
        }

        pub fn update_after(mut self, delay: Duration) -> Self {
            self.update_delay = delay;
            self
        }

        pub fn progress_after(mut self, delay: Duration) -> Self {
            self.progress_delay = delay;
            self
        }

        /// Served in order; the last sample repeats once the list runs out.
        pub fn with_progress(self, samples: Vec<ProgressResponse>) -> Self {
            let mut samples = samples;
            samples.reverse();
            *self.progress.lock().unwrap() = samples;
            self
        }

        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl GameBackend for ScriptedBackend {
        fn check(&self) -> impl Future<Output = CheckResponse> + Send {
            self.record("check");
            let response = self.check.clone();
            async move { response }
        }

        fn clone_game(&self) -> impl Future<Output = StageResponse> + Send {
            self.record("clone");
            let (response, delay) = (self.clone.clone(), self.clone_delay);
            async move {
                tokio::time::sleep(delay).await;
                response
            }
        }

        fn update_game(&self) -> impl Future<Output = StageResponse> + Send {
            self.record("update");
            let (response, delay) = (self.update.clone(), self.update_delay);
            async move {
                tokio::time::sleep(delay).await;
                response
            }
        }

        fn launch(&self) -> impl Future<Output = StageResponse> + Send {
            self.record("launch");
            let response = self.launch.clone();
            async move { response }
        }

        fn progress(&self) -> impl Future<Output = ProgressResponse> + Send {
            self.record("progress");
            let mut samples = self.progress.lock().unwrap();
            let response = if samples.len() > 1 {
                samples.pop().unwrap_or_default()
            } else {
                samples.last().cloned().unwrap_or_else(|| progress(0.0, 0, false))
            };
            let delay = self.progress_delay;
            async move {
                tokio::time::sleep(delay).await;
                response
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::testing::{ok_stage, ScriptedBackend};
    use super::*;
    use crate::api::envelope::ErrorCode;

    const POLL: Duration = Duration::from_secs(1);

    fn check(game_exists: bool, needs_update: bool) -> CheckResponse {
        CheckResponse {
            envelope: Envelope::ok(),
            game_exists,
            needs_update,
            current_version: game_exists.then(|| "1.0.0".to_owned()),
            remote_version: Some("1.2.0".into()),
            ..Default::default()
        }
    }

    fn failed(code: ErrorCode) -> Envelope {
        Envelope::failure(code, code.message())
    }

    fn stages(events: &[WorkflowEvent]) -> Vec<Stage> {
        events
            .iter()
            .filter_map(|event| match event {
                WorkflowEvent::Stage(report) => Some(report.stage()),
                _ => None,
            })
            .collect()
    }

    fn phases(events: &[WorkflowEvent]) -> Vec<Phase> {
        events
            .iter()
            .filter_map(|event| match event {
                WorkflowEvent::Phase(phase) => Some(*phase),
                _ => None,
            })
            .collect()
    }

    async fn run(backend: &ScriptedBackend) -> (GameState, WorkflowReport, Vec<WorkflowEvent>) {
        let (tx, rx) = mpsc::channel();
        let (state, report) = Updater::new(backend, POLL)
            .run(GameState::default(), &tx)
            .await;
        (state, report, rx.try_iter().collect())
    }

    #[tokio::test(start_paused = true)]
    async fn missing_game_is_cloned_then_launched() {
        let backend = ScriptedBackend::default()
            .with_check(check(false, false))
            .clone_returns(ok_stage(Some("1.2.0")));

        let (state, report, events) = run(&backend).await;

        assert!(report.is_ok());
        assert_eq!(report.failed_stage, None);
        assert!(report.details.check.is_some());
        assert_eq!(report.details.clone.as_ref().unwrap().version.as_deref(), Some("1.2.0"));
        assert!(report.details.update.is_none());
        assert!(report.details.launch.is_some());
        assert!(!backend.calls().contains(&"update"));

        assert_eq!(stages(&events), vec![Stage::Check, Stage::Clone, Stage::Launch]);
        assert_eq!(
            phases(&events),
            vec![Phase::Checking, Phase::Cloning, Phase::Launching, Phase::Done]
        );
        assert!(state.exists);
        assert_eq!(state.current_version, "1.2.0");
    }

    #[tokio::test(start_paused = true)]
    async fn flagged_update_runs_update_not_clone() {
        let backend = ScriptedBackend::default()
            .with_check(check(true, true))
            .update_returns(ok_stage(Some("1.2.0")));

        let (state, report, _) = run(&backend).await;

        assert!(report.is_ok());
        assert!(report.details.update.is_some());
        assert!(report.details.clone.is_none());
        assert!(!backend.calls().contains(&"clone"));
        assert!(!state.needs_update);
    }

    #[tokio::test(start_paused = true)]
    async fn current_game_launches_directly() {
        let backend = ScriptedBackend::default().with_check(check(true, false));

        let (_, report, events) = run(&backend).await;

        assert!(report.is_ok());
        assert_eq!(backend.calls(), vec!["check", "launch"]);
        assert_eq!(stages(&events), vec![Stage::Check, Stage::Launch]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_check_stops_the_chain() {
        let backend = ScriptedBackend::default().with_check(CheckResponse::from_envelope(
            failed(ErrorCode::VersionParse),
        ));

        let (state, report, events) = run(&backend).await;

        assert_eq!(report.status, Status::Error);
        assert_eq!(report.failed_stage, Some(Stage::Check));
        assert_eq!(report.error_code.as_deref(), Some("VERSION_PARSE_ERROR"));
        assert_eq!(backend.calls(), vec!["check"]);
        assert_eq!(phases(&events).last(), Some(&Phase::Failed));
        assert!(!state.checked);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_clone_skips_launch() {
        let backend = ScriptedBackend::default()
            .with_check(check(false, false))
            .clone_returns(StageResponse::from_envelope(failed(ErrorCode::DiskFull)));

        let (state, report, _) = run(&backend).await;

        assert_eq!(report.failed_stage, Some(Stage::Clone));
        assert_eq!(report.error_code.as_deref(), Some("DISK_FULL"));
        assert!(report.details.clone.is_some());
        assert!(report.details.launch.is_none());
        assert!(!backend.calls().contains(&"launch"));
        assert!(!state.exists);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_launch_is_reported_with_full_trace() {
        let backend = ScriptedBackend::default()
            .with_check(check(true, true))
            .launch_returns(StageResponse::from_envelope(failed(ErrorCode::LauncherNotFound)));

        let (_, report, events) = run(&backend).await;

        assert_eq!(report.status, Status::Error);
        assert_eq!(report.failed_stage, Some(Stage::Launch));
        assert!(report.details.update.is_some());
        assert!(report.details.launch.is_some());
        assert_eq!(phases(&events).last(), Some(&Phase::Failed));
    }

    #[tokio::test(start_paused = true)]
    async fn exactly_one_terminal_phase_per_run() {
        for backend in [
            ScriptedBackend::default().with_check(check(false, false)),
            ScriptedBackend::default().with_check(check(true, true)),
            ScriptedBackend::default()
                .with_check(CheckResponse::from_envelope(failed(ErrorCode::Network))),
        ] {
            let (_, _, events) = run(&backend).await;
            let terminal = phases(&events)
                .into_iter()
                .filter(|phase| matches!(phase, Phase::Done | Phase::Failed))
                .count();
            assert_eq!(terminal, 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn report_serializes_stage_details() {
        let backend = ScriptedBackend::default()
            .with_check(check(false, false))
            .clone_returns(ok_stage(Some("1.2.0")));

        let (_, report, _) = run(&backend).await;
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["details"]["check"]["gameExists"], false);
        assert_eq!(json["details"]["clone"]["version"], "1.2.0");
        assert_eq!(json["details"]["launch"]["status"], "ok");
        assert!(json["details"].get("update").is_none());
    }
}
