use serde::Serialize;

use crate::api::envelope::CheckResponse;

/// What the launcher knows about the installed game.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    pub checked: bool,
    pub exists: bool,
    pub current_version: String,
    pub remote_version: String,
    /// Only meaningful while `exists` is true.
    pub needs_update: bool,
}

impl GameState {
    /// A failed check leaves the state untouched.
    pub fn with_check(mut self, check: &CheckResponse) -> Self {
        if !check.envelope.status.is_ok() {
            return self;
        }
        self.checked = true;
        self.exists = check.game_exists;
        self.needs_update = check.game_exists && check.needs_update;
        self.current_version = check.current_version.clone().unwrap_or_default();
        self.remote_version = check.remote_version.clone().unwrap_or_default();
        self
    }

    pub fn with_installed(mut self, version: Option<&str>) -> Self {
        self.exists = true;
        self.needs_update = false;
        if let Some(version) = version {
            self.current_version = version.to_owned();
        }
        self
    }

    pub fn next_stage(&self) -> Stage {
        if !self.checked {
            Stage::Check
        } else if !self.exists {
            Stage::Clone
        } else if self.needs_update {
            Stage::Update
        } else {
            Stage::Launch
        }
    }

    pub fn version_label(&self) -> &str {
        if self.exists && !self.current_version.is_empty() {
            &self.current_version
        } else {
            "Not installed"
        }
    }
}

/// One step of the workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Check,
    Clone,
    Update,
    Launch,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Check => "check",
            Stage::Clone => "clone",
            Stage::Update => "update",
            Stage::Launch => "launch",
        }
    }

    pub fn failure_title(self) -> &'static str {
        match self {
            Stage::Check => "Version check failed",
            Stage::Clone => "Download failed",
            Stage::Update => "Update failed",
            Stage::Launch => "Launch failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof that an operation holds the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationToken {
    id: u64,
    stage: Stage,
}

/// At most one operation may be in flight.
#[derive(Debug, Default)]
pub struct OperationSlot {
    current: Option<OperationToken>,
    issued: u64,
}

impl OperationSlot {
    /// `None` while another operation holds the slot.
    pub fn try_begin(&mut self, stage: Stage) -> Option<OperationToken> {
        if self.current.is_some() {
            tracing::debug!(?stage, "operation ignored, another one is in flight");
            return None;
        }
        self.issued += 1;
        let token = OperationToken {
            id: self.issued,
            stage,
        };
        self.current = Some(token);
        Some(token)
    }

    /// Releases the slot if `token` still holds it.
    pub fn finish(&mut self, token: OperationToken) -> bool {
        if self.current == Some(token) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn holds(&self, token: OperationToken) -> bool {
        self.current == Some(token)
    }

    pub fn in_flight(&self) -> Option<Stage> {
        self.current.map(|token| token.stage)
    }

}
