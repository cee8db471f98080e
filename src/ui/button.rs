use crate::state::{GameState, Stage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    Normal,
    Loading,
    Disabled,
}

/// How the last finished stage went.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeeded(Stage),
    Failed(Stage),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchButton {
    pub state: ButtonState,
    pub icon: &'static str,
    pub label: &'static str,
}

impl LaunchButton {
    const fn new(state: ButtonState, icon: &'static str, label: &'static str) -> Self {
        Self { state, icon, label }
    }

    pub fn resolve(game: &GameState, in_flight: Option<Stage>, last: Option<Outcome>) -> Self {
        use ButtonState::*;

        match in_flight {
            Some(Stage::Check) => return Self::new(Disabled, "⏳", "Checking..."),
            Some(Stage::Clone) => return Self::new(Loading, "⬇", "Downloading..."),
            Some(Stage::Update) => return Self::new(Loading, "⟳", "Updating..."),
            Some(Stage::Launch) => return Self::new(Loading, "🚀", "Launching..."),
            None => {}
        }

        match last {
            Some(Outcome::Failed(Stage::Check)) => return Self::new(Normal, "↻", "Retry check"),
            Some(Outcome::Failed(Stage::Clone)) => return Self::new(Normal, "↻", "Retry download"),
            Some(Outcome::Failed(Stage::Update)) => return Self::new(Normal, "↻", "Retry update"),
            Some(Outcome::Failed(Stage::Launch)) => return Self::new(Normal, "↻", "Retry launch"),
            _ => {}
        }

        if !game.checked {
            Self::new(Disabled, "⏳", "Checking...")
        } else if !game.exists {
            Self::new(Normal, "⬇", "Download game")
        } else if game.needs_update {
            Self::new(Normal, "⟳", "Update game")
        } else if last == Some(Outcome::Succeeded(Stage::Launch)) {
            Self::new(Normal, "✔", "Launched")
        } else {
            Self::new(Normal, "▶", "Play")
        }
    }

    pub fn is_clickable(&self) -> bool {
        self.state == ButtonState::Normal
    }

    pub fn text(&self) -> String {
        format!("{} {}", self.icon, self.label)
    }
}
