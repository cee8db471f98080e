use std::time::Duration;

use egui::Color32;

pub const EASE_DURATION: Duration = Duration::from_millis(800);
pub const CHECK_HIDE_AFTER: Duration = Duration::from_secs(2);
pub const SUCCESS_HIDE_AFTER: Duration = Duration::from_secs(3);
pub const ERROR_HIDE_AFTER: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Loading,
    Error,
    Warning,
    Success,
}

impl StatusKind {
    pub fn icon(self) -> &'static str {
        match self {
            StatusKind::Loading => "⏳",
            StatusKind::Error => "✖",
            StatusKind::Warning => "⚠",
            StatusKind::Success => "✔",
        }
    }

    pub fn color(self) -> Color32 {
        match self {
            StatusKind::Loading => Color32::from_rgb(96, 165, 250),
            StatusKind::Error => Color32::from_rgb(248, 113, 113),
            StatusKind::Warning => Color32::from_rgb(251, 191, 36),
            StatusKind::Success => Color32::from_rgb(74, 222, 128),
        }
    }
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Eases the bar from the value shown when the target changed to the new target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressAnimation {
    from: f32,
    to: f32,
    started: f64,
    duration: f64,
}

impl ProgressAnimation {
    pub fn new(value: f32, now: f64) -> Self {
        Self {
            from: value,
            to: value,
            started: now,
            duration: EASE_DURATION.as_secs_f64(),
        }
    }

    pub fn retarget(&mut self, to: f32, now: f64) {
        let to = to.clamp(0.0, 1.0);
        if to == self.to {
            return;
        }
        self.from = self.value_at(now);
        self.to = to;
        self.started = now;
    }

    pub fn value_at(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = ((now - self.started) / self.duration) as f32;
        self.from + (self.to - self.from) * ease_in_out_cubic(t)
    }

    pub fn is_running(&self, now: f64) -> bool {
        now - self.started < self.duration && self.from != self.to
    }
}

/// The toast in the corner of the window.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusIndicator {
    pub kind: StatusKind,
    pub title: String,
    pub message: String,
    progress: Option<ProgressAnimation>,
    visible: bool,
    hide_at: Option<f64>,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self {
            kind: StatusKind::Loading,
            title: String::new(),
            message: String::new(),
            progress: None,
            visible: false,
            hide_at: None,
        }
    }
}

impl StatusIndicator {
    /// Replaces the content and cancels any pending auto-hide.
    pub fn show(&mut self, kind: StatusKind, title: impl Into<String>, message: impl Into<String>) {
        self.kind = kind;
        self.title = title.into();
        self.message = message.into();
        self.visible = true;
        self.hide_at = None;
        if kind != StatusKind::Loading && kind != StatusKind::Warning {
            self.progress = None;
        }
    }

    pub fn set_progress(&mut self, percent: u8, now: f64) {
        let target = f32::from(percent.min(100)) / 100.0;
        match &mut self.progress {
            Some(animation) => animation.retarget(target, now),
            None => {
                let mut animation = ProgressAnimation::new(0.0, now);
                animation.retarget(target, now);
                self.progress = Some(animation);
            }
        }
    }

    pub fn clear_progress(&mut self) {
        self.progress = None;
    }

    pub fn hide_after(&mut self, delay: Duration, now: f64) {
        self.hide_at = Some(now + delay.as_secs_f64());
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.hide_at = None;
    }

    /// Applies a due auto-hide; returns whether the toast is still shown.
    pub fn tick(&mut self, now: f64) -> bool {
        if matches!(self.hide_at, Some(at) if now >= at) {
            self.hide();
        }
        self.visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn progress_at(&self, now: f64) -> Option<f32> {
        self.progress.map(|animation| animation.value_at(now))
    }

    /// Time until the next visual change, if any.
    pub fn next_change(&self, now: f64) -> Option<Duration> {
        if !self.visible {
            return None;
        }
        if self.progress.map_or(false, |animation| animation.is_running(now)) {
            return Some(Duration::from_millis(16));
        }
        self.hide_at
            .map(|at| Duration::from_secs_f64((at - now).max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_is_symmetric_and_bounded() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(0.5), 0.5);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert_eq!(ease_in_out_cubic(-1.0), 0.0);
        assert_eq!(ease_in_out_cubic(3.0), 1.0);
        assert!((ease_in_out_cubic(0.25) + ease_in_out_cubic(0.75) - 1.0).abs() < 1e-6);
        assert!(ease_in_out_cubic(0.25) < 0.25);
    }

    #[test]
    fn animation_reaches_target_after_the_ease() {
        let mut animation = ProgressAnimation::new(0.0, 10.0);
        animation.retarget(0.5, 10.0);

        assert_eq!(animation.value_at(10.0), 0.0);
        assert_eq!(animation.value_at(10.4), 0.25);
        assert_eq!(animation.value_at(10.8), 0.5);
        assert_eq!(animation.value_at(20.0), 0.5);
        assert!(!animation.is_running(11.0));
    }

    #[test]
    fn retarget_starts_from_the_shown_value() {
        let mut animation = ProgressAnimation::new(0.0, 0.0);
        animation.retarget(1.0, 0.0);
        animation.retarget(0.2, 0.4);

        assert_eq!(animation.value_at(0.4), 0.5);
        assert!((animation.value_at(1.2) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn toast_hides_itself_when_due() {
        let mut toast = StatusIndicator::default();
        toast.show(StatusKind::Success, "Done", "Game is up to date");
        toast.hide_after(CHECK_HIDE_AFTER, 1.0);

        assert!(toast.tick(2.9));
        assert_eq!(toast.next_change(2.5), Some(Duration::from_millis(500)));
        assert!(!toast.tick(3.0));
        assert_eq!(toast.next_change(3.0), None);
    }

    #[test]
    fn new_content_cancels_auto_hide() {
        let mut toast = StatusIndicator::default();
        toast.show(StatusKind::Error, "Failed", "offline");
        toast.hide_after(ERROR_HIDE_AFTER, 0.0);
        toast.show(StatusKind::Loading, "Checking", "");

        assert!(toast.tick(10.0));
    }

    #[test]
    fn progress_survives_warnings_but_not_results() {
        let mut toast = StatusIndicator::default();
        toast.show(StatusKind::Loading, "Downloading", "");
        toast.set_progress(40, 0.0);
        toast.show(StatusKind::Warning, "Downloading", "network may be slow");
        assert_eq!(toast.progress_at(1.0), Some(0.4));

        toast.show(StatusKind::Success, "Download complete", "");
        assert_eq!(toast.progress_at(1.0), None);
    }
}
