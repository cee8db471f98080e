use crate::api::envelope::{Enveloped, ProgressResponse};

/// Displayed while a 100% reading cannot be trusted yet.
pub const INITIAL_FLOOR: u8 = 5;
/// Polls during which a 100% reading without the completion flag is treated as noise.
pub const SUSPECT_POLLS: u32 = 3;
pub const STALL_THRESHOLD: u32 = 5;
/// Upper bound for the estimated progress shown when polling fails.
pub const FALLBACK_CEILING: u8 = 95;
pub const FINISHING_FROM: f64 = 99.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressSample {
    /// Raw reading in `0.0..=100.0`.
    pub percentage: f64,
    pub stage: String,
    pub speed: f64,
    pub eta: String,
    pub is_complete: bool,
    pub total_objects: u64,
    pub received_objects: u64,
    pub indexed_objects: u64,
}

impl From<&ProgressResponse> for ProgressSample {
    fn from(response: &ProgressResponse) -> Self {
        let percentage = if response.percentage.is_finite() {
            response.percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            percentage,
            stage: response.stage.clone(),
            speed: response.speed,
            eta: response.eta.clone(),
            is_complete: response.is_complete,
            total_objects: response.total_objects,
            received_objects: response.received_objects,
            indexed_objects: response.indexed_objects,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressNote {
    Normal,
    /// The displayed value has not moved for a while.
    Stalled,
    /// 99% or more but the backend has not flagged completion.
    Finishing,
    /// The poll failed; the value is an estimate.
    Estimated,
    Complete,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    pub display: u8,
    pub message: String,
    pub note: ProgressNote,
}

/// Smooths the backend's progress readings for display.
#[derive(Clone, Debug, Default)]
pub struct ProgressTracker {
    last_display: u8,
    unchanged: u32,
    polls: u32,
    complete: bool,
}

impl ProgressTracker {
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn observe(&mut self, response: &ProgressResponse) -> ProgressUpdate {
        if !response.is_ok() {
            return self.estimate();
        }
        self.sample(&ProgressSample::from(response))
    }

    pub fn sample(&mut self, sample: &ProgressSample) -> ProgressUpdate {
        let complete = sample.percentage >= 100.0 && sample.is_complete;
        let suspicious = sample.percentage == 100.0
            && (sample.total_objects == 0 || (self.polls < SUSPECT_POLLS && !sample.is_complete));

        let shown = if complete {
            100
        } else if suspicious {
            INITIAL_FLOOR
        } else if sample.percentage < 100.0 {
            // never round an unfinished reading up to 100
            (sample.percentage.round() as u8).min(99)
        } else {
            100
        };

        if shown == self.last_display {
            self.unchanged += 1;
        } else {
            self.unchanged = 0;
            self.last_display = shown;
        }
        self.polls += 1;

        let stalled = self.unchanged >= STALL_THRESHOLD && shown > 0 && shown < 100;

        let (note, message) = if complete {
            self.complete = true;
            (ProgressNote::Complete, describe(shown, sample))
        } else if !suspicious && sample.percentage >= FINISHING_FROM {
            (
                ProgressNote::Finishing,
                format!("Reached {shown}%, finishing up..."),
            )
        } else if stalled {
            (
                ProgressNote::Stalled,
                format!(
                    "Progress: {shown}%, stage: {}, the network may be slow...",
                    sample.stage
                ),
            )
        } else {
            (ProgressNote::Normal, describe(shown, sample))
        };

        tracing::debug!(
            raw = sample.percentage,
            shown,
            total = sample.total_objects,
            received = sample.received_objects,
            indexed = sample.indexed_objects,
            is_complete = sample.is_complete,
            "progress sample"
        );

        ProgressUpdate {
            display: shown,
            message,
            note,
        }
    }

    fn estimate(&mut self) -> ProgressUpdate {
        self.last_display = self.last_display.saturating_add(1).min(FALLBACK_CEILING);
        self.polls += 1;
        ProgressUpdate {
            display: self.last_display,
            message: "Working, exact progress unavailable...".to_owned(),
            note: ProgressNote::Estimated,
        }
    }
}

fn describe(shown: u8, sample: &ProgressSample) -> String {
    let mut message = format!("Progress: {shown}%");
    if !sample.stage.is_empty() {
        message.push_str(&format!(", stage: {}", sample.stage));
    }
    if sample.speed > 0.0 {
        message.push_str(&format!(", speed: {} KB/s", sample.speed));
    }
    if !sample.eta.is_empty() {
        message.push_str(&format!(", remaining: {}", sample.eta));
    }
    if sample.total_objects > 0 {
        message.push_str(&format!(
            ", objects: {}/{}",
            sample.received_objects, sample.total_objects
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::envelope::{Envelope, ErrorCode};

    fn reading(percentage: f64, total_objects: u64, is_complete: bool) -> ProgressResponse {
        ProgressResponse {
            envelope: Envelope::ok(),
            percentage,
            total_objects,
            received_objects: total_objects,
            is_complete,
            ..Default::default()
        }
    }

    fn failed() -> ProgressResponse {
        ProgressResponse::from_envelope(Envelope::failure(ErrorCode::Network, "down"))
    }

    #[test]
    fn early_full_reading_is_floored() {
        let mut tracker = ProgressTracker::default();
        let shown: Vec<u8> = [
            reading(100.0, 0, false),
            reading(40.0, 500, false),
            reading(100.0, 500, true),
        ]
        .iter()
        .map(|sample| tracker.observe(sample).display)
        .collect();

        assert_eq!(shown, vec![5, 40, 100]);
        assert!(tracker.is_complete());
    }

    #[test]
    fn floored_reading_reads_as_normal_progress() {
        let mut tracker = ProgressTracker::default();
        let update = tracker.observe(&reading(100.0, 0, false));

        assert_eq!(update.display, INITIAL_FLOOR);
        assert_eq!(update.note, ProgressNote::Normal);
        assert_eq!(update.message, "Progress: 5%");
    }

    #[test]
    fn near_full_reading_is_not_rounded_into_the_floor_or_to_100() {
        let mut tracker = ProgressTracker::default();
        let update = tracker.observe(&reading(99.6, 0, false));
        assert_eq!(update.display, 99);
        assert_eq!(update.note, ProgressNote::Finishing);
        assert_eq!(update.message, "Reached 99%, finishing up...");

        for _ in 0..SUSPECT_POLLS {
            tracker.observe(&reading(99.6, 500, false));
        }
        let update = tracker.observe(&reading(99.6, 500, false));
        assert_eq!(update.display, 99);
        assert!(!tracker.is_complete());
    }

    #[test]
    fn full_reading_without_flag_never_completes() {
        let mut tracker = ProgressTracker::default();
        for _ in 0..10 {
            let update = tracker.observe(&reading(100.0, 500, false));
            assert_ne!(update.note, ProgressNote::Complete);
        }
        assert!(!tracker.is_complete());
    }

    #[test]
    fn full_reading_after_suspect_window_is_displayed_but_not_complete() {
        let mut tracker = ProgressTracker::default();
        for _ in 0..SUSPECT_POLLS {
            assert_eq!(tracker.observe(&reading(100.0, 500, false)).display, INITIAL_FLOOR);
        }
        let update = tracker.observe(&reading(100.0, 500, false));
        assert_eq!(update.display, 100);
        assert_eq!(update.note, ProgressNote::Finishing);
        assert!(!tracker.is_complete());
    }

    #[test]
    fn zero_objects_keeps_full_reading_floored() {
        let mut tracker = ProgressTracker::default();
        for _ in 0..6 {
            assert_eq!(tracker.observe(&reading(100.0, 0, false)).display, INITIAL_FLOOR);
        }
    }

    #[test]
    fn repeated_value_is_reported_as_stalled_without_completing() {
        let mut tracker = ProgressTracker::default();
        let mut notes = Vec::new();
        for _ in 0..7 {
            notes.push(tracker.observe(&reading(30.0, 100, false)).note);
        }
        // first reading is a change from zero, the next five are unchanged
        assert_eq!(&notes[..5], &[ProgressNote::Normal; 5]);
        assert_eq!(notes[5], ProgressNote::Stalled);
        assert_eq!(notes[6], ProgressNote::Stalled);

        let update = tracker.observe(&reading(31.0, 100, false));
        assert_eq!(update.note, ProgressNote::Normal);
    }

    #[test]
    fn zero_progress_is_never_stalled() {
        let mut tracker = ProgressTracker::default();
        for _ in 0..10 {
            assert_eq!(tracker.observe(&reading(0.0, 0, false)).note, ProgressNote::Normal);
        }
    }

    #[test]
    fn failed_polls_creep_up_to_the_ceiling() {
        let mut tracker = ProgressTracker::default();
        tracker.observe(&reading(93.0, 100, false));

        let estimates: Vec<u8> = (0..4).map(|_| tracker.observe(&failed()).display).collect();
        assert_eq!(estimates, vec![94, 95, 95, 95]);
        assert_eq!(tracker.observe(&failed()).note, ProgressNote::Estimated);
    }

    #[test]
    fn message_lists_known_details() {
        let mut tracker = ProgressTracker::default();
        let update = tracker.observe(&ProgressResponse {
            envelope: Envelope::ok(),
            percentage: 42.4,
            stage: "Receiving objects".into(),
            speed: 120.0,
            eta: "00:30".into(),
            total_objects: 500,
            received_objects: 210,
            ..Default::default()
        });
        assert_eq!(update.display, 42);
        assert_eq!(
            update.message,
            "Progress: 42%, stage: Receiving objects, speed: 120 KB/s, remaining: 00:30, objects: 210/500"
        );
    }
}
