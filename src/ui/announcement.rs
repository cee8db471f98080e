use std::collections::HashSet;

use crate::api::envelope::{Announcement, AnnouncementResponse};

use super::modal::Modal;

pub const PLACEHOLDER_ID: &str = "placeholder";

pub fn placeholder() -> Announcement {
    Announcement {
        id: PLACEHOLDER_ID.to_owned(),
        title: "Announcements".to_owned(),
        content: "<p>Announcements could not be loaded right now.</p>\
                  <p>Check your connection and reopen the launcher.</p>"
            .to_owned(),
        ..Default::default()
    }
}

/// The latest announcement and which ones were read this session.
#[derive(Clone, Debug, Default)]
pub struct AnnouncementBoard {
    current: Option<Announcement>,
    seen: HashSet<String>,
    startup_shown: bool,
}

impl AnnouncementBoard {
    /// A failed or empty response leaves the placeholder in place.
    pub fn load(&mut self, response: AnnouncementResponse) {
        let announcement = match response.announcement {
            Some(announcement) if response.envelope.status.is_ok() => announcement,
            _ => {
                tracing::warn!(
                    message = %response.envelope.user_message(),
                    "announcement unavailable"
                );
                placeholder()
            }
        };
        self.current = Some(announcement);
    }

    pub fn current(&self) -> Option<&Announcement> {
        self.current.as_ref()
    }

    pub fn has_new(&self) -> bool {
        self.current
            .as_ref()
            .map_or(false, |a| a.id != PLACEHOLDER_ID && !self.seen.contains(&a.id))
    }

    pub fn acknowledge(&mut self, id: &str) {
        self.seen.insert(id.to_owned());
    }

    /// The startup dialog, at most once per session.
    pub fn take_startup_modal(&mut self) -> Option<Modal> {
        if self.startup_shown {
            return None;
        }
        let announcement = self.current.as_ref()?;
        if !announcement.show_on_startup || !self.has_new() {
            return None;
        }
        self.startup_shown = true;
        Some(Modal::announcement(announcement).persistent())
    }
}
