#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Page {
    #[default]
    Home,
    News,
    Settings,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Home, Page::News, Page::Settings];

    pub fn label(self) -> &'static str {
        match self {
            Page::Home => "🏠 Home",
            Page::News => "📰 News",
            Page::Settings => "⚙ Settings",
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Navigation {
    current: Page,
}

impl Navigation {
    pub fn current(&self) -> Page {
        self.current
    }

    pub fn is_active(&self, page: Page) -> bool {
        self.current == page
    }

    /// Returns whether the page changed.
    pub fn select(&mut self, page: Page) -> bool {
        if self.current == page {
            return false;
        }
        tracing::debug!(?page, "navigating");
        self.current = page;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_home_and_switches_once() {
        let mut nav = Navigation::default();
        assert!(nav.is_active(Page::Home));

        assert!(nav.select(Page::Settings));
        assert!(!nav.select(Page::Settings));
        assert_eq!(nav.current(), Page::Settings);
        assert!(!nav.is_active(Page::Home));
    }
}
