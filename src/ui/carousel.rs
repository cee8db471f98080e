use std::time::Duration;

use crate::api::envelope::{CarouselSlide, SlideKind};

use super::modal::Modal;

pub const AUTO_ADVANCE: Duration = Duration::from_secs(5);

/// What clicking the current slide does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlideAction {
    Dialog(Modal),
    Link(String),
}

/// Slide rotation; times are egui seconds.
#[derive(Clone, Debug, Default)]
pub struct Carousel {
    slides: Vec<CarouselSlide>,
    current: usize,
    last_switch: f64,
}

impl Carousel {
    pub fn new(slides: Vec<CarouselSlide>, now: f64) -> Self {
        Self {
            slides,
            current: 0,
            last_switch: now,
        }
    }

    pub fn set_slides(&mut self, slides: Vec<CarouselSlide>, now: f64) {
        *self = Self::new(slides, now);
    }

    pub fn slides(&self) -> &[CarouselSlide] {
        &self.slides
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&CarouselSlide> {
        self.slides.get(self.current)
    }

    pub fn next(&mut self, now: f64) {
        if !self.slides.is_empty() {
            self.go_to((self.current + 1) % self.slides.len(), now);
        }
    }

    pub fn prev(&mut self, now: f64) {
        if !self.slides.is_empty() {
            let len = self.slides.len();
            self.go_to((self.current + len - 1) % len, now);
        }
    }

    /// Out of range indices are ignored; the auto-advance timer restarts either way.
    pub fn go_to(&mut self, index: usize, now: f64) {
        if index < self.slides.len() {
            self.current = index;
        }
        self.last_switch = now;
    }

    /// Advances when the current slide has been shown long enough.
    pub fn tick(&mut self, now: f64) -> bool {
        if self.slides.len() < 2 || now - self.last_switch < AUTO_ADVANCE.as_secs_f64() {
            return false;
        }
        self.next(now);
        true
    }

    pub fn until_advance(&self, now: f64) -> Option<Duration> {
        if self.slides.len() < 2 {
            return None;
        }
        let left = AUTO_ADVANCE.as_secs_f64() - (now - self.last_switch);
        Some(Duration::from_secs_f64(left.max(0.0)))
    }

    pub fn activate(&self) -> Option<SlideAction> {
        let slide = self.current()?;
        Some(match slide.kind {
            SlideKind::Dialog => SlideAction::Dialog(Modal::slide(slide)),
            SlideKind::Link => SlideAction::Link(slide.content.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_data;

    fn carousel() -> Carousel {
        Carousel::new(static_data::carousel_slides(), 0.0)
    }

    #[test]
    fn next_and_prev_wrap_around() {
        let mut carousel = carousel();
        carousel.prev(1.0);
        assert_eq!(carousel.index(), 4);
        carousel.next(2.0);
        assert_eq!(carousel.index(), 0);
    }

    #[test]
    fn auto_advance_after_five_seconds() {
        let mut carousel = carousel();
        assert!(!carousel.tick(4.9));
        assert!(carousel.tick(5.0));
        assert_eq!(carousel.index(), 1);
        assert_eq!(carousel.until_advance(6.0), Some(Duration::from_secs(4)));
    }

    #[test]
    fn manual_navigation_resets_the_timer() {
        let mut carousel = carousel();
        carousel.go_to(3, 4.0);
        assert!(!carousel.tick(8.0));
        assert!(carousel.tick(9.0));
        assert_eq!(carousel.index(), 4);
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut carousel = carousel();
        carousel.go_to(42, 1.0);
        assert_eq!(carousel.index(), 0);
    }

    #[test]
    fn empty_carousel_does_nothing() {
        let mut carousel = Carousel::new(Vec::new(), 0.0);
        carousel.next(1.0);
        carousel.prev(1.0);
        assert!(!carousel.tick(100.0));
        assert!(carousel.current().is_none());
        assert!(carousel.activate().is_none());
        assert_eq!(carousel.until_advance(0.0), None);
    }

    #[test]
    fn slide_kind_decides_the_action() {
        let mut carousel = carousel();
        match carousel.activate() {
            Some(SlideAction::Dialog(modal)) => assert_eq!(modal.title, "Explore endless worlds"),
            other => panic!("unexpected action {other:?}"),
        }

        carousel.go_to(2, 0.0);
        assert_eq!(
            carousel.activate(),
            Some(SlideAction::Link("https://minecraft.net/realms".into()))
        );
    }
}
