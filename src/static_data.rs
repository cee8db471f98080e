//! Fixed JSON payloads for the remote static-data API.
//!
//! Each handler mirrors one serverless function: it answers `OPTIONS` preflights,
//! is CORS-open, and otherwise returns its embedded catalog.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::{json, Value};

use crate::api::envelope::{Announcement, Background, CarouselSlide, SlideKind};

const HERO_IMAGE: &str = "https://objectstorageapi.bja.sealos.run/g6rnmc1y-mymy/hero-bg.jpg";

lazy_static! {
    /// Newest first.
    static ref ANNOUNCEMENTS: Vec<Announcement> = vec![
        Announcement {
            id: "announcement-005".into(),
            title: "Announcement refresh test".into(),
            content: "<p class='mb-3'>Test</p>".into(),
            show_on_startup: false,
            created_at: "2025-04-12T08:00:00Z".into(),
        },
        Announcement {
            id: "announcement-003".into(),
            title: "Server update".into(),
            content: "<p class='mb-3'>Dear players, the server has been updated to the latest version!</p>\
                      <p class='mb-3'>This update includes:</p>\
                      <ul class='list-disc pl-5 mb-3'><li>Performance improvements</li>\
                      <li>Five new creatures</li><li>Fixes for known bugs</li>\
                      <li>A new winter-themed map</li></ul><p>Updated: April 10, 2025</p>"
                .into(),
            show_on_startup: false,
            created_at: "2025-04-10T08:00:00Z".into(),
        },
        Announcement {
            id: "announcement-002".into(),
            title: "Welcome to the launcher".into(),
            content: "<p class='mb-3'>Welcome to the launcher!</p>\
                      <p class='mb-3'>Main features:</p>\
                      <ul class='list-disc pl-5 mb-3'><li>Automatic update checks</li>\
                      <li>One-click launch</li><li>A clean interface</li></ul>\
                      <p>If you run into problems, join the community group for help.</p>"
                .into(),
            show_on_startup: false,
            created_at: "2025-04-05T12:00:00Z".into(),
        },
    ];

    static ref SLIDES: Vec<CarouselSlide> = vec![
        slide(
            "slide-001",
            "Explore endless worlds",
            "Try the new terrain generation and exploration",
            SlideKind::Dialog,
            "<h3>Explore endless worlds</h3><p>The latest version introduces a new terrain \
             generation algorithm with more spectacular and varied worlds.</p>\
             <p>The new exploration system lets you mark places, record treasure and share \
             your adventures with friends.</p>",
        ),
        slide(
            "slide-002",
            "New biomes",
            "Discover mysterious creatures and hidden treasure",
            SlideKind::Dialog,
            "<h3>New biomes</h3><p>Explore new biomes and meet creatures you have never seen. \
             Every biome has its own vegetation, terrain and weather.</p>",
        ),
        slide(
            "slide-003",
            "Multiplayer",
            "Build your ideal kingdom with friends",
            SlideKind::Link,
            "https://minecraft.net/realms",
        ),
        slide(
            "slide-004",
            "Special event",
            "Join the spring building contest",
            SlideKind::Dialog,
            "<h3>Spring building contest</h3><p>Show your creativity in the spring-themed \
             building contest! This round's theme is nature meets technology.</p>\
             <p>Submission deadline: May 15, 2023</p><p>Great prizes await!</p>",
        ),
        slide(
            "slide-005",
            "Special event",
            "Join the spring building contest",
            SlideKind::Link,
            "https://minecraft.net/community",
        ),
    ];

    static ref BACKGROUNDS: Vec<Background> = vec![
        background("bg-001", "Classic", "hero-bg.jpg", true),
        background("bg-002", "Winter", "winter-bg.jpg", false),
        background("bg-003", "Spring", "spring-bg.jpg", false),
        background("bg-004", "Summer", "summer-bg.jpg", false),
    ];
}

fn slide(id: &str, title: &str, description: &str, kind: SlideKind, content: &str) -> CarouselSlide {
    CarouselSlide {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        image_url: HERO_IMAGE.into(),
        kind,
        content: content.into(),
    }
}

fn background(id: &str, name: &str, file: &str, is_default: bool) -> Background {
    Background {
        id: id.into(),
        name: name.into(),
        image_url: format!("https://objectstorageapi.bja.sealos.run/g6rnmc1y-mymy/{file}"),
        is_default,
    }
}

pub fn carousel_slides() -> Vec<CarouselSlide> {
    SLIDES.clone()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionEvent {
    pub http_method: String,
    pub query: HashMap<String, String>,
}

impl FunctionEvent {
    pub fn get() -> Self {
        Self {
            http_method: "GET".into(),
            query: HashMap::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    fn is_preflight(&self) -> bool {
        self.http_method.eq_ignore_ascii_case("OPTIONS")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Value,
}

impl FunctionResponse {
    fn json(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            headers: vec![
                ("Access-Control-Allow-Origin", "*"),
                ("Access-Control-Allow-Headers", "Content-Type"),
                ("Content-Type", "application/json"),
            ],
            body,
        }
    }

    fn preflight() -> Self {
        Self::json(200, json!({ "message": "CORS preflight request successful" }))
    }

    pub fn header(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

/// Latest announcement, flattened into the envelope.
pub fn announcement(event: &FunctionEvent) -> FunctionResponse {
    if event.is_preflight() {
        return FunctionResponse::preflight();
    }

    match ANNOUNCEMENTS.first() {
        Some(latest) => FunctionResponse::json(
            200,
            json!({
                "status": "ok",
                "id": latest.id,
                "title": latest.title,
                "content": latest.content,
                "show_on_startup": latest.show_on_startup,
                "created_at": latest.created_at,
            }),
        ),
        None => FunctionResponse::json(
            404,
            json!({ "status": "error", "message": "No announcement available" }),
        ),
    }
}

pub fn carousel(event: &FunctionEvent) -> FunctionResponse {
    if event.is_preflight() {
        return FunctionResponse::preflight();
    }

    FunctionResponse::json(200, json!({ "status": "ok", "slides": *SLIDES }))
}

/// `?default=true` returns the default background (or the first one) on its own.
pub fn backgrounds(event: &FunctionEvent) -> FunctionResponse {
    if event.is_preflight() {
        return FunctionResponse::preflight();
    }

    let default_only = event.query.get("default").map(String::as_str) == Some("true");
    if default_only {
        let background = BACKGROUNDS
            .iter()
            .find(|background| background.is_default)
            .or_else(|| BACKGROUNDS.first());
        return FunctionResponse::json(200, json!({ "status": "ok", "background": background }));
    }

    FunctionResponse::json(200, json!({ "status": "ok", "backgrounds": *BACKGROUNDS }))
}
