use egui::{Align2, Color32, Frame, Order, RichText, ScrollArea, Sense, Vec2};

use crate::api::envelope::{Announcement, CarouselSlide};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalAction {
    Close,
    /// Marks the announcement with this id as read.
    Acknowledge(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalButton {
    pub label: String,
    pub action: ModalAction,
    pub primary: bool,
}

impl ModalButton {
    pub fn new(label: impl Into<String>, action: ModalAction) -> Self {
        Self {
            label: label.into(),
            action,
            primary: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Modal {
    pub title: String,
    pub body: String,
    pub buttons: Vec<ModalButton>,
    pub close_on_backdrop: bool,
}

impl Modal {
    /// `html` is flattened to text; a single close button is added.
    pub fn new(title: impl Into<String>, html: &str) -> Self {
        Self {
            title: title.into(),
            body: html_to_text(html),
            buttons: vec![ModalButton::new("Close", ModalAction::Close).primary()],
            close_on_backdrop: true,
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<ModalButton>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.close_on_backdrop = false;
        self
    }

    pub fn announcement(announcement: &Announcement) -> Self {
        Self::new(&announcement.title, &announcement.content).with_buttons(vec![
            ModalButton::new("Got it", ModalAction::Acknowledge(announcement.id.clone())).primary(),
        ])
    }

    pub fn slide(slide: &CarouselSlide) -> Self {
        Self::new(&slide.title, &slide.content)
    }

    /// Draws the dialog above a dimmed backdrop and returns the chosen action.
    pub fn show(&self, ctx: &egui::Context) -> Option<ModalAction> {
        let mut action = None;

        let screen = ctx.screen_rect();
        egui::Area::new("modal_backdrop")
            .order(Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                let response = ui.allocate_rect(screen, Sense::click());
                ui.painter()
                    .rect_filled(screen, 0.0, Color32::from_black_alpha(160));
                if response.clicked() && self.close_on_backdrop {
                    action = Some(ModalAction::Close);
                }
            });

        egui::Area::new("modal")
            .order(Order::Tooltip)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                Frame::window(ui.style()).show(ui, |ui| {
                    ui.set_max_width(screen.width() * 0.6);
                    ui.heading(RichText::new(&self.title).strong());
                    ui.separator();
                    ScrollArea::vertical()
                        .max_height(screen.height() * 0.5)
                        .show(ui, |ui| ui.label(&self.body));
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        for button in &self.buttons {
                            let text = if button.primary {
                                RichText::new(&button.label).strong()
                            } else {
                                RichText::new(&button.label)
                            };
                            if ui.button(text).clicked() {
                                action = Some(button.action.clone());
                            }
                        }
                    });
                });
            });

        action
    }
}

/// Flattens the small HTML subset used by announcements and slides into plain text.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        push_text(&mut out, &rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            rest = "";
            break;
        };
        let tag = &rest[start + 1..start + end];
        apply_tag(&mut out, tag);
        rest = &rest[start + end + 1..];
    }
    push_text(&mut out, rest);

    let mut text = String::with_capacity(out.len());
    let mut blank = false;
    for line in out.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank = !text.is_empty();
            continue;
        }
        if !text.is_empty() {
            text.push('\n');
            if blank {
                text.push('\n');
            }
        }
        blank = false;
        text.push_str(line.trim_start());
    }
    text
}

fn apply_tag(out: &mut String, tag: &str) {
    let closing = tag.starts_with('/');
    let name: String = tag
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    match name.as_str() {
        "br" => out.push('\n'),
        "li" if !closing => out.push_str("\n• "),
        "p" | "div" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            out.push_str("\n\n")
        }
        _ => {}
    }
}

fn push_text(out: &mut String, text: &str) {
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    out.push_str(&text);
}
