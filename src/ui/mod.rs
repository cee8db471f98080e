pub mod announcement;
pub mod button;
pub mod carousel;
pub mod modal;
pub mod navigation;
pub mod toast;

use std::{
    future::Future,
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender},
    time::Duration,
};

use egui::{
    menu, Align, Align2, Color32, FontFamily, FontId, Layout, Order, ProgressBar, RichText, Style,
    TextStyle,
};
use native_dialog::{MessageDialog, MessageType};

use crate::{
    api::{
        client::GameClient,
        envelope::{
            AnnouncementResponse, Background, BackgroundsResponse, BasicResponse, CarouselSlide,
            Enveloped, SlideKind, StageResponse,
        },
        remote::RemoteApi,
    },
    config::Configuration,
    installer::InstallKind,
    progress::ProgressNote,
    state::{GameState, OperationSlot, OperationToken, Stage},
    static_data,
    updater::{Notify, Phase, StageReport, Updater, WorkflowEvent},
};

use announcement::AnnouncementBoard;
use button::{ButtonState, LaunchButton, Outcome};
use carousel::{Carousel, SlideAction};
use modal::{html_to_text, Modal, ModalAction};
use navigation::{Navigation, Page};
use toast::{StatusIndicator, StatusKind, CHECK_HIDE_AFTER, ERROR_HIDE_AFTER, SUCCESS_HIDE_AFTER};

const AUTO_CHECK_DELAY: f64 = 0.8;
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

enum UiMessage {
    Workflow(OperationToken, WorkflowEvent),
    Finished(OperationToken, GameState),
    Initialized(BasicResponse),
    Announcement(AnnouncementResponse),
    Slides(Vec<CarouselSlide>),
    Background(BackgroundsResponse),
    UrlOpened(BasicResponse),
    Minimized(BasicResponse),
    CloseWindow,
}

/// Forwards workflow events of one operation to the window.
struct UiNotifier {
    tx: Sender<UiMessage>,
    ctx: egui::Context,
    token: OperationToken,
}

impl UiNotifier {
    fn send(&self, message: UiMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("window is gone, dropping message");
            return;
        }
        self.ctx.request_repaint();
    }
}

impl Notify for UiNotifier {
    fn notify(&self, event: WorkflowEvent) {
        self.send(UiMessage::Workflow(self.token, event));
    }
}

pub struct Ui {
    name: String,
    config: Configuration,
    config_file: PathBuf,
    draft: Configuration,
    client: GameClient,
    remote: RemoteApi,

    game: GameState,
    slot: OperationSlot,
    phase: Phase,
    last_outcome: Option<Outcome>,
    auto_check_at: Option<f64>,

    nav: Navigation,
    toast: StatusIndicator,
    modal: Option<Modal>,
    carousel: Carousel,
    board: AnnouncementBoard,
    background: Option<Background>,

    tx: Sender<UiMessage>,
    rx: Receiver<UiMessage>,
}

impl Ui {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Configuration, config_file: PathBuf) -> Self {
        cc.egui_ctx.set_style(style());

        let client = GameClient::new(config.backend_url.clone(), config.token.clone());
        let remote = RemoteApi::new(config.remote_api_url.clone(), client.clone());
        let (tx, rx) = mpsc::channel();
        let now = cc.egui_ctx.input(|i| i.time);

        let ui = Self {
            name: current_user(),
            draft: config.clone(),
            config,
            config_file,
            client,
            remote,
            game: GameState::default(),
            slot: OperationSlot::default(),
            phase: Phase::Idle,
            last_outcome: None,
            auto_check_at: Some(now + AUTO_CHECK_DELAY),
            nav: Navigation::default(),
            toast: StatusIndicator::default(),
            modal: None,
            carousel: Carousel::new(static_data::carousel_slides(), now),
            board: AnnouncementBoard::default(),
            background: None,
            tx,
            rx,
        };
        ui.startup(&cc.egui_ctx);
        ui
    }

    fn startup(&self, ctx: &egui::Context) {
        let client = self.client.clone();
        self.spawn(ctx, async move { UiMessage::Initialized(client.init().await) });

        let remote = self.remote.clone();
        self.spawn(ctx, async move { UiMessage::Announcement(remote.announcement().await) });

        let remote = self.remote.clone();
        self.spawn(ctx, async move { UiMessage::Slides(remote.carousel().await) });

        let remote = self.remote.clone();
        self.spawn(ctx, async move { UiMessage::Background(remote.backgrounds(true).await) });
    }

    fn spawn<F>(&self, ctx: &egui::Context, task: F)
    where
        F: Future<Output = UiMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if tx.send(task.await).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    /// Runs whatever the game state asks for next; ignored while busy.
    fn start_next_stage(&mut self, ctx: &egui::Context) {
        let stage = self.game.next_stage();
        let Some(token) = self.slot.try_begin(stage) else {
            return;
        };
        tracing::info!(%stage, "starting operation");

        let notifier = UiNotifier {
            tx: self.tx.clone(),
            ctx: ctx.clone(),
            token,
        };
        let client = self.client.clone();
        let state = self.game.clone();
        let poll_interval = self.config.poll_interval();

        tokio::spawn(async move {
            let updater = Updater::new(&client, poll_interval);
            let state = match stage {
                Stage::Check => updater.check(state, &notifier).await.0,
                Stage::Clone => updater.install(InstallKind::Clone, state, &notifier).await.0,
                Stage::Update => updater.install(InstallKind::Update, state, &notifier).await.0,
                Stage::Launch => {
                    updater.launch(&notifier).await;
                    state
                }
            };
            notifier.send(UiMessage::Finished(notifier.token, state));
        });
    }

    fn handle(&mut self, message: UiMessage, frame: &mut eframe::Frame, now: f64) {
        match message {
            UiMessage::Workflow(token, event) => {
                if self.slot.holds(token) {
                    self.on_workflow(event, now);
                }
            }
            UiMessage::Finished(token, state) => {
                if self.slot.finish(token) {
                    self.game = state;
                    self.phase = Phase::Idle;
                }
            }
            UiMessage::Initialized(response) => {
                if !response.is_ok() {
                    tracing::warn!(message = %response.envelope.user_message(), "backend init failed");
                }
            }
            UiMessage::Announcement(response) => self.board.load(response),
            UiMessage::Slides(slides) => self.carousel.set_slides(slides, now),
            UiMessage::Background(response) => {
                if response.is_ok() {
                    self.background = response.background;
                }
            }
            UiMessage::UrlOpened(response) => {
                if !response.is_ok() {
                    self.toast.show(
                        StatusKind::Error,
                        "Could not open link",
                        response.envelope.user_message(),
                    );
                    self.toast.hide_after(ERROR_HIDE_AFTER, now);
                }
            }
            UiMessage::Minimized(response) => {
                if !response.is_ok() {
                    tracing::warn!(message = %response.envelope.user_message(), "minimize failed");
                }
            }
            UiMessage::CloseWindow => frame.close(),
        }
    }

    fn on_workflow(&mut self, event: WorkflowEvent, now: f64) {
        match event {
            WorkflowEvent::Phase(phase) => self.on_phase(phase),
            WorkflowEvent::Stage(report) => self.on_stage(&report, now),
            WorkflowEvent::Progress { kind, update } => {
                let status = match update.note {
                    ProgressNote::Stalled | ProgressNote::Estimated => StatusKind::Warning,
                    _ => StatusKind::Loading,
                };
                let title = match kind {
                    InstallKind::Clone => "Downloading game",
                    InstallKind::Update => "Updating game",
                };
                self.toast.show(status, title, update.message);
                self.toast.set_progress(update.display, now);
            }
        }
    }

    fn on_phase(&mut self, phase: Phase) {
        self.phase = phase;
        match phase {
            Phase::Checking => {
                self.toast.clear_progress();
                self.toast
                    .show(StatusKind::Loading, "Checking for updates", "Contacting the launcher backend...");
            }
            Phase::Cloning => {
                self.toast.clear_progress();
                self.toast
                    .show(StatusKind::Loading, "Downloading game", "Preparing download...");
            }
            Phase::Updating => {
                self.toast.clear_progress();
                self.toast
                    .show(StatusKind::Loading, "Updating game", "Preparing update...");
            }
            Phase::Launching => {
                self.toast.clear_progress();
                self.toast
                    .show(StatusKind::Loading, "Launching game", "Starting the launcher...");
            }
            Phase::Idle | Phase::Done | Phase::Failed => {}
        }
    }

    fn on_stage(&mut self, report: &StageReport, now: f64) {
        let stage = report.stage();
        let envelope = report.envelope();

        if !envelope.status.is_ok() {
            self.last_outcome = Some(Outcome::Failed(stage));
            self.toast
                .show(StatusKind::Error, stage.failure_title(), envelope.user_message());
            self.toast.hide_after(ERROR_HIDE_AFTER, now);
            return;
        }
        self.last_outcome = Some(Outcome::Succeeded(stage));

        let installed = |response: &StageResponse| match &response.version {
            Some(version) => format!("Version {version} is ready"),
            None => "The game is ready".to_owned(),
        };
        let (status, title, message, hide_after) = match report {
            StageReport::Check(check) if !check.game_exists => (
                StatusKind::Warning,
                "Game not installed",
                "Click Download game to install it".to_owned(),
                CHECK_HIDE_AFTER,
            ),
            StageReport::Check(check) if check.needs_update => (
                StatusKind::Warning,
                "Update available",
                format!(
                    "{} → {}",
                    check.current_version.as_deref().unwrap_or("?"),
                    check.remote_version.as_deref().unwrap_or("?")
                ),
                CHECK_HIDE_AFTER,
            ),
            StageReport::Check(check) => (
                StatusKind::Success,
                "Game is up to date",
                format!("Version {}", check.current_version.as_deref().unwrap_or("?")),
                CHECK_HIDE_AFTER,
            ),
            StageReport::Clone(response) => (
                StatusKind::Success,
                "Download complete",
                installed(response),
                SUCCESS_HIDE_AFTER,
            ),
            StageReport::Update(response) => (
                StatusKind::Success,
                "Update complete",
                installed(response),
                SUCCESS_HIDE_AFTER,
            ),
            StageReport::Launch(_) => (
                StatusKind::Success,
                "Game launched",
                "Have fun!".to_owned(),
                SUCCESS_HIDE_AFTER,
            ),
        };
        self.toast.show(status, title, message);
        self.toast.hide_after(hide_after, now);
    }

    fn open_url(&self, ctx: &egui::Context, url: String) {
        tracing::info!(%url, "opening link");
        let client = self.client.clone();
        self.spawn(ctx, async move { UiMessage::UrlOpened(client.open_url(&url).await) });
    }

    fn minimize(&self, ctx: &egui::Context) {
        let client = self.client.clone();
        self.spawn(ctx, async move { UiMessage::Minimized(client.minimize_window().await) });
    }

    /// Tells the backend first; the window closes even if it does not answer.
    fn close(&self, ctx: &egui::Context) {
        let client = self.client.clone();
        self.spawn(ctx, async move {
            match tokio::time::timeout(CLOSE_TIMEOUT, client.close_window()).await {
                Ok(response) if !response.is_ok() => {
                    tracing::warn!(message = %response.envelope.user_message(), "close request failed")
                }
                Ok(_) => {}
                Err(_) => tracing::warn!("backend did not answer the close request"),
            }
            UiMessage::CloseWindow
        });
    }

    fn on_modal_action(&mut self, action: ModalAction) {
        if let ModalAction::Acknowledge(id) = &action {
            self.board.acknowledge(id);
        }
        self.modal = None;
    }

    fn save_settings(&mut self, now: f64) {
        match self.draft.write(&self.config_file) {
            Ok(()) => {
                self.config = self.draft.clone();
                self.client = GameClient::new(self.config.backend_url.clone(), self.config.token.clone());
                self.remote = RemoteApi::new(self.config.remote_api_url.clone(), self.client.clone());
                self.toast
                    .show(StatusKind::Success, "Settings saved", self.config_file.display().to_string());
                self.toast.hide_after(SUCCESS_HIDE_AFTER, now);
            }
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "failed to save settings");
                self.toast
                    .show(StatusKind::Error, "Could not save settings", format!("{err:#}"));
                self.toast.hide_after(ERROR_HIDE_AFTER, now);
            }
        }
    }

    fn title_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("title_bar").show(ctx, |ui| {
            menu::bar(ui, |ui| {
                if ui.button("About").clicked() {
                    let text = format!("Game launcher {}", env!("CARGO_PKG_VERSION"));
                    if let Err(err) = MessageDialog::new()
                        .set_type(MessageType::Info)
                        .set_title("About")
                        .set_text(&text)
                        .show_alert()
                    {
                        tracing::warn!(error = %err, "could not show the about dialog");
                    }
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("✕").clicked() {
                        self.close(ctx);
                    }
                    if ui.button("_").clicked() {
                        self.minimize(ctx);
                    }
                });
            });
        });
    }

    fn sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("navigation")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(20.0);
                for page in Page::ALL {
                    let mut text = RichText::new(page.label());
                    if page == Page::News && self.board.has_new() {
                        text = RichText::new(format!("{} ●", page.label())).color(Color32::from_rgb(248, 113, 113));
                    }
                    if ui.selectable_label(self.nav.is_active(page), text).clicked() {
                        self.nav.select(page);
                    }
                    ui.add_space(10.0);
                }
            });
    }

    fn bottom_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                let button = LaunchButton::resolve(&self.game, self.slot.in_flight(), self.last_outcome);
                let widget = egui::Button::new(RichText::new(button.text()).size(28.0));
                if ui.add_enabled(button.is_clickable(), widget).clicked() {
                    self.start_next_stage(ctx);
                }
                if button.state == ButtonState::Loading || self.phase == Phase::Checking {
                    ui.add(egui::Spinner::new());
                }

                ui.add_space(30.0);
                ui.label(format!("Version: {}", self.game.version_label()));
                if self.game.needs_update && !self.game.remote_version.is_empty() {
                    ui.label(format!("(latest {})", self.game.remote_version));
                }
                if let Some(background) = &self.background {
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.weak(format!("Theme: {}", background.name));
                    });
                }
            });
            ui.add_space(5.0);
        });
    }

    fn home(&mut self, ui: &mut egui::Ui, now: f64) {
        ui.heading(format!("Hello there {}, ready to play?", self.name));
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(10.0);

        let Some(slide) = self.carousel.current().cloned() else {
            ui.label("No news right now.");
            return;
        };
        let count = self.carousel.slides().len();
        let index = self.carousel.index();

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_height(180.0);
            ui.heading(&slide.title);
            ui.label(&slide.description);
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("◀").clicked() {
                    self.carousel.prev(now);
                }
                for i in 0..count {
                    let dot = if i == index { "●" } else { "○" };
                    if ui.selectable_label(i == index, dot).clicked() {
                        self.carousel.go_to(i, now);
                    }
                }
                if ui.button("▶").clicked() {
                    self.carousel.next(now);
                }
                ui.add_space(20.0);
                let open = match slide.kind {
                    SlideKind::Dialog => "Read more",
                    SlideKind::Link => "Open link",
                };
                if ui.button(open).clicked() {
                    match self.carousel.activate() {
                        Some(SlideAction::Dialog(modal)) => self.modal = Some(modal),
                        Some(SlideAction::Link(url)) => self.open_url(ui.ctx(), url),
                        None => {}
                    }
                }
            });
        });
    }

    fn news(&mut self, ui: &mut egui::Ui) {
        ui.heading("News");
        ui.separator();

        let Some(announcement) = self.board.current().cloned() else {
            ui.spinner();
            return;
        };
        ui.label(RichText::new(&announcement.title).strong().size(22.0));
        if !announcement.created_at.is_empty() {
            ui.weak(&announcement.created_at);
        }
        ui.add_space(10.0);
        egui::ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
            ui.label(html_to_text(&announcement.content));
        });
        if self.board.has_new() && ui.button("Mark as read").clicked() {
            self.board.acknowledge(&announcement.id);
        }
    }

    fn settings(&mut self, ui: &mut egui::Ui, now: f64) {
        ui.heading("Settings");
        ui.separator();

        egui::Grid::new("settings")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label("Backend URL");
                ui.text_edit_singleline(&mut self.draft.backend_url);
                ui.end_row();

                ui.label("Remote API URL");
                ui.text_edit_singleline(&mut self.draft.remote_api_url);
                ui.end_row();

                ui.label("Token");
                ui.add(egui::TextEdit::singleline(&mut self.draft.token).password(true));
                ui.end_row();

                ui.label("Progress poll interval");
                ui.add(
                    egui::DragValue::new(&mut self.draft.poll_interval_ms)
                        .clamp_range(50..=10_000)
                        .suffix(" ms"),
                );
                ui.end_row();
            });

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            let changed = self.draft != self.config;
            if ui.add_enabled(changed, egui::Button::new("Save")).clicked() {
                self.save_settings(now);
            }
            if ui.add_enabled(changed, egui::Button::new("Revert")).clicked() {
                self.draft = self.config.clone();
            }
        });
        ui.add_space(5.0);
        ui.weak(format!("Saved to {}", self.config_file.display()));
    }

    fn show_toast(&mut self, ctx: &egui::Context, now: f64) {
        if !self.toast.is_visible() {
            return;
        }
        egui::Area::new("status_toast")
            .order(Order::Foreground)
            .anchor(Align2::RIGHT_BOTTOM, [-16.0, -80.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(360.0);
                    ui.horizontal(|ui| {
                        let kind = self.toast.kind;
                        ui.label(RichText::new(kind.icon()).color(kind.color()));
                        ui.label(RichText::new(&self.toast.title).strong());
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui.small_button("✕").clicked() {
                                self.toast.hide();
                            }
                        });
                    });
                    if !self.toast.message.is_empty() {
                        ui.label(&self.toast.message);
                    }
                    if let Some(progress) = self.toast.progress_at(now) {
                        ui.add(ProgressBar::new(progress).show_percentage());
                    }
                });
            });
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: f64) {
        let auto_check = self
            .auto_check_at
            .map(|at| Duration::from_secs_f64((at - now).max(0.0)));
        let next = [auto_check, self.carousel.until_advance(now), self.toast.next_change(now)]
            .into_iter()
            .flatten()
            .min();
        if let Some(next) = next {
            ctx.request_repaint_after(next);
        }
    }
}

impl eframe::App for Ui {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);

        while let Ok(message) = self.rx.try_recv() {
            self.handle(message, frame, now);
        }
        if matches!(self.auto_check_at, Some(at) if now >= at) {
            self.auto_check_at = None;
            self.start_next_stage(ctx);
        }
        self.carousel.tick(now);
        self.toast.tick(now);
        if self.modal.is_none() {
            self.modal = self.board.take_startup_modal();
        }

        self.title_bar(ctx);
        self.sidebar(ctx);
        self.bottom_panel(ctx);
        egui::CentralPanel::default().show(ctx, |ui| match self.nav.current() {
            Page::Home => self.home(ui, now),
            Page::News => self.news(ui),
            Page::Settings => self.settings(ui, now),
        });
        self.show_toast(ctx, now);

        let action = self.modal.as_ref().and_then(|modal| modal.show(ctx));
        if let Some(action) = action {
            self.on_modal_action(action);
        }

        self.schedule_repaint(ctx, now);
    }
}

fn style() -> Style {
    let mut style = Style::default();
    style.visuals.override_text_color = Some(Color32::WHITE);

    style.text_styles = [
        (TextStyle::Small, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(16.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(26.0, FontFamily::Proportional)),
    ]
    .into();
    style
}

#[cfg(windows)]
fn current_user() -> String {
    use windows::Win32::System::WindowsProgramming::GetUserNameA;

    let mut user = [0u8; 256];
    let mut user_len = user.len() as u32;
    // SAFETY: the buffer outlives the call and its length is passed alongside it.
    let found = unsafe {
        GetUserNameA(
            windows::core::PSTR::from_raw(user.as_mut_ptr()),
            &mut user_len,
        )
    };
    if !found.as_bool() {
        return "player".to_owned();
    }
    // the reported length includes the terminating nul
    let len = (user_len as usize).saturating_sub(1).min(user.len());
    String::from_utf8_lossy(&user[..len]).into_owned()
}

#[cfg(not(windows))]
fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "player".to_owned())
}
