pub mod api;
pub mod config;
pub mod installer;
pub mod progress;
pub mod state;
pub mod static_data;
pub mod ui;
pub mod updater;

use anyhow::Context;
use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use api::client::GameClient;
use api::envelope::Enveloped;
use config::{Cli, Command, Configuration, StaticEndpoint};
use state::GameState;
use static_data::FunctionEvent;
use ui::Ui;
use updater::{LogNotifier, Updater};

fn main() -> anyhow::Result<()> {
    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "mc_launcher=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let config = cli.resolve()?;

    match cli.command_or_default() {
        Command::Gui => run_gui(config, cli.config_file),
        Command::Run => run_headless(config),
        Command::Static { endpoint, default } => print_static(endpoint, default),
    }
}

fn run_gui(config: Configuration, config_file: std::path::PathBuf) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(1280.0, 720.0)),
        centered: true,
        ..Default::default()
    };

    let rt = Runtime::new().context("unable to create the tokio runtime")?;
    let _enter = rt.enter();

    eframe::run_native(
        "Game Launcher",
        options,
        Box::new(|cc| Box::new(Ui::new(cc, config, config_file))),
    )
    .map_err(|err| anyhow::anyhow!("failed to open the launcher window: {err}"))
}

fn run_headless(config: Configuration) -> anyhow::Result<()> {
    let rt = Runtime::new().context("unable to create the tokio runtime")?;
    let client = GameClient::new(config.backend_url.clone(), config.token.clone());

    let report = rt.block_on(async {
        let init = client.init().await;
        if !init.is_ok() {
            tracing::warn!(message = %init.envelope.user_message(), "backend init failed");
        }
        let (_, report) = Updater::new(&client, config.poll_interval())
            .run(GameState::default(), &LogNotifier)
            .await;
        report
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_ok() {
        anyhow::bail!(
            "workflow failed{}",
            report
                .failed_stage
                .map(|stage| format!(" at {stage}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn print_static(endpoint: StaticEndpoint, default: bool) -> anyhow::Result<()> {
    let mut event = FunctionEvent::get();
    if default {
        event = event.with_query("default", "true");
    }
    let response = match endpoint {
        StaticEndpoint::Announcement => static_data::announcement(&event),
        StaticEndpoint::Carousel => static_data::carousel(&event),
        StaticEndpoint::Backgrounds => static_data::backgrounds(&event),
    };
    tracing::debug!(
        status = response.status_code,
        content_type = ?response.header("Content-Type"),
        "static response"
    );
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    Ok(())
}
