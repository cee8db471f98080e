use std::{
    fs::{File, OpenOptions},
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REMOTE_API_URL: &str = "http://localhost:8888";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Args, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Configuration {
    /// Local launcher backend.
    #[clap(long, env = "LAUNCHER_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,
    /// Static-data API serving announcements, slides and backgrounds.
    #[clap(long, env = "LAUNCHER_REMOTE_API_URL", default_value = DEFAULT_REMOTE_API_URL)]
    pub remote_api_url: String,
    #[clap(long, env = "LAUNCHER_TOKEN", default_value = "")]
    pub token: String,
    #[clap(long, env = "LAUNCHER_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            remote_api_url: DEFAULT_REMOTE_API_URL.to_owned(),
            token: String::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Configuration {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to open {}", path.display()))
            }
        };
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open {} for writing", path.display()))?;
        tracing::info!(path = %path.display(), "writing configuration");
        let json = serde_json::to_string_pretty(self)?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[clap(name = "mc-launcher", version, about = "Desktop launcher for the game backend")]
pub struct Cli {
    #[clap(flatten)]
    pub config: Configuration,
    /// Takes precedence over the flags above when it exists.
    #[clap(long, default_value = "config.json")]
    pub config_file: PathBuf,
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the launcher window.
    Gui,
    /// Check, install if needed and launch, then print the report as JSON.
    Run,
    /// Print a static-data handler response.
    Static {
        #[clap(value_enum)]
        endpoint: StaticEndpoint,
        /// Only the default background.
        #[clap(long)]
        default: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticEndpoint {
    Announcement,
    Carousel,
    Backgrounds,
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command.clone().unwrap_or(Command::Gui)
    }

    /// The config file when present, otherwise the flags.
    pub fn resolve(&self) -> anyhow::Result<Configuration> {
        match Configuration::load(&self.config_file)? {
            Some(config) => {
                tracing::debug!(path = %self.config_file.display(), "using config file");
                Ok(config)
            }
            None => Ok(self.config.clone()),
        }
    }
}
