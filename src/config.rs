use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_REFERER: &str = "http://localhost";
pub const DEFAULT_TITLE: &str = "Sidechat";
/// How long the "copied" badge stays on a message
pub const COPY_FEEDBACK_MS: u64 = 2000;

/// Main application configuration
///
/// Holds no credentials: the API key lives only in the running session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion endpoint the transcript is POSTed to
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Value of the `HTTP-Referer` identification header
    pub referer: String,

    /// Value of the `X-Title` identification header
    pub title: String,

    /// Request timeout; `None` leaves it to the HTTP client default
    pub request_timeout_secs: Option<u64>,

    /// Sidechat home directory (logs live here)
    #[serde(skip)]
    pub sidechat_home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            request_timeout_secs: None,
            sidechat_home: default_home(),
        }
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sidechat")
}

impl Config {
    /// Load `~/.sidechat/config.toml`, or an explicit path, falling back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let home = default_home();
        fs::create_dir_all(&home).context("Failed to create .sidechat directory")?;

        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| home.join("config.toml"));

        let mut config = Self::load_from(&config_path)?;
        config.sidechat_home = home;
        Ok(config)
    }

    /// Read a config file; a missing file yields the defaults
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, model: Option<String>, endpoint: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        self
    }

    /// Display window for the copy badge; fixed, not read from the file
    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(COPY_FEEDBACK_MS)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.sidechat_home.join("logs")
    }
}
