//! Configuration file handling

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Outbound request settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Chain execution settings
    #[serde(default)]
    pub run: RunConfig,
}

/// What the executor does when a `next` pointer leads back to a visited step
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RevisitPolicy {
    /// Log a loop warning and keep following `next` pointers
    #[default]
    Warn,
    /// Log a loop warning and end the run
    Stop,
}

/// Outbound request settings
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout; expiry counts as a transport failure
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent unless a step overrides it
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("reqchain/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Chain execution settings
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub on_revisit: RevisitPolicy,

    /// Report title used when `--title` is not given
    #[serde(default = "default_title")]
    pub default_title: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            on_revisit: RevisitPolicy::default(),
            default_title: default_title(),
        }
    }
}

fn default_title() -> String {
    "Summary".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
