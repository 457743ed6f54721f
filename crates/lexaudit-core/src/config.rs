//! Client configuration: defaults, `~/.lexaudit/config.toml`, then environment.
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?} (invalid TOML): {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub poll_interval_secs: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl ClientConfig {
    /// Load `~/.lexaudit/config.toml` (if present) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_file(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Config file path: `~/.lexaudit/config.toml`.
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lexaudit/config.toml")
    }

    /// Read a config file, falling back to defaults when it does not exist.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `LEXAUDIT_*` overrides using the given variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LEXAUDIT_API_URL") {
            self.api.base_url = url;
        }
        if let Some(secs) = lookup("LEXAUDIT_POLL_INTERVAL_SECS") {
            self.review.poll_interval_secs = parse_secs("LEXAUDIT_POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("LEXAUDIT_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_secs("LEXAUDIT_TIMEOUT_SECS", &secs)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_url",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "api.base_url",
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }
        if self.review.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "review.poll_interval_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.review.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            key,
            reason: format!("{value:?}: {e}"),
        })
}
