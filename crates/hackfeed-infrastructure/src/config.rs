//! Client configuration loaded from `config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::{HackfeedPaths, PathError};

pub const DEFAULT_API_BASE_URL: &str = "https://hack-or-snooze-v3.herokuapp.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding [`ClientConfig::api_base_url`].
pub const API_URL_ENV: &str = "HACKFEED_API_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings of one client installation.
///
/// Every field has a default, so a partial file is valid.
///
/// ```toml
/// api_base_url = "https://hack-or-snooze-v3.herokuapp.com"
/// request_timeout_secs = 10
/// store_path = "/tmp/hackfeed-session.json"
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Session file; the platform config dir is used when unset.
    pub store_path: Option<PathBuf>,
    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            store_path: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads the default config file and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = HackfeedPaths::config_file()?;
        Ok(Self::load_from(&path)?.with_api_url_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Loads `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the API URL when `url` is set and not blank.
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            tracing::debug!(%url, "API URL overridden from environment");
            self.api_base_url = url;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The configured session file, or the platform default.
    pub fn resolved_store_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(HackfeedPaths::session_file()?),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
