//! Client configuration (~/.shiftweek/config.json)
//!
//! Every field has a serde default so a partial or missing file still yields a
//! usable config. `SHIFTWEEK_API_URL` and `SHIFTWEEK_API_TOKEN` override the
//! file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const API_URL_ENV: &str = "SHIFTWEEK_API_URL";
pub const API_TOKEN_ENV: &str = "SHIFTWEEK_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default = "ClientConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "ClientConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    fn default_base_url() -> String {
        "http://localhost:3000/api".to_string()
    }

    fn default_timeout_secs() -> u64 {
        30
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut config = Self::load(&config_path()?)?;
        config.apply_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(API_TOKEN_ENV).ok(),
        );
        Ok(config)
    }

    pub fn apply_overrides(&mut self, base_url: Option<String>, auth_token: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(token) = auth_token.filter(|t| !t.trim().is_empty()) {
            self.auth_token = Some(token);
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            auth_token: None,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Canonical config file path (~/.shiftweek/config.json)
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".shiftweek").join("config.json"))
}
