//! # Configuration
//!
//! Runtime settings, read from an optional TOML file and then overridden by
//! environment variables:
//!
//! - `TIERLINE_API_URL`: upstream rewards API base URL
//! - `TIERLINE_SESSION`: cookie header value forwarded to the upstream API
//! - `TIERLINE_TIER_CAP`: battle pass tiers listed per view
//! - `TIERLINE_REQUEST_TIMEOUT_SECS`: upstream request timeout
//!
//! Server-only settings (`TIERLINE_API_KEY`, `TIERLINE_RATE_LIMIT`,
//! `TIERLINE_CORS_ORIGINS`) are read by the `api` module at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tierline_core::primitives::DEFAULT_TIER_CAP;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Tierline runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api_url: String,
    pub session: Option<String>,
    pub tier_cap: u32,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session: None,
            tier_cap: DEFAULT_TIER_CAP,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load from `path` (if given), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `TIERLINE_*` overrides from `lookup`. Empty values are ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("TIERLINE_API_URL") {
            self.api_url = url;
        }
        if let Some(session) = get("TIERLINE_SESSION") {
            self.session = Some(session);
        }
        if let Some(cap) = get("TIERLINE_TIER_CAP") {
            self.tier_cap = cap.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "TIERLINE_TIER_CAP",
                value: cap,
            })?;
        }
        if let Some(secs) = get("TIERLINE_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs =
                secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "TIERLINE_REQUEST_TIMEOUT_SECS",
                    value: secs,
                })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
