//! Client configuration
//!
//! Loaded from a TOML file with serde defaults for the timing knobs; only
//! `api_base_url` is required. Validation runs at load and at construction
//! so a bad config fails fast instead of at the first request.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Request pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the backend API, e.g. `https://api.example.com/api`
    pub api_base_url: String,
    /// Cadence of the proactive expiry check, in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// How close to expiry a token may get before refresh is due, in seconds
    #[serde(default = "default_expiry_threshold")]
    pub expiry_threshold_secs: u64,
    /// Per-request timeout, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_refresh_interval() -> u64 {
    workboard_auth::DEFAULT_REFRESH_INTERVAL.as_secs()
}

fn default_expiry_threshold() -> u64 {
    workboard_auth::DEFAULT_EXPIRY_THRESHOLD.as_secs()
}

fn default_request_timeout() -> u64 {
    30
}

impl Config {
    /// Build a config with the reference timings for the given base URL.
    pub fn new(api_base_url: impl Into<String>) -> Result<Self> {
        let config = Self {
            api_base_url: api_base_url.into(),
            refresh_interval_secs: default_refresh_interval(),
            expiry_threshold_secs: default_expiry_threshold(),
            request_timeout_secs: default_request_timeout(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "api_base_url must start with http:// or https://, got: {}",
                self.api_base_url
            )));
        }
        if self.refresh_interval_secs == 0 {
            return Err(Error::Config(
                "refresh_interval_secs must be greater than 0".into(),
            ));
        }
        if self.expiry_threshold_secs == 0 {
            return Err(Error::Config(
                "expiry_threshold_secs must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn expiry_threshold(&self) -> Duration {
        Duration::from_secs(self.expiry_threshold_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
