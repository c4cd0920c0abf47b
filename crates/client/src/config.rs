//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PAPERBACK_API_URL` - Base URL of the bookstore API (e.g.,
//!   `http://localhost:8000/api/`)
//!
//! ## Optional
//! - `PAPERBACK_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the bookstore API. Always ends with a slash so that
    /// relative endpoint paths join underneath it.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Config {
    /// Create a configuration for the given API base URL.
    ///
    /// A missing trailing slash is added so `Url::join` treats the last
    /// path segment as a directory.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `PAPERBACK_API_URL` is missing or does not
    /// parse, or if `PAPERBACK_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let raw = std::env::var("PAPERBACK_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("PAPERBACK_API_URL".to_string()))?;
        let base_url = Url::parse(&raw).map_err(|err| {
            ConfigError::InvalidEnvVar("PAPERBACK_API_URL".to_string(), err.to_string())
        })?;

        let mut config = Self::new(base_url);

        if let Ok(raw) = std::env::var("PAPERBACK_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar("PAPERBACK_TIMEOUT_SECS".to_string(), raw.clone())
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
