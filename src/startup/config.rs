//! Client configuration.
//!
//! Settings come from `AIMEALS_*` environment variables with builder-style
//! overrides.
//!
//! # Example
//!
//! ```ignore
//! use aimeals::startup::AppConfig;
//!
//! let config = AppConfig::from_env()?
//!     .with_request_timeout(Duration::from_secs(30));
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::reqwest_http::DEFAULT_REQUEST_TIMEOUT;
use crate::auth::guard::DEFAULT_LOGIN_PATH;

/// Explicit backend base URL.
pub const ENV_API_BASE_URL: &str = "AIMEALS_API_BASE_URL";

/// Host the base URL is derived from when no explicit URL is set.
pub const ENV_APP_HOST: &str = "AIMEALS_APP_HOST";

/// Default request timeout in milliseconds.
pub const ENV_REQUEST_TIMEOUT_MS: &str = "AIMEALS_REQUEST_TIMEOUT_MS";

/// Directory holding the persisted session.
pub const ENV_DATA_DIR: &str = "AIMEALS_DATA_DIR";

/// Host used when neither the base URL nor the host is configured.
pub const DEFAULT_APP_HOST: &str = "localhost";

/// Port the backend listens on when the base URL is derived.
pub const DEFAULT_API_PORT: u16 = 8000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} is invalid ({value:?}): {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("could not determine the home directory; set AIMEALS_DATA_DIR")]
    NoDataDir,
}

/// Backend base URL: the explicit one if set, otherwise
/// `http://{host}:8000` with `localhost` as the fallback host.
pub fn resolve_api_base_url(explicit: Option<&str>, host: Option<&str>) -> String {
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }
    let host = host
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_APP_HOST);
    format!("http://{}:{}", host, DEFAULT_API_PORT)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Backend base URL, without `/api/v1`
    pub api_base_url: String,
    /// Timeout for calls without a dedicated one
    pub request_timeout: Duration,
    /// Storage directory; `None` uses `~/.aimeals`
    pub data_dir: Option<PathBuf>,
    /// Where route guards redirect
    pub login_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: resolve_api_base_url(None, None),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            data_dir: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = resolve_api_base_url(Some(&url.into()), None);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = resolve_api_base_url(
            lookup(ENV_API_BASE_URL).as_deref(),
            lookup(ENV_APP_HOST).as_deref(),
        );

        let request_timeout = match lookup(ENV_REQUEST_TIMEOUT_MS) {
            Some(raw) => parse_timeout_ms(&raw)?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let data_dir = lookup(ENV_DATA_DIR)
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_base_url,
            request_timeout,
            data_dir,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        })
    }

    /// The storage directory, resolving the default.
    pub fn resolved_data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(crate::adapters::file_storage::DATA_DIR))
                .ok_or(ConfigError::NoDataDir),
        }
    }
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        name: ENV_REQUEST_TIMEOUT_MS,
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let ms: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected milliseconds"))?;
    if ms == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}
