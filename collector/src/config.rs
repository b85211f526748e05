//! Client configuration
//!
//! Values come from command-line flags first, then `EGGVENTORY_*`
//! environment variables (a `.env` file is loaded at startup), then defaults.

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{CollectorError, CollectorResult};

pub const DEFAULT_API_URL: &str = "https://joe-farm-backend.onrender.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_SECS: u64 = 30;
const SESSION_DIR_NAME: &str = ".eggventory";

pub const ENV_API_URL: &str = "EGGVENTORY_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "EGGVENTORY_TIMEOUT_SECS";
pub const ENV_SESSION_DIR: &str = "EGGVENTORY_SESSION_DIR";
pub const ENV_POLL_SECS: &str = "EGGVENTORY_POLL_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: Url,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub session_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            session_dir: default_session_dir(),
        }
    }
}

fn default_api_url() -> Url {
    // Constant literal, always parses
    Url::parse(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!("default API URL is valid"))
}

/// `$HOME/.eggventory`, or a relative directory when no home is known
pub fn default_session_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(SESSION_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(SESSION_DIR_NAME))
}

impl ClientConfig {
    /// Build from explicit overrides; `None` falls back to the default
    pub fn new(
        api_url: Option<&str>,
        timeout_secs: Option<u64>,
        poll_secs: Option<u64>,
        session_dir: Option<PathBuf>,
    ) -> CollectorResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = api_url {
            config.api_url = parse_api_url(raw)?;
        }
        if let Some(seconds) = timeout_secs {
            config.request_timeout = positive_duration("timeout", seconds)?;
        }
        if let Some(seconds) = poll_secs {
            config.poll_interval = positive_duration("poll interval", seconds)?;
        }
        if let Some(dir) = session_dir {
            config.session_dir = dir;
        }
        Ok(config)
    }

    /// Build from `EGGVENTORY_*` environment variables
    pub fn from_env() -> CollectorResult<Self> {
        let api_url = std::env::var(ENV_API_URL).ok();
        let timeout = env_seconds(ENV_TIMEOUT_SECS)?;
        let poll = env_seconds(ENV_POLL_SECS)?;
        let session_dir = std::env::var(ENV_SESSION_DIR).ok().map(PathBuf::from);

        Self::new(api_url.as_deref(), timeout, poll, session_dir)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.request_timeout.as_secs()
    }

    /// Resolve an API path against the base URL
    pub fn endpoint(&self, path: &str) -> CollectorResult<Url> {
        self.api_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| CollectorError::config(format!("Invalid endpoint {path}: {e}")))
    }
}

fn parse_api_url(raw: &str) -> CollectorResult<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|e| CollectorError::config(format!("Invalid API URL {raw}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn positive_duration(name: &str, seconds: u64) -> CollectorResult<Duration> {
    if seconds == 0 {
        return Err(CollectorError::config(format!("{name} must be at least one second")));
    }
    Ok(Duration::from_secs(seconds))
}

fn env_seconds(key: &str) -> CollectorResult<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| CollectorError::config(format!("{key} must be a whole number of seconds, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}
