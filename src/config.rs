use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

pub const UPSTREAM_URL: &str = "http://localhost:5001";
pub const BIND_ADDR: &str = "0.0.0.0:3000";
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the detector and fundamentals API (UPSTREAM_URL)
    pub upstream_url: String,
    pub bind_addr: String,
    /// Daily rolling log files go here when set (LOG_DIR)
    pub log_dir: Option<PathBuf>,
    /// Bound on each per-kind detector read; unset waits indefinitely
    /// (PATTERN_FETCH_TIMEOUT_SECS)
    pub pattern_fetch_timeout: Option<Duration>,
    /// Whole-request timeout for the HTTP client (UPSTREAM_TIMEOUT_SECS)
    pub upstream_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstream_url: UPSTREAM_URL.to_string(),
            bind_addr: BIND_ADDR.to_string(),
            log_dir: None,
            pattern_fetch_timeout: None,
            upstream_timeout: Duration::from_secs(UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            upstream_url: var("UPSTREAM_URL")
                .unwrap_or_else(|| UPSTREAM_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| BIND_ADDR.to_string()),
            log_dir: var("LOG_DIR").map(PathBuf::from),
            pattern_fetch_timeout: var("PATTERN_FETCH_TIMEOUT_SECS")
                .map(|raw| parse_secs("PATTERN_FETCH_TIMEOUT_SECS", &raw))
                .transpose()?,
            upstream_timeout: var("UPSTREAM_TIMEOUT_SECS")
                .map(|raw| parse_secs("UPSTREAM_TIMEOUT_SECS", &raw))
                .transpose()?
                .unwrap_or_else(|| Duration::from_secs(UPSTREAM_TIMEOUT_SECS)),
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, AppError> {
    raw.parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| AppError::Config(format!("{key} must be a positive number of seconds")))
}
