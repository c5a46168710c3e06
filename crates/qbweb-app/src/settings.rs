//! Runner settings read from `QBWEB_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use qbweb_api::DEFAULT_TIMEOUT_SECS;
use qbweb_models::LoginCredentials;
use qbweb_telemetry::LogFormat;

use crate::error::{AppError, AppResult};

/// Daemon origin, e.g. `http://127.0.0.1:8080`. Required.
pub const ENV_URL: &str = "QBWEB_URL";
/// Login user name; login is skipped when unset.
pub const ENV_USERNAME: &str = "QBWEB_USERNAME";
/// Login password, read together with the user name.
pub const ENV_PASSWORD: &str = "QBWEB_PASSWORD";
/// Directory the user configuration is persisted in.
pub const ENV_STATE_DIR: &str = "QBWEB_STATE_DIR";
/// Per-request timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "QBWEB_TIMEOUT_SECS";
/// `json` or `pretty`.
pub const ENV_LOG_FORMAT: &str = "QBWEB_LOG_FORMAT";

/// Default state directory, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".qbweb";

/// Everything the runner needs from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    /// Daemon origin.
    pub base_url: String,
    /// Login credentials, when both user name and password are set.
    pub credentials: Option<LoginCredentials>,
    /// Where the user configuration is persisted.
    pub state_dir: PathBuf,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Log output format.
    pub log_format: LogFormat,
}

impl AppSettings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when `QBWEB_URL` is missing or a value is invalid.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error when `QBWEB_URL` is missing or a value is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let base_url = lookup(ENV_URL)
            .filter(|value| !value.trim().is_empty())
            .ok_or(AppError::MissingEnv { name: ENV_URL })?;

        let credentials = lookup(ENV_USERNAME)
            .filter(|value| !value.is_empty())
            .map(|username| LoginCredentials {
                username,
                password: lookup(ENV_PASSWORD).unwrap_or_default(),
            });

        let state_dir = lookup(ENV_STATE_DIR)
            .filter(|value| !value.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);

        let timeout = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let log_format = LogFormat::from_name(lookup(ENV_LOG_FORMAT).as_deref());

        Ok(Self {
            base_url,
            credentials,
            state_dir,
            timeout,
            log_format,
        })
    }
}

fn parse_timeout(raw: &str) -> AppResult<Duration> {
    let invalid = |reason| AppError::InvalidConfig {
        field: ENV_TIMEOUT_SECS,
        reason,
        value: Some(raw.to_string()),
    };
    let seconds: u64 = raw.trim().parse().map_err(|_| invalid("not_a_number"))?;
    if seconds == 0 {
        return Err(invalid("zero"));
    }
    Ok(Duration::from_secs(seconds))
}
