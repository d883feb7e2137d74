//! Run configuration
//!
//! Values come from the process environment after loading a `.env` file if
//! one is present. CLI flags are applied on top by the binary.

use std::env;
use std::fmt;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use action_flow::RetryPolicy;
use cdp_adapter::CdpConfig;
use dotenvy::dotenv;
use thiserror::Error;

pub const DEFAULT_URL: &str = "https://login.beyondup.es";
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_SCREENSHOTS_DIR: &str = "/tmp/beyondup_screenshots";

/// CRM login credentials. The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Credentials,
    pub url: String,
    pub headless: bool,
    /// Bound on every single browser wait
    pub timeout: Duration,
    pub max_retries: u32,
    pub screenshots_dir: PathBuf,
    pub chrome_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid boolean '{value}' for {field}")]
    InvalidBool { field: &'static str, value: String },
    #[error("invalid number '{value}' for {field}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl RunConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    ///
    /// Values are trimmed except the password, which is used as given.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let username = var("BEYONDUP_USER").ok_or(ConfigError::Missing("BEYONDUP_USER"))?;
        let password = lookup("BEYONDUP_PASS")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("BEYONDUP_PASS"))?;

        let headless = match var("HEADLESS") {
            Some(value) => parse_bool("HEADLESS", &value)?,
            None => true,
        };
        let timeout_ms = match var("TIMEOUT") {
            Some(value) => parse_number::<u64>("TIMEOUT", &value)?,
            None => DEFAULT_TIMEOUT_MS,
        };
        let max_retries = match var("MAX_RETRIES") {
            Some(value) => parse_number::<u32>("MAX_RETRIES", &value)?,
            None => DEFAULT_MAX_RETRIES,
        };

        Ok(Self {
            credentials: Credentials::new(username, password),
            url: var("BEYONDUP_URL").unwrap_or_else(|| DEFAULT_URL.to_string()),
            headless,
            timeout: Duration::from_millis(timeout_ms),
            max_retries,
            screenshots_dir: var("SCREENSHOTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCREENSHOTS_DIR)),
            chrome_path: var("CHROME_PATH").map(PathBuf::from),
        })
    }

    pub fn cdp_config(&self) -> CdpConfig {
        CdpConfig::default()
            .with_headless(self.headless)
            .with_executable(self.chrome_path.clone())
            .with_deadline(self.timeout)
    }

    /// Backoff policy for retried stages; at least one attempt is always made.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.max_retries)
    }
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_number<T>(field: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|source| ConfigError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}
