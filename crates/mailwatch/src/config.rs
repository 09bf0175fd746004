//! Credentials and poller options loading
//!
//! Credentials are loaded from (in order of priority):
//! 1. JSON file in the mailwatch config directory
//! 2. Runtime environment variables
//!
//! Token acquisition and refresh happen outside mailwatch; the loaded
//! tokens are used as-is.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Credentials filename in the mailwatch config directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Options filename in the mailwatch config directory
const OPTIONS_FILE: &str = "watch.json";

/// Default spacing between poll cycles, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// OAuth client registration plus an already-issued token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Access token expiry, milliseconds since epoch
    #[serde(default)]
    pub expiry_date: Option<i64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credentials {
    /// Load credentials from the config file, falling back to the environment
    pub fn load() -> Result<Self> {
        if config::config_exists(CREDENTIALS_FILE) {
            return config::load_json(CREDENTIALS_FILE);
        }

        Self::from_env()
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse credentials from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse credentials JSON")
    }

    /// Load credentials from `MAILWATCH_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("{key} environment variable not set"))
        };

        let expiry_date = lookup("MAILWATCH_EXPIRY_DATE")
            .map(|v| {
                v.parse::<i64>()
                    .with_context(|| format!("MAILWATCH_EXPIRY_DATE is not a timestamp: {v}"))
            })
            .transpose()?;

        Ok(Self {
            client_id: required("MAILWATCH_CLIENT_ID")?,
            client_secret: required("MAILWATCH_CLIENT_SECRET")?,
            redirect_uri: lookup("MAILWATCH_REDIRECT_URI").unwrap_or_default(),
            access_token: required("MAILWATCH_ACCESS_TOKEN")?,
            refresh_token: lookup("MAILWATCH_REFRESH_TOKEN"),
            scope: lookup("MAILWATCH_SCOPE"),
            token_type: lookup("MAILWATCH_TOKEN_TYPE").unwrap_or_else(default_token_type),
            expiry_date,
        })
    }

    /// Get the default credentials file path (~/.config/mailwatch/credentials.json)
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }

    /// Whether the access token's expiry has passed. Unknown expiry counts as valid.
    pub fn is_expired(&self) -> bool {
        self.expiry_date
            .is_some_and(|expiry| expiry <= Utc::now().timestamp_millis())
    }

    /// Value for the HTTP `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Runtime options for the watcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchOptions {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WatchOptions {
    /// Load options from `watch.json` if present, then apply
    /// `MAILWATCH_POLL_INTERVAL_MS`.
    pub fn load() -> Result<Self> {
        let mut options: Self = config::load_optional_json(OPTIONS_FILE)?.unwrap_or_default();

        if let Ok(value) = std::env::var("MAILWATCH_POLL_INTERVAL_MS") {
            options.poll_interval_ms = value
                .parse()
                .with_context(|| format!("MAILWATCH_POLL_INTERVAL_MS is not a number: {value}"))?;
        }

        options.validate()?;
        Ok(options)
    }

    /// Reject option values the poller cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            anyhow::bail!("pollIntervalMs must be positive");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
