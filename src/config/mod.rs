//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! Sensitive values wrapped in secrecy::SecretString to prevent log leaks.
//! The credential pool lives in a separate TOML file (see
//! [`crate::social::pool::CredentialPool`]); only its path comes from here.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{Error, Result};

/// Interval between search polls. The platform's recent-search endpoint is
/// rate limited; anything under ~15s risks tripping it.
const DEFAULT_INGEST_INTERVAL_SECS: u64 = 16;

/// Interval between drain cycles.
const DEFAULT_DRAIN_INTERVAL_SECS: u64 = 10;

/// Interval between credential refresh passes. Must stay well under the
/// 2-hour upstream token expiry.
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Concurrently-scored items per drain cycle.
const DEFAULT_MAX_CONCURRENT_SCORING: usize = 8;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    /// Endpoint of the external scoring service.
    pub scoring_service_url: String,
    /// Public leaderboard page, interpolated into scored replies.
    pub leaderboard_url: String,
    /// Search query identifying candidate submission posts.
    pub search_query: String,
    /// OAuth redirect URI for the interactive authorization flow.
    pub redirect_uri: String,
    /// TOML file listing the posting credential pool.
    pub credentials_path: PathBuf,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    pub ingest_interval: Duration,
    pub drain_interval: Duration,
    pub refresh_interval: Duration,
    pub max_concurrent_scoring: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// In production, systemd EnvironmentFile provides the vars.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            scoring_service_url: required_var("SCORING_SERVICE_URL")?,
            leaderboard_url: required_var("LEADERBOARD_URL")?,
            search_query: required_var("SEARCH_QUERY")?,
            redirect_uri: std::env::var("REDIRECT_URI")
                .unwrap_or_else(|_| "http://127.0.0.1:8080/oauth/callback".to_string()),
            credentials_path: PathBuf::from(
                std::env::var("CREDENTIALS_FILE")
                    .unwrap_or_else(|_| "credentials.toml".to_string()),
            ),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            ingest_interval: interval_var("INGEST_INTERVAL_SECS", DEFAULT_INGEST_INTERVAL_SECS)?,
            drain_interval: interval_var("DRAIN_INTERVAL_SECS", DEFAULT_DRAIN_INTERVAL_SECS)?,
            refresh_interval: interval_var(
                "REFRESH_INTERVAL_SECS",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )?,
            max_concurrent_scoring: match std::env::var("MAX_CONCURRENT_SCORING") {
                Ok(v) => v.parse().map_err(|_| {
                    Error::Config(format!("MAX_CONCURRENT_SCORING is not a count: {v}"))
                })?,
                Err(_) => DEFAULT_MAX_CONCURRENT_SCORING,
            },
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn interval_var(name: &str, default_secs: u64) -> Result<Duration> {
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| Error::Config(format!("{name} is not a number of seconds: {v}"))),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}
