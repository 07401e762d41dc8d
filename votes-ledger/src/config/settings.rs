//! Environment-driven service settings.

use std::env;
use std::time::Duration;
use tracing::warn;
use votes_ledger_core::VotesConfig;

use crate::LedgerError;

/// Default size of the PostgreSQL connection pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// `VOTES_MAX_BATCH_SIZE` value that leaves batched reads unbounded.
const UNLIMITED_BATCH_SIZE: usize = 0;

/// Connection mode for PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection every retry interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<String>) -> Self {
        match value.unwrap_or_else(|| "retry".to_string()).to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            other => {
                warn!(value = other, "Invalid DATABASE_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Settings of the votes ledger service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// `None` disables the batch limit.
    pub max_batch_size: Option<usize>,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
}

impl LedgerConfig {
    /// Reads the settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
    /// - `VOTES_MAX_BATCH_SIZE`: Entities per batched read, 0 for unlimited (default: 0)
    /// - `DATABASE_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `DATABASE_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    pub fn from_env() -> Result<Self, LedgerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to its value.
    ///
    /// Unparseable numbers fall back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LedgerError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| LedgerError::config("DATABASE_URL must be set"))?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let max_batch_size = match parse_or(&lookup, "VOTES_MAX_BATCH_SIZE", UNLIMITED_BATCH_SIZE) {
            UNLIMITED_BATCH_SIZE => None,
            size => Some(size),
        };
        let connection_mode = ConnectionMode::parse(lookup("DATABASE_CONNECTION_MODE"));
        let retry_interval = Duration::from_secs(parse_or(
            &lookup,
            "DATABASE_RETRY_INTERVAL_SECS",
            DEFAULT_RETRY_INTERVAL_SECS,
        ));

        Ok(Self {
            database_url,
            max_connections,
            max_batch_size,
            connection_mode,
            retry_interval,
        })
    }

    pub fn votes_config(&self) -> VotesConfig {
        VotesConfig {
            max_batch_size: self.max_batch_size,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid numeric setting, using default");
            default
        }),
    }
}
