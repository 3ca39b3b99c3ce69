//! Configuration loaded from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use domain::DEFAULT_MAX_RETRIES;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("{0} is required")]
    Missing(&'static str),
}

/// Where events are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Postgres { database_url: String },
}

impl StoreConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::Postgres { .. } => "postgres",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Runtime configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `CMS_STORE`: `memory` or `postgres` (default: `memory`)
/// - `DATABASE_URL`: required when the store is `postgres`
/// - `CMS_COMMAND_RETRIES`: conflict retries per command (default: `3`)
/// - `CMS_SCHEDULER_INTERVAL_SECS`: scheduled publishing sweep interval (default: `10`)
/// - `CMS_METRICS_ADDR`: Prometheus scrape address (default: unset, no listener)
/// - `CMS_LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `CMS_USERS`: comma-separated `id` or `id=Display Name` entries
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store: StoreConfig,
    pub command_retries: usize,
    pub scheduler_interval: Duration,
    pub metrics_addr: Option<SocketAddr>,
    pub log_format: LogFormat,
    pub log_level: String,
    pub users: Vec<(String, String)>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store = match var("CMS_STORE").as_deref() {
            None | Some("memory") => StoreConfig::Memory,
            Some("postgres") => StoreConfig::Postgres {
                database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            Some(other) => return Err(invalid("CMS_STORE", other)),
        };

        let command_retries = parse(&var, "CMS_COMMAND_RETRIES")?.unwrap_or(defaults.command_retries);

        let scheduler_interval = match parse::<u64>(&var, "CMS_SCHEDULER_INTERVAL_SECS")? {
            Some(0) => return Err(invalid("CMS_SCHEDULER_INTERVAL_SECS", "0")),
            Some(secs) => Duration::from_secs(secs),
            None => defaults.scheduler_interval,
        };

        let log_format = match var("CMS_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid("CMS_LOG_FORMAT", other)),
        };

        Ok(Self {
            store,
            command_retries,
            scheduler_interval,
            metrics_addr: parse(&var, "CMS_METRICS_ADDR")?,
            log_format,
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            users: var("CMS_USERS").map(|v| parse_users(&v)).unwrap_or_default(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::Memory,
            command_retries: DEFAULT_MAX_RETRIES,
            scheduler_interval: Duration::from_secs(10),
            metrics_addr: None,
            log_format: LogFormat::Pretty,
            log_level: "info".to_string(),
            users: Vec::new(),
        }
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn parse<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    var(key)
        .map(|value| value.trim().parse().map_err(|_| invalid(key, &value)))
        .transpose()
}

fn parse_users(value: &str) -> Vec<(String, String)> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((id, name)) => (id.trim().to_string(), name.trim().to_string()),
            None => (entry.to_string(), entry.to_string()),
        })
        .collect()
}
