//! Configuration loading and representation.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. an optional `catalog.toml` in the working directory
//! 3. environment variables prefixed `CATALOG__`, using `__` for nesting
//!    (e.g. `CATALOG__DATABASE__URL` → `database.url`)
//!
//! A `.env` file is loaded first if present. `DATABASE_URL` is honoured when
//! `CATALOG__DATABASE__URL` is not set.

use std::collections::HashMap;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use catalog_observability::LogFormat;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_LOG_FORMAT: &str = "json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL. Unset means "use the in-memory store".
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_seconds: DEFAULT_ACQUIRE_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `json` or `pretty`, case-insensitive.
    pub format: LogFormat,
}

impl CatalogConfig {
    /// Load from `.env`, `catalog.toml` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let settings = defaults()?
            .add_source(File::with_name("catalog").required(false))
            .add_source(environment())
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        if config.database.url.is_none() {
            config.database.url = std::env::var("DATABASE_URL").ok();
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from defaults plus an explicit variable map (no files, no process env).
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let settings = defaults()?
            .add_source(environment().source(Some(vars)))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Host and port to listen on. The host may be an IP literal or a name
    /// resolved at bind time.
    pub fn bind_address(&self) -> (&str, u16) {
        (self.server.host.as_str(), self.server.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.database.url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            return Err(ConfigError::Invalid("database.url is empty".to_string()));
        }
        let host = &self.server.host;
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "server.host must be a hostname or IP address (got {host:?})"
            )));
        }
        Ok(())
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("server.host", DEFAULT_HOST)?
        .set_default("server.port", i64::from(DEFAULT_PORT))?
        .set_default("database.max_connections", i64::from(DEFAULT_MAX_CONNECTIONS))?
        .set_default(
            "database.acquire_timeout_seconds",
            DEFAULT_ACQUIRE_TIMEOUT_SECONDS as i64,
        )?
        .set_default("log.format", DEFAULT_LOG_FORMAT)
}

fn environment() -> Environment {
    Environment::with_prefix("CATALOG")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
