//! Configuration handling for model_link

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Load configuration from a TOML file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let config_str = fs::read_to_string(path.as_ref())
        .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete model_link configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub client: ClientOptions,
    pub logging: Option<LoggingConfig>,
}

/// Connection descriptor used to build the connection string.
///
/// Every field defaults independently, so a partial TOML table or a partially
/// populated environment still yields a usable descriptor. Contents are never
/// validated here; bad credentials or hosts only show up when authenticating.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub pass: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_db")]
    pub db: String,
}

fn default_user() -> String {
    "user".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> String {
    "5432".to_string()
}

fn default_db() -> String {
    "database".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            pass: String::new(),
            host: default_host(),
            port: default_port(),
            db: default_db(),
        }
    }
}

impl ConnectionConfig {
    /// Read the descriptor from `DB`, `DBUSER`, `DBPASS`, `DBHOST` and `DBPORT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the descriptor from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            user: lookup("DBUSER").unwrap_or(defaults.user),
            pass: lookup("DBPASS").unwrap_or(defaults.pass),
            host: lookup("DBHOST").unwrap_or(defaults.host),
            port: lookup("DBPORT").unwrap_or(defaults.port),
            db: lookup("DB").unwrap_or(defaults.db),
        }
    }

    /// `postgres://{user}:{pass}@{host}:{port}/{db}`, with no percent-encoding
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.pass, self.host, self.port, self.db
        )
    }
}

/// Options applied to the client when it is built
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Emit every issued statement as a debug event
    #[serde(default)]
    pub logging: bool,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// Schema inspected when altering tables
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_schema() -> String {
    "public".to_string()
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            logging: false,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            schema: default_schema(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "text".to_string(),
            stdout: true,
        }
    }
}
