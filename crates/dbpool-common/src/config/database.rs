//! Database configuration
//!
//! Reads the MySQL credentials and pool tuning knobs from the environment.
//! The four credential variables are required and must be non-empty.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

use self::vars::{
    DB_ACQUIRE_TIMEOUT_SECS, DB_CONNECT_EAGERLY, DB_HOST, DB_IDLE_TIMEOUT_SECS,
    DB_MAX_CONNECTIONS, DB_MAX_LIFETIME_SECS, DB_MIN_CONNECTIONS, DB_NAME, DB_PASS, DB_PORT,
    DB_USER,
};

/// Environment variable names
pub mod vars {
    pub const DB_HOST: &str = "DB_HOST";
    pub const DB_USER: &str = "DB_USER";
    pub const DB_PASS: &str = "DB_PASS";
    pub const DB_NAME: &str = "DB_NAME";
    pub const DB_PORT: &str = "DB_PORT";
    pub const DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
    pub const DB_MIN_CONNECTIONS: &str = "DB_MIN_CONNECTIONS";
    pub const DB_ACQUIRE_TIMEOUT_SECS: &str = "DB_ACQUIRE_TIMEOUT_SECS";
    pub const DB_IDLE_TIMEOUT_SECS: &str = "DB_IDLE_TIMEOUT_SECS";
    pub const DB_MAX_LIFETIME_SECS: &str = "DB_MAX_LIFETIME_SECS";
    pub const DB_CONNECT_EAGERLY: &str = "DB_CONNECT_EAGERLY";
}

/// Pool tuning defaults
pub mod defaults {
    pub const PORT: u16 = 3306;
    pub const MAX_CONNECTIONS: u32 = 10;
    pub const MIN_CONNECTIONS: u32 = 0;
    pub const ACQUIRE_TIMEOUT_SECS: u64 = 10;
    pub const IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    pub const MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes
}

/// Database configuration
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
    #[serde(default)]
    pub connect_eagerly: bool,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .field("connect_eagerly", &self.connect_eagerly)
            .finish()
    }
}

// Default value functions
fn default_port() -> u16 {
    defaults::PORT
}

fn default_max_connections() -> u32 {
    defaults::MAX_CONNECTIONS
}

fn default_min_connections() -> u32 {
    defaults::MIN_CONNECTIONS
}

fn default_acquire_timeout_secs() -> u64 {
    defaults::ACQUIRE_TIMEOUT_SECS
}

fn default_idle_timeout_secs() -> u64 {
    defaults::IDLE_TIMEOUT_SECS
}

fn default_max_lifetime_secs() -> u64 {
    defaults::MAX_LIFETIME_SECS
}

impl DatabaseConfig {
    /// Create config from the four credentials, with default pool tuning
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            port: default_port(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_lifetime_secs: default_max_lifetime_secs(),
            connect_eagerly: false,
        }
    }

    /// Load database configuration from the process environment
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Variables already set in the environment take precedence over it.
    ///
    /// # Errors
    /// Returns an error naming the first required variable that is missing or empty,
    /// or the first optional variable that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// Required variables are checked in the order `DB_HOST`, `DB_USER`,
    /// `DB_PASS`, `DB_NAME`, before any optional value is parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = required(&lookup, DB_HOST)?;
        let user = required(&lookup, DB_USER)?;
        let password = required(&lookup, DB_PASS)?;
        let database = required(&lookup, DB_NAME)?;

        let config = Self {
            host,
            user,
            password,
            database,
            port: parsed(&lookup, DB_PORT, default_port())?,
            max_connections: parsed(&lookup, DB_MAX_CONNECTIONS, default_max_connections())?,
            min_connections: parsed(&lookup, DB_MIN_CONNECTIONS, default_min_connections())?,
            acquire_timeout_secs: parsed(
                &lookup,
                DB_ACQUIRE_TIMEOUT_SECS,
                default_acquire_timeout_secs(),
            )?,
            idle_timeout_secs: parsed(&lookup, DB_IDLE_TIMEOUT_SECS, default_idle_timeout_secs())?,
            max_lifetime_secs: parsed(&lookup, DB_MAX_LIFETIME_SECS, default_max_lifetime_secs())?,
            connect_eagerly: flag(&lookup, DB_CONNECT_EAGERLY)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the invariants that the environment parsing cannot express
    ///
    /// # Errors
    /// Returns an error for empty credentials, zero timeouts or inconsistent
    /// pool bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            (DB_HOST, &self.host),
            (DB_USER, &self.user),
            (DB_PASS, &self.password),
            (DB_NAME, &self.database),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingVar(name));
            }
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                DB_MAX_CONNECTIONS,
                "must be at least 1".to_string(),
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue(
                DB_MIN_CONNECTIONS,
                format!(
                    "{} exceeds {DB_MAX_CONNECTIONS} ({})",
                    self.min_connections, self.max_connections
                ),
            ));
        }

        for (name, secs) in [
            (DB_ACQUIRE_TIMEOUT_SECS, self.acquire_timeout_secs),
            (DB_IDLE_TIMEOUT_SECS, self.idle_timeout_secs),
            (DB_MAX_LIFETIME_SECS, self.max_lifetime_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue(name, "must be at least 1".to_string()));
            }
        }

        Ok(())
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, value)),
        _ => Ok(default),
    }
}

fn flag<F>(lookup: &F, name: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "" | "0" | "false" | "no" | "off" => Ok(false),
            "1" | "true" | "yes" | "on" => Ok(true),
            _ => Err(ConfigError::InvalidValue(name, value)),
        },
        None => Ok(false),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl ConfigError {
    /// Name of the variable this error is about
    #[must_use]
    pub fn variable(&self) -> &'static str {
        match self {
            Self::MissingVar(name) | Self::InvalidValue(name, _) => name,
        }
    }
}
