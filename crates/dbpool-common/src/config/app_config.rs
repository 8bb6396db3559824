//! Application configuration structs
//!
//! Loads configuration from environment variables and an optional `.env` file.

use serde::Deserialize;
use std::env;

use super::database::{ConfigError, DatabaseConfig};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

fn default_app_name() -> String {
    "dbpool".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(value) => {
                Environment::parse(&value).ok_or(ConfigError::InvalidValue("APP_ENV", value))?
            }
            None => default_env(),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            database: DatabaseConfig::from_lookup(&lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "DB_HOST" => Some("localhost".to_string()),
            "DB_USER" => Some("root".to_string()),
            "DB_PASS" => Some("secret".to_string()),
            "DB_NAME" => Some("app".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_environment_is_development() {
        assert!(Environment::Development.is_development());
        assert!(!Environment::Staging.is_development());
        assert!(!Environment::Production.is_development());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("Production"), Some(Environment::Production));
        assert_eq!(Environment::parse(" staging "), Some(Environment::Staging));
        assert_eq!(Environment::parse("dev"), Some(Environment::Development));
        assert_eq!(Environment::parse("qa"), None);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup).unwrap();
        assert_eq!(config.app.name, "dbpool");
        assert_eq!(config.app.env, Environment::Development);
        assert_eq!(config.database.host, "localhost");
    }

    #[test]
    fn test_deserialize_nested_sections() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "app": {"env": "production"},
                "database": {"host": "db", "user": "svc", "password": "pw", "database": "orders"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.app.name, "dbpool");
        assert!(config.app.env.is_production());
        assert_eq!(config.database.port, 3306);
    }

    #[test]
    fn test_invalid_app_env() {
        let err = AppConfig::from_lookup(|name| match name {
            "APP_ENV" => Some("qa".to_string()),
            other => lookup(other),
        })
        .unwrap_err();
        assert_eq!(err.variable(), "APP_ENV");
    }

    #[test]
    fn test_database_errors_propagate() {
        let err = AppConfig::from_lookup(|name| match name {
            "DB_USER" => None,
            other => lookup(other),
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("DB_USER")));
    }
}
