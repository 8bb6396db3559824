//! Configuration structs

mod app_config;
mod database;

pub use app_config::{AppConfig, AppSettings, Environment};
pub use database::{defaults, vars, ConfigError, DatabaseConfig};
