//! Application context
//!
//! Holds the configuration and the pool provider so consumers receive the
//! pool explicitly instead of reaching for a global.

use std::sync::Arc;

use dbpool_common::AppConfig;
use dbpool_db::{ConnectionPoolConfig, DbPool, DbResult, PoolProvider};

/// Dependencies shared across the application
#[derive(Clone)]
pub struct AppContext {
    /// Pool provider, built once per context
    provider: Arc<PoolProvider>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl AppContext {
    /// Create a new AppContext; the pool is not built yet
    pub fn new(config: AppConfig) -> Self {
        let provider = PoolProvider::new(ConnectionPoolConfig::from(&config.database));
        Self {
            provider: Arc::new(provider),
            config: Arc::new(config),
        }
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the pool, building it on first use
    pub async fn pool(&self) -> DbResult<&DbPool> {
        self.provider.initialize().await
    }

    pub fn provider(&self) -> &PoolProvider {
        &self.provider
    }

    /// Drain and close the pool
    pub async fn shutdown(&self) {
        self.provider.shutdown().await;
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("provider", &self.provider)
            .field("env", &self.config.app.env)
            .finish()
    }
}
