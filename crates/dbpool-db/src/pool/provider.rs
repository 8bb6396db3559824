//! One-time pool construction
//!
//! [`PoolProvider`] owns a configuration and builds the pool at most once,
//! handing out the same [`DbPool`] to every caller. For code that prefers a
//! process-wide handle, [`init_global`] and [`global`] wrap a static cell.

use tokio::sync::OnceCell;

use super::mysql::{create_pool, ConnectionPoolConfig, DbPool, DbResult};

/// Lazily-initialized, shared connection pool
#[derive(Debug)]
pub struct PoolProvider {
    config: ConnectionPoolConfig,
    pool: OnceCell<DbPool>,
}

impl PoolProvider {
    /// Create a provider; no pool is built until [`initialize`](Self::initialize)
    #[must_use]
    pub fn new(config: ConnectionPoolConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    /// Create a provider from the process environment
    ///
    /// Fails with a configuration error naming the missing variable.
    pub fn from_env() -> DbResult<Self> {
        Ok(Self::new(ConnectionPoolConfig::from_env()?))
    }

    pub fn config(&self) -> &ConnectionPoolConfig {
        &self.config
    }

    /// Build the pool on first call and return the shared handle
    ///
    /// Concurrent first callers wait on a single construction. If that
    /// construction fails the provider stays uninitialized and the error is
    /// returned; a later call will try again.
    pub async fn initialize(&self) -> DbResult<&DbPool> {
        self.pool
            .get_or_try_init(|| async {
                tracing::debug!(host = %self.config.host, "Initializing connection pool");
                create_pool(&self.config).await
            })
            .await
    }

    /// The pool, if it has been initialized
    pub fn get(&self) -> Option<&DbPool> {
        self.pool.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    /// Gracefully close the pool if it was ever built
    pub async fn shutdown(&self) {
        match self.pool.get() {
            Some(pool) => pool.close().await,
            None => tracing::debug!("Shutdown requested before pool initialization"),
        }
    }
}

static GLOBAL_POOL: OnceCell<DbPool> = OnceCell::const_new();

/// Initialize the process-wide pool
///
/// Only the first successful call builds a pool. Later calls return the
/// same instance and ignore their configuration.
pub async fn init_global(config: &ConnectionPoolConfig) -> DbResult<&'static DbPool> {
    if let Some(pool) = GLOBAL_POOL.get() {
        tracing::warn!("Global pool already initialized; ignoring new configuration");
        return Ok(pool);
    }

    GLOBAL_POOL.get_or_try_init(|| create_pool(config)).await
}

/// The process-wide pool, if [`init_global`] has succeeded
pub fn global() -> Option<&'static DbPool> {
    GLOBAL_POOL.get()
}
