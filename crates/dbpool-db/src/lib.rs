//! # dbpool-db
//!
//! MySQL connection pool provider built on SQLx.
//!
//! ## Overview
//!
//! This crate turns four environment variables (`DB_HOST`, `DB_USER`,
//! `DB_PASS`, `DB_NAME`) into a shared connection pool. It handles:
//!
//! - Configuration validation before any network activity
//! - Lazy or eager pool construction
//! - One-time initialization, either owned by a [`PoolProvider`] or process-wide
//! - Readiness probing and graceful shutdown
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dbpool_db::PoolProvider;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = PoolProvider::from_env()?;
//!     let pool = provider.initialize().await?;
//!
//!     sqlx::query("SELECT 1").execute(pool.inner()).await?;
//!
//!     provider.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod pool;

// Re-export commonly used types
pub use pool::{
    create_pool, global, init_global, ConnectionPoolConfig, DbError, DbPool, DbResult, MySqlPool,
    PoolProvider, PoolStatus,
};
