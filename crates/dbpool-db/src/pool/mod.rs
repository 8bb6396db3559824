//! Database connection pool management

mod mysql;
mod provider;

pub use mysql::{create_pool, ConnectionPoolConfig, DbError, DbPool, DbResult, PoolStatus};
pub use provider::{global, init_global, PoolProvider};

// Re-export MySqlPool for convenience
pub use sqlx::mysql::MySqlPool;
