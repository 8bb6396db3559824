//! MySQL connection pool management

use std::fmt;
use std::time::Duration;

use dbpool_common::{AppError, ConfigError, DatabaseConfig};
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;

/// Connection pool configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionPoolConfig {
    /// Database server address
    pub host: String,
    /// Database server port
    pub port: u16,
    /// Authentication user
    pub user: String,
    /// Authentication password
    pub password: String,
    /// Target database (schema)
    pub database: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection
    pub acquire_timeout: Duration,
    /// Maximum idle time before a connection is closed
    pub idle_timeout: Duration,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
    /// Open the first connection while constructing the pool
    pub connect_eagerly: bool,
}

impl fmt::Debug for ConnectionPoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPoolConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("max_lifetime", &self.max_lifetime)
            .field("connect_eagerly", &self.connect_eagerly)
            .finish()
    }
}

impl From<&DatabaseConfig> for ConnectionPoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            user: config.user.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            max_lifetime: Duration::from_secs(config.max_lifetime_secs),
            connect_eagerly: config.connect_eagerly,
        }
    }
}

impl From<&ConnectionPoolConfig> for DatabaseConfig {
    fn from(config: &ConnectionPoolConfig) -> Self {
        Self {
            host: config.host.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
            port: config.port,
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            acquire_timeout_secs: whole_secs(config.acquire_timeout),
            idle_timeout_secs: whole_secs(config.idle_timeout),
            max_lifetime_secs: whole_secs(config.max_lifetime),
            connect_eagerly: config.connect_eagerly,
        }
    }
}

// Rounds up, so only a zero duration maps to zero seconds
fn whole_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

impl ConnectionPoolConfig {
    /// Create config from the four credentials, with default pool tuning
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self::from(&DatabaseConfig::new(host, user, password, database))
    }

    /// Create config from `DB_HOST`, `DB_USER`, `DB_PASS` and `DB_NAME`
    pub fn from_env() -> Result<Self, ConfigError> {
        DatabaseConfig::from_env().map(|config| Self::from(&config))
    }

    /// Reject configurations that must never reach the driver
    ///
    /// Applies the same rules, and names the same variables, as
    /// [`DatabaseConfig::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        DatabaseConfig::from(self).validate()
    }

    /// Driver connect options built from the discrete fields
    ///
    /// No URL is assembled, so credentials need no percent-encoding.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
    }
}

/// Error type for pool operations
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Connection(#[from] sqlx::Error),
}

impl DbError {
    /// Returns true if the failure happened before any network activity
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Config(e) => Self::Config(e),
            DbError::Connection(e) => Self::database(e),
        }
    }
}

/// Result type for pool operations
pub type DbResult<T> = Result<T, DbError>;

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Open connections, idle or in use
    pub size: u32,
    /// Open connections currently idle
    pub idle: usize,
    /// Configured upper bound
    pub max_connections: u32,
    pub closed: bool,
}

/// Shared MySQL connection pool
///
/// Cloning is cheap; every clone refers to the same underlying pool.
#[derive(Clone)]
pub struct DbPool {
    pool: MySqlPool,
}

impl fmt::Debug for DbPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbPool")
            .field("status", &self.status())
            .finish()
    }
}

impl AsRef<MySqlPool> for DbPool {
    fn as_ref(&self) -> &MySqlPool {
        &self.pool
    }
}

impl DbPool {
    /// The underlying sqlx pool, usable as an executor
    #[must_use]
    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    /// Borrow a connection from the pool
    pub async fn acquire(&self) -> DbResult<PoolConnection<MySql>> {
        Ok(self.pool.acquire().await?)
    }

    /// Check that the database answers a trivial query
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get the current pool status
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max_connections: self.pool.options().get_max_connections(),
            closed: self.pool.is_closed(),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close the pool, waiting for checked-out connections to be returned
    ///
    /// Calling this more than once is a no-op.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        self.pool.close().await;
        tracing::info!("MySQL pool closed");
    }
}

/// Create a new MySQL connection pool
///
/// The configuration is validated first, so a missing credential is reported
/// before any connection attempt. Unless `connect_eagerly` is set, no
/// connection is opened until the pool is first used.
pub async fn create_pool(config: &ConnectionPoolConfig) -> DbResult<DbPool> {
    config.validate()?;

    let options = config.pool_options();
    let pool = if config.connect_eagerly {
        options.connect_with(config.connect_options()).await?
    } else {
        options.connect_lazy_with(config.connect_options())
    };

    tracing::info!(
        host = %config.host,
        port = config.port,
        user = %config.user,
        database = %config.database,
        max_connections = config.max_connections,
        lazy = !config.connect_eagerly,
        "MySQL pool created"
    );

    Ok(DbPool { pool })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbpool_common::{defaults, vars};

    fn test_config() -> ConnectionPoolConfig {
        ConnectionPoolConfig::new("localhost", "root", "secret", "app")
    }

    #[test]
    fn test_new_defaults() {
        let config = test_config();
        assert_eq!(config.port, defaults::PORT);
        assert_eq!(config.max_connections, defaults::MAX_CONNECTIONS);
        assert_eq!(config.min_connections, defaults::MIN_CONNECTIONS);
        assert_eq!(
            config.acquire_timeout,
            Duration::from_secs(defaults::ACQUIRE_TIMEOUT_SECS)
        );
        assert_eq!(config.idle_timeout, Duration::from_secs(defaults::IDLE_TIMEOUT_SECS));
        assert_eq!(config.max_lifetime, Duration::from_secs(defaults::MAX_LIFETIME_SECS));
        assert!(!config.connect_eagerly);
    }

    #[test]
    fn test_config_from_database_config() {
        let database_config = DatabaseConfig {
            host: "db.internal".to_string(),
            user: "svc".to_string(),
            password: "p@ss/word".to_string(),
            database: "orders".to_string(),
            port: 3307,
            max_connections: 32,
            min_connections: 4,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 60,
            max_lifetime_secs: 120,
            connect_eagerly: true,
        };
        let config = ConnectionPoolConfig::from(&database_config);
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.password, "p@ss/word");
        assert_eq!(config.max_connections, 32);
        assert_eq!(config.min_connections, 4);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.max_lifetime, Duration::from_secs(120));
        assert!(config.connect_eagerly);
    }

    #[test]
    fn test_connect_options_match_config() {
        let mut config = test_config();
        config.port = 3310;
        let options = config.connect_options();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 3310);
        assert_eq!(options.get_username(), "root");
        assert_eq!(options.get_database(), Some("app"));
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let config = ConnectionPoolConfig::new("", "root", "secret", "app");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(vars::DB_HOST)));
    }

    #[test]
    fn test_validate_names_same_variable_as_environment_path() {
        let mut config = test_config();
        config.max_connections = 2;
        config.min_connections = 5;
        let pool_err = config.validate().unwrap_err();
        let env_err = DatabaseConfig::from(&config).validate().unwrap_err();
        assert_eq!(pool_err.variable(), vars::DB_MIN_CONNECTIONS);
        assert_eq!(pool_err.variable(), env_err.variable());

        config.min_connections = 0;
        config.max_connections = 0;
        assert_eq!(config.validate().unwrap_err().variable(), vars::DB_MAX_CONNECTIONS);
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = test_config();
        config.acquire_timeout = Duration::ZERO;
        assert_eq!(
            config.validate().unwrap_err().variable(),
            vars::DB_ACQUIRE_TIMEOUT_SECS
        );

        let mut config = test_config();
        config.idle_timeout = Duration::ZERO;
        assert_eq!(config.validate().unwrap_err().variable(), vars::DB_IDLE_TIMEOUT_SECS);

        let mut config = test_config();
        config.max_lifetime = Duration::ZERO;
        assert_eq!(config.validate().unwrap_err().variable(), vars::DB_MAX_LIFETIME_SECS);
    }

    #[test]
    fn test_sub_second_timeout_is_accepted() {
        let mut config = test_config();
        config.acquire_timeout = Duration::from_millis(250);
        config.validate().unwrap();
    }

    #[tokio::test]
    async fn test_zero_acquire_timeout_fails_before_pool_creation() {
        let mut config = test_config();
        config.acquire_timeout = Duration::ZERO;

        let err = create_pool(&config).await.unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", test_config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_app_error_mapping() {
        let err = AppError::from(DbError::from(ConfigError::MissingVar("DB_NAME")));
        assert_eq!(err.error_code(), "CONFIG_ERROR");

        let err = AppError::from(DbError::from(sqlx::Error::PoolTimedOut));
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_lazy_pool_opens_no_connections() {
        // Nothing listens on this port; a lazy pool must not care
        let mut config = test_config();
        config.host = "127.0.0.1".to_string();
        config.port = 1;

        let pool = create_pool(&config).await.unwrap();
        let status = pool.status();
        assert_eq!(status.size, 0);
        assert_eq!(status.max_connections, 10);
        assert!(!status.closed);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_connecting() {
        let mut config = ConnectionPoolConfig::new("", "root", "secret", "app");
        config.connect_eagerly = true;

        let err = create_pool(&config).await.unwrap_err();
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: DB_HOST"
        );
    }

    #[tokio::test]
    async fn test_eager_pool_surfaces_connection_failure() {
        let mut config = test_config();
        config.host = "127.0.0.1".to_string();
        config.port = 1;
        config.acquire_timeout = Duration::from_secs(1);
        config.connect_eagerly = true;

        let err = create_pool(&config).await.unwrap_err();
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let pool = create_pool(&test_config()).await.unwrap();
        let clone = pool.clone();

        pool.close().await;
        assert!(pool.is_closed());
        assert!(clone.is_closed());

        clone.close().await;
        assert!(clone.status().closed);
    }
}
