//! # dbpool-app
//!
//! Application wiring for the pool: context construction, a readiness check,
//! and graceful shutdown.

pub mod context;

pub use context::AppContext;

use std::future::Future;
use std::io;

use dbpool_common::{AppConfig, AppError, AppResult};
use tracing::info;

/// When to release the pool after the readiness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Close immediately after the readiness check
    Once,
    /// Keep the pool open until Ctrl-C
    UntilSignal,
}

/// Build the pool, check the database and shut down gracefully
pub async fn run(config: AppConfig, mode: RunMode) -> AppResult<()> {
    let context = AppContext::new(config);
    let ready = check_readiness(&context).await;

    let signal = match mode {
        RunMode::Once => None,
        RunMode::UntilSignal => Some(tokio::signal::ctrl_c()),
    };
    settle(&context, ready, signal).await
}

/// Wait for the signal if the readiness check succeeded, then drain the pool
///
/// The pool is closed on every path, including a failed signal handler.
async fn settle<F>(context: &AppContext, ready: AppResult<()>, signal: Option<F>) -> AppResult<()>
where
    F: Future<Output = io::Result<()>>,
{
    let result = match (ready, signal) {
        (Ok(()), Some(signal)) => {
            info!("Pool ready; press Ctrl-C to shut down");
            signal
                .await
                .map(|()| info!("Shutdown signal received"))
                .map_err(AppError::internal)
        }
        (ready, _) => ready,
    };

    context.shutdown().await;
    result
}

async fn check_readiness(context: &AppContext) -> AppResult<()> {
    let pool = context.pool().await?;
    pool.health_check().await?;

    let status = pool.status();
    info!(
        size = status.size,
        idle = status.idle,
        max_connections = status.max_connections,
        "Database reachable"
    );
    Ok(())
}
