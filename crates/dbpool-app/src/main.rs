//! Pool readiness check entry point
//!
//! Run with:
//! ```bash
//! cargo run -p dbpool-app --bin dbpool-check
//! ```
//!
//! Configuration is loaded from environment variables or a `.env` file.
//! Set `DBPOOL_CHECK_ONCE` to exit right after the readiness check instead of
//! waiting for Ctrl-C.

use dbpool_app::RunMode;
use dbpool_common::{try_init_tracing_with_config, AppConfig, AppError, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    // Initialize tracing
    let tracing_config = config
        .as_ref()
        .map_or_else(|_| TracingConfig::default(), |c| TracingConfig::for_environment(c.app.env));
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let result = match config {
        Ok(config) => {
            info!(
                app = %config.app.name,
                env = ?config.app.env,
                host = %config.database.host,
                database = %config.database.database,
                "Configuration loaded"
            );
            dbpool_app::run(config, run_mode()).await
        }
        Err(e) => Err(AppError::from(e)),
    };

    if let Err(e) = result {
        error!(code = e.error_code(), error = %e, "Pool check failed");
        std::process::exit(e.exit_code());
    }
}

fn run_mode() -> RunMode {
    if std::env::var_os("DBPOOL_CHECK_ONCE").is_some() {
        RunMode::Once
    } else {
        RunMode::UntilSignal
    }
}
