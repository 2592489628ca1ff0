//! Application intake service.
//!
//! Loads configuration, connects to Postgres, makes sure the
//! `applications` table exists, and serves HTTP until SIGINT or SIGTERM.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use intake_api::{start_server, AppState, Config};
use intake_core::Storage;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

const MAX_CONNECT_RETRIES: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config.rust_log)?;

    info!(
        database_url = %config.database_url_masked(),
        host = %config.host,
        port = config.port,
        max_connections = config.database_max_connections,
        "Configuration loaded"
    );

    let addr = config.parse_server_addr()?;
    let policy = config.to_http_policy()?;

    let pool = create_database_pool(&config).await?;
    let storage = Storage::new(pool);
    storage.ensure_schema().await.context("Failed to create applications table")?;
    info!("Database ready");

    let state = AppState::new(Arc::new(storage.clone()));
    let served = start_server(state, &policy, addr).await;

    storage.close().await;
    info!("Database connections closed");

    served.context("HTTP server failed")
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_tracing(default_directives: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives))
        .context("Invalid log filter")?;

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")
}

/// Connects to Postgres, retrying while the database comes up.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    let mut retries = 0;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(config.database_acquire_timeout())
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) if retries < MAX_CONNECT_RETRIES => {
                retries += 1;
                warn!(
                    attempt = retries,
                    max_retries = MAX_CONNECT_RETRIES,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to connect to the database after retries");
            },
        }
    }
}
