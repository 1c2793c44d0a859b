//! lastpush service.
//!
//! Records signed push webhooks and reports how long ago the monitored user
//! last pushed. Wires configuration, logging, the database pool, and the
//! HTTP server together.

use std::sync::Arc;

use anyhow::{Context, Result};
use lastpush_api::{database, telemetry::init_tracing, AppState, Config};
use lastpush_core::{storage::MIGRATOR, PostgresEventStore, RealClock, Storage};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal outside development.
    let dotenv = dotenvy::dotenv();

    let config = Config::load()?;
    init_tracing(&config.rust_log, config.log_format)?;

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    info!(
        database_url = %config.database_url_masked(),
        host = %config.host,
        port = config.port,
        monitored_username = %config.monitored_username,
        store_timeout_ms = config.store_timeout_ms,
        "Configuration loaded"
    );

    let addr = config.parse_server_addr()?;
    let pool = database::create_pool(&config).await?;

    if config.migrate_on_start {
        MIGRATOR.run(&pool).await.context("Failed to run database migrations")?;
        info!("Database migrations completed");
    }

    let storage = Arc::new(Storage::new(pool.clone()));
    let state = AppState::new(
        Arc::new(PostgresEventStore::new(storage)),
        Arc::new(RealClock::new()),
        config.to_webhook_settings(),
    );

    info!(addr = %addr, "lastpush is ready to receive webhooks");

    lastpush_api::start_server(state, addr, config.request_timeout())
        .await
        .context("HTTP server failed")?;

    pool.close().await;
    info!("Database connections closed");

    Ok(())
}
