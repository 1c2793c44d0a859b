//! Connection pool setup.

use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};
use log::LevelFilter;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use tracing::{info, warn};

use crate::Config;

const MAX_RETRIES: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Builds connection options from a database URL.
///
/// With `query_debug` on, every statement is logged at `info`; otherwise
/// statements stay at `debug`.
///
/// # Errors
///
/// Returns an error if the URL cannot be parsed.
pub fn connect_options(database_url: &str, query_debug: bool) -> Result<PgConnectOptions> {
    let level = if query_debug { LevelFilter::Info } else { LevelFilter::Debug };

    Ok(PgConnectOptions::from_str(database_url)
        .context("Invalid DATABASE_URL")?
        .log_statements(level)
        .log_slow_statements(LevelFilter::Warn, Duration::from_secs(1)))
}

/// Creates the database connection pool with retry logic.
///
/// # Errors
///
/// Returns an error when the URL is invalid or every attempt fails.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let options = connect_options(&config.database_url, config.query_debug)?;
    let mut retries = 0;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connection_timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect_with(options.clone())
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                info!(
                    database_url = %config.database_url_masked(),
                    max_connections = config.database_max_connections,
                    "Database connection pool established"
                );
                return Ok(pool);
            },
            Err(e) if retries < MAX_RETRIES => {
                retries += 1;
                warn!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}
