//! Schema migration tool.
//!
//! `MIGRATE_DIRECTION=up` (default) applies pending migrations;
//! `MIGRATE_DIRECTION=down` reverts the latest applied one.

use anyhow::{Context, Result};
use lastpush_api::{
    database::connect_options, telemetry::init_tracing, MigrateDirection, MigrationConfig,
};
use lastpush_core::storage::MIGRATOR;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();

    let config = MigrationConfig::load()?;
    init_tracing(&config.rust_log, config.log_format)?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(&config.database_url, config.query_debug)?)
        .await
        .context("Failed to connect to database")?;

    match config.migrate_direction {
        MigrateDirection::Up => {
            MIGRATOR.run(&pool).await.context("Failed to apply migrations")?;
            info!(latest = ?applied_versions(&pool).await?.first(), "Migrated up");
        },
        MigrateDirection::Down => {
            let applied = applied_versions(&pool).await?;
            match applied.first() {
                Some(&latest) => {
                    let target = applied.get(1).copied().unwrap_or(0);
                    MIGRATOR.undo(&pool, target).await.context("Failed to revert migration")?;
                    info!(reverted = latest, now_at = target, "Migrated down");
                },
                None => info!("No applied migrations to revert"),
            }
        },
    }

    pool.close().await;
    Ok(())
}

/// Applied migration versions, newest first.
async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>> {
    let table_exists: bool =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await
            .context("Failed to inspect migration table")?;
    if !table_exists {
        return Ok(Vec::new());
    }

    sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version DESC")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")
}
