//! Isolated Postgres databases for repository tests.
//!
//! Each `TestDatabase` is a fresh database created on the server named by
//! `DATABASE_URL`, migrated with the embedded migrations. Tests that use it
//! are `#[ignore]`d so the default test run needs no server.

use std::time::Duration;

use anyhow::{Context, Result};
use lastpush_core::storage::MIGRATOR;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Test database handle owning its own PostgreSQL database.
#[derive(Debug)]
pub struct TestDatabase {
    pool: PgPool,
    admin_pool: PgPool,
    database_name: String,
}

impl TestDatabase {
    /// Creates and migrates a fresh database.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is unset or the server rejects
    /// any step.
    pub async fn new() -> Result<Self> {
        let base = base_options()?;
        let admin_pool = connect(base.clone().database("postgres"))
            .await
            .context("failed to connect to admin database")?;

        let database_name = format!("lastpush_test_{}", Uuid::new_v4().simple());
        sqlx::query(&format!("CREATE DATABASE \"{database_name}\""))
            .execute(&admin_pool)
            .await
            .with_context(|| format!("failed to create database {database_name}"))?;

        let pool = connect(base.database(&database_name))
            .await
            .with_context(|| format!("failed to connect to database {database_name}"))?;

        MIGRATOR.run(&pool).await.context("failed to run migrations")?;

        info!("created isolated test database: {}", database_name);

        Ok(Self { pool, admin_pool, database_name })
    }

    /// Access to the database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the database name.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Closes the pool and drops the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be dropped.
    pub async fn cleanup(self) -> Result<()> {
        self.pool.close().await;

        if let Err(e) =
            sqlx::query(&format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.database_name))
                .execute(&self.admin_pool)
                .await
        {
            warn!(error = %e, "forced drop failed, retrying plain drop");
            sqlx::query(&format!("DROP DATABASE IF EXISTS \"{}\"", self.database_name))
                .execute(&self.admin_pool)
                .await
                .with_context(|| format!("failed to drop database: {}", self.database_name))?;
        }

        debug!("dropped test database {}", self.database_name);
        Ok(())
    }
}

fn base_options() -> Result<PgConnectOptions> {
    std::env::var("DATABASE_URL")
        .context("DATABASE_URL environment variable is required")?
        .parse::<PgConnectOptions>()
        .context("failed to parse DATABASE_URL")
}

async fn connect(options: PgConnectOptions) -> Result<PgPool> {
    Ok(PgPoolOptions::new()
        .max_connections(2)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?)
}
