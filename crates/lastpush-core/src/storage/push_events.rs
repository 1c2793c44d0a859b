//! Repository for push event database operations.
//!
//! Push events are append-only. The repository exposes inserts and reads
//! only; there is deliberately no update or delete statement here.

use std::sync::Arc;

use sqlx::{Executor, PgPool, Postgres, Transaction};

use crate::{
    error::Result,
    models::{EventId, NewPushEvent, PushEvent},
};

/// Repository for push event database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Appends a push event and returns its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails or a constraint is violated.
    pub async fn create(&self, event: &NewPushEvent) -> Result<EventId> {
        self.create_impl(&*self.pool, event).await
    }

    /// Appends a push event within a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: &NewPushEvent,
    ) -> Result<EventId> {
        self.create_impl(&mut **tx, event).await
    }

    async fn create_impl<'e, E>(&self, executor: E, event: &NewPushEvent) -> Result<EventId>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO push_events (pusher_name, pusher_email, payload, commit_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(event.pusher_name())
        .bind(event.pusher_email())
        .bind(event.payload())
        .bind(event.commit_at())
        .fetch_one(executor)
        .await?;

        Ok(EventId(id))
    }

    /// Finds a push event by identifier.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn find_by_id(&self, id: EventId) -> Result<Option<PushEvent>> {
        let event = sqlx::query_as::<_, PushEvent>(
            r#"
            SELECT id, pusher_name, pusher_email, payload, created_at, updated_at, commit_at
            FROM push_events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(event)
    }

    /// Finds the push event with the newest commit for a pusher.
    ///
    /// Ties on `commit_at` resolve to the most recently inserted row.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn find_latest_by_pusher(&self, pusher_name: &str) -> Result<Option<PushEvent>> {
        self.find_latest_by_pusher_impl(&*self.pool, pusher_name).await
    }

    /// Finds the newest push event for a pusher within a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn find_latest_by_pusher_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        pusher_name: &str,
    ) -> Result<Option<PushEvent>> {
        self.find_latest_by_pusher_impl(&mut **tx, pusher_name).await
    }

    async fn find_latest_by_pusher_impl<'e, E>(
        &self,
        executor: E,
        pusher_name: &str,
    ) -> Result<Option<PushEvent>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let event = sqlx::query_as::<_, PushEvent>(
            r#"
            SELECT id, pusher_name, pusher_email, payload, created_at, updated_at, commit_at
            FROM push_events
            WHERE pusher_name = $1
            ORDER BY commit_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(pusher_name)
        .fetch_optional(executor)
        .await?;

        Ok(event)
    }

    /// Counts the push events recorded for a pusher.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count_by_pusher(&self, pusher_name: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM push_events WHERE pusher_name = $1")
            .bind(pusher_name)
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
