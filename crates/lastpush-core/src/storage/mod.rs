//! Database access layer for push events.
//!
//! `Storage` owns the Postgres repositories. Request handlers do not use it
//! directly: they go through the `EventStore` trait so the HTTP layer can
//! be exercised against the in-memory `mock::MockEventStore`.
//!
//! Schema changes ship as reversible migrations embedded in `MIGRATOR`.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use sqlx::{migrate::Migrator, PgPool};

pub mod push_events;

use crate::{
    error::{CoreError, Result},
    models::{EventId, NewPushEvent, PushEvent},
};

/// Embedded schema migrations, applied in version order.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Container for all repository instances providing unified database access.
#[derive(Clone)]
pub struct Storage {
    /// Repository for push event operations.
    pub push_events: Arc<push_events::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self { push_events: Arc::new(push_events::Repository::new(pool)) }
    }

    /// Performs a health check on the database connection.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.push_events.pool()).await?;

        Ok(())
    }
}

/// Store operations required by the webhook and report handlers.
pub trait EventStore: Send + Sync + 'static {
    /// Appends a push event and returns its identifier.
    fn insert(&self, event: NewPushEvent) -> Pin<Box<dyn Future<Output = Result<EventId>> + Send + '_>>;

    /// Finds the event with the newest `commit_at` for `pusher_name`.
    ///
    /// Ties resolve to the most recently inserted event. Returns `None`
    /// when nothing has been recorded for the pusher.
    fn latest_for_pusher<'a>(
        &'a self,
        pusher_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<PushEvent>>> + Send + 'a>>;

    /// Verifies the store is reachable.
    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production store implementation using PostgreSQL.
pub struct PostgresEventStore {
    storage: Arc<Storage>,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL store adapter.
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl EventStore for PostgresEventStore {
    fn insert(&self, event: NewPushEvent) -> Pin<Box<dyn Future<Output = Result<EventId>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.push_events.create(&event).await })
    }

    fn latest_for_pusher<'a>(
        &'a self,
        pusher_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<PushEvent>>> + Send + 'a>> {
        Box::pin(async move { self.storage.push_events.find_latest_by_pusher(pusher_name).await })
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.storage.health_check().await })
    }
}

/// Runs a store operation under a time budget.
///
/// # Errors
///
/// Returns `CoreError::Timeout` when `budget` elapses first, otherwise the
/// operation's own result.
pub async fn within_budget<T, F>(operation: &'static str, budget: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::Timeout {
            operation,
            after_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

pub mod mock {
    //! In-memory store for tests.
    //!
    //! Mirrors the Postgres semantics the handlers rely on: sequential
    //! identifiers, the non-empty pusher constraint, and newest-commit
    //! ordering with insertion order as tie-breaker. Failures and latency
    //! can be injected to exercise timeout and unavailability paths.

    use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

    use chrono::Utc;
    use tokio::sync::RwLock;

    use super::{EventStore, Result};
    use crate::{
        error::CoreError,
        models::{EventId, NewPushEvent, PushEvent},
    };

    /// Mock store keeping push events in memory.
    #[derive(Clone, Default)]
    pub struct MockEventStore {
        events: Arc<RwLock<Vec<PushEvent>>>,
        failure: Arc<RwLock<Option<String>>>,
        latency: Arc<RwLock<Option<Duration>>>,
    }

    impl MockEventStore {
        /// Creates a new mock store with empty state.
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent operation fail with a database error.
        pub async fn fail_with(&self, message: impl Into<String>) {
            *self.failure.write().await = Some(message.into());
        }

        /// Clears an injected failure.
        pub async fn recover(&self) {
            *self.failure.write().await = None;
        }

        /// Delays every subsequent operation by `latency`.
        pub async fn set_latency(&self, latency: Duration) {
            *self.latency.write().await = Some(latency);
        }

        /// Returns a snapshot of all stored events in insertion order.
        pub async fn events(&self) -> Vec<PushEvent> {
            self.events.read().await.clone()
        }

        /// Returns the number of stored events.
        pub async fn len(&self) -> usize {
            self.events.read().await.len()
        }

        /// Returns whether no events are stored.
        pub async fn is_empty(&self) -> bool {
            self.events.read().await.is_empty()
        }

        async fn before_operation(&self) -> Result<()> {
            let latency = *self.latency.read().await;
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            match self.failure.read().await.as_ref() {
                Some(message) => Err(CoreError::Database(message.clone())),
                None => Ok(()),
            }
        }
    }

    impl EventStore for MockEventStore {
        fn insert(
            &self,
            event: NewPushEvent,
        ) -> Pin<Box<dyn Future<Output = Result<EventId>> + Send + '_>> {
            Box::pin(async move {
                self.before_operation().await?;

                let mut events = self.events.write().await;
                let id = EventId(i64::try_from(events.len()).unwrap_or(i64::MAX) + 1);
                events.push(event.into_stored(id, Utc::now()));
                Ok(id)
            })
        }

        fn latest_for_pusher<'a>(
            &'a self,
            pusher_name: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Option<PushEvent>>> + Send + 'a>> {
            Box::pin(async move {
                self.before_operation().await?;

                let events = self.events.read().await;
                Ok(events
                    .iter()
                    .filter(|event| event.pusher_name == pusher_name)
                    .max_by_key(|event| (event.commit_at, event.id))
                    .cloned())
            })
        }

        fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move { self.before_operation().await })
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    use super::{mock::MockEventStore, *};

    fn push(name: &str, commit_at: DateTime<Utc>) -> NewPushEvent {
        NewPushEvent::new(name, format!("{name}@x.com"), json!({}), commit_at).unwrap()
    }

    #[tokio::test]
    async fn storage_can_be_created() {
        let pool = sqlx::PgPool::connect_lazy("postgresql://test").unwrap();
        let _storage = Storage::new(pool);
    }

    #[test]
    fn migrations_are_embedded_in_order() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();

        assert!(!versions.is_empty());
        assert_eq!(versions, sorted);
    }

    #[tokio::test]
    async fn mock_store_returns_newest_commit() {
        let store = MockEventStore::new();
        let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        store.insert(push("alice", newer)).await.unwrap();
        store.insert(push("alice", older)).await.unwrap();
        store.insert(push("bob", newer)).await.unwrap();

        let latest = store.latest_for_pusher("alice").await.unwrap().unwrap();
        assert_eq!(latest.commit_at, newer);
        assert_eq!(latest.id, EventId(1));
    }

    #[tokio::test]
    async fn mock_store_breaks_ties_by_insertion_order() {
        let store = MockEventStore::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        store.insert(push("alice", at)).await.unwrap();
        let second = store.insert(push("alice", at)).await.unwrap();

        let latest = store.latest_for_pusher("alice").await.unwrap().unwrap();
        assert_eq!(latest.id, second);
    }

    #[tokio::test]
    async fn mock_store_injected_failure() {
        let store = MockEventStore::new();
        store.fail_with("connection refused").await;

        assert!(matches!(store.health_check().await, Err(CoreError::Database(_))));

        store.recover().await;
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn within_budget_times_out_slow_operations() {
        let store = MockEventStore::new();
        store.set_latency(Duration::from_millis(200)).await;

        let result =
            within_budget("latest_push", Duration::from_millis(10), store.latest_for_pusher("alice"))
                .await;

        assert!(matches!(result, Err(CoreError::Timeout { operation: "latest_push", after_ms: 10 })));
    }

    #[tokio::test]
    async fn within_budget_passes_through_results() {
        let store = MockEventStore::new();

        let result =
            within_budget("latest_push", Duration::from_secs(1), store.latest_for_pusher("alice"))
                .await
                .unwrap();

        assert!(result.is_none());
    }
}
