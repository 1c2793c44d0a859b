//! Integration tests for the Postgres push event repository.
//!
//! These need a server: run with `DATABASE_URL` set and `--ignored`.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use lastpush_core::{
    storage::{within_budget, MIGRATOR},
    CoreError, EventStore, NewPushEvent, PostgresEventStore, Storage,
};
use lastpush_testing::TestDatabase;
use serde_json::json;

fn push(name: &str, commit_at: DateTime<Utc>) -> NewPushEvent {
    NewPushEvent::new(
        name,
        format!("{name}@x.com"),
        json!({"pusher": {"name": name}, "ref": "refs/heads/main"}),
        commit_at,
    )
    .unwrap()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn storage_health_check() {
    let db = TestDatabase::new().await.unwrap();
    let storage = Storage::new(db.pool().clone());

    assert!(storage.health_check().await.is_ok());

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn round_trip_keeps_identity_and_utc_commit_time() {
    let db = TestDatabase::new().await.unwrap();
    let storage = Storage::new(db.pool().clone());
    let commit_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let id = storage.push_events.create(&push("alice", commit_at)).await.unwrap();
    let stored = storage.push_events.find_by_id(id).await.unwrap().unwrap();

    assert_eq!(stored.id, id);
    assert_eq!(stored.pusher_name, "alice");
    assert_eq!(stored.pusher_email, "alice@x.com");
    assert_eq!(stored.commit_at, commit_at);
    assert_eq!(stored.payload["ref"], "refs/heads/main");
    assert!(stored.created_at >= commit_at);

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn latest_by_pusher_orders_by_commit_time_then_id() {
    let db = TestDatabase::new().await.unwrap();
    let repo = Storage::new(db.pool().clone()).push_events;
    let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

    repo.create(&push("alice", late)).await.unwrap();
    repo.create(&push("alice", early)).await.unwrap();
    let tie = repo.create(&push("alice", late)).await.unwrap();
    repo.create(&push("bob", Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())).await.unwrap();

    let latest = repo.find_latest_by_pusher("alice").await.unwrap().unwrap();
    assert_eq!(latest.id, tie);
    assert_eq!(latest.commit_at, late);

    assert_eq!(repo.count_by_pusher("alice").await.unwrap(), 3);
    assert!(repo.find_latest_by_pusher("carol").await.unwrap().is_none());

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn transaction_rollback_discards_insert() {
    let db = TestDatabase::new().await.unwrap();
    let repo = Storage::new(db.pool().clone()).push_events;
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let mut tx = db.pool().begin().await.unwrap();
    repo.create_in_tx(&mut tx, &push("alice", at)).await.unwrap();
    assert!(repo.find_latest_by_pusher_in_tx(&mut tx, "alice").await.unwrap().is_some());
    tx.rollback().await.unwrap();

    assert!(repo.find_latest_by_pusher("alice").await.unwrap().is_none());

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn empty_pusher_name_violates_check_constraint() {
    let db = TestDatabase::new().await.unwrap();

    let err = sqlx::query(
        "INSERT INTO push_events (pusher_name, pusher_email, payload, commit_at) \
         VALUES ('', 'a@x.com', '{}', NOW())",
    )
    .execute(db.pool())
    .await
    .unwrap_err();

    assert!(matches!(CoreError::from(err), CoreError::ConstraintViolation(_)));

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn postgres_store_serves_event_store_trait() {
    let db = TestDatabase::new().await.unwrap();
    let store: Arc<dyn EventStore> =
        Arc::new(PostgresEventStore::new(Arc::new(Storage::new(db.pool().clone()))));
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let id = within_budget(
        "insert_push_event",
        std::time::Duration::from_secs(2),
        store.insert(push("alice", at)),
    )
    .await
    .unwrap();
    let latest = store.latest_for_pusher("alice").await.unwrap().unwrap();

    assert_eq!(latest.id, id);
    assert!(store.health_check().await.is_ok());

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn migrations_roll_back_cleanly() {
    let db = TestDatabase::new().await.unwrap();

    MIGRATOR.undo(db.pool(), 0).await.unwrap();
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = 'push_events')",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert!(!exists);

    MIGRATOR.run(db.pool()).await.unwrap();

    db.cleanup().await.unwrap();
}
