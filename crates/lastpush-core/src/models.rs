//! Push event model and strongly-typed identifiers.
//!
//! A `PushEvent` is one accepted webhook delivery as stored in the
//! `push_events` table. Rows are append-only: the model has no update
//! path, and `commit_at` is a `DateTime<Utc>` so it is always normalized
//! before it reaches the database.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Store-assigned event identifier.
///
/// Backed by a `BIGSERIAL` column, so identifiers grow with insertion
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl sqlx::Type<PgDb> for EventId {
    fn type_info() -> PgTypeInfo {
        <i64 as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for EventId {
    fn decode(value: PgValueRef<'r>) -> std::result::Result<Self, BoxDynError> {
        let id = <i64 as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(id))
    }
}

impl sqlx::Encode<'_, PgDb> for EventId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <i64 as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// A stored push event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PushEvent {
    /// Store-assigned identifier.
    pub id: EventId,

    /// Name of the user who pushed.
    pub pusher_name: String,

    /// Email of the user who pushed.
    pub pusher_email: String,

    /// The full decoded webhook payload, kept for audit and debugging.
    pub payload: serde_json::Value,

    /// When the row was inserted.
    pub created_at: DateTime<Utc>,

    /// Bookkeeping timestamp; equal to `created_at` since rows never change.
    pub updated_at: DateTime<Utc>,

    /// Head commit timestamp, normalized to UTC.
    pub commit_at: DateTime<Utc>,
}

/// A validated push event ready for insertion.
///
/// Construction enforces the non-empty pusher identity invariant, so a
/// value of this type can always be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPushEvent {
    pusher_name: String,
    pusher_email: String,
    payload: serde_json::Value,
    commit_at: DateTime<Utc>,
}

impl NewPushEvent {
    /// Creates a new push event.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the pusher name or email is
    /// empty.
    pub fn new(
        pusher_name: impl Into<String>,
        pusher_email: impl Into<String>,
        payload: serde_json::Value,
        commit_at: DateTime<Utc>,
    ) -> Result<Self> {
        let pusher_name = pusher_name.into();
        let pusher_email = pusher_email.into();

        if pusher_name.is_empty() {
            return Err(CoreError::InvalidInput("pusher name must not be empty".to_string()));
        }
        if pusher_email.is_empty() {
            return Err(CoreError::InvalidInput("pusher email must not be empty".to_string()));
        }

        Ok(Self { pusher_name, pusher_email, payload, commit_at })
    }

    /// Name of the user who pushed.
    pub fn pusher_name(&self) -> &str {
        &self.pusher_name
    }

    /// Email of the user who pushed.
    pub fn pusher_email(&self) -> &str {
        &self.pusher_email
    }

    /// The decoded webhook payload.
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Head commit timestamp in UTC.
    pub fn commit_at(&self) -> DateTime<Utc> {
        self.commit_at
    }

    /// Materializes the stored row for this event.
    ///
    /// Used by stores that assign identifiers and bookkeeping timestamps
    /// outside the database.
    pub fn into_stored(self, id: EventId, inserted_at: DateTime<Utc>) -> PushEvent {
        PushEvent {
            id,
            pusher_name: self.pusher_name,
            pusher_email: self.pusher_email,
            payload: self.payload,
            created_at: inserted_at,
            updated_at: inserted_at,
            commit_at: self.commit_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn commit_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn new_push_event_rejects_empty_name() {
        let result = NewPushEvent::new("", "a@x.com", json!({}), commit_time());
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn new_push_event_rejects_empty_email() {
        let result = NewPushEvent::new("alice", "", json!({}), commit_time());
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn into_stored_keeps_fields() {
        let payload = json!({"ref": "refs/heads/main"});
        let event = NewPushEvent::new("alice", "a@x.com", payload.clone(), commit_time()).unwrap();
        let inserted_at = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let stored = event.into_stored(EventId(7), inserted_at);

        assert_eq!(stored.id, EventId(7));
        assert_eq!(stored.pusher_name, "alice");
        assert_eq!(stored.pusher_email, "a@x.com");
        assert_eq!(stored.payload, payload);
        assert_eq!(stored.commit_at, commit_time());
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[test]
    fn event_id_serializes_as_number() {
        assert_eq!(serde_json::to_value(EventId(42)).unwrap(), json!(42));
        assert_eq!(EventId(42).to_string(), "42");
    }
}
