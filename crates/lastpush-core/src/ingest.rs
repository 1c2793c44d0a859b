//! Push payload extraction.
//!
//! Turns a decoded webhook body into a `NewPushEvent`. Deliveries that lack
//! the pusher identity or the head commit are not errors: hosts send pings
//! and branch deletions through the same hook, so those are reported as a
//! `SkipReason` and the caller acknowledges them without recording.
//!
//! A head commit whose timestamp is missing or not RFC3339 is still
//! recorded, with `commit_at` set to the default timestamp.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::models::NewPushEvent;

/// Why a delivery was accepted without being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// `pusher` is absent or not an object.
    #[error("payload has no pusher object")]
    MissingPusher,

    /// `pusher.name` is absent, empty, or not a string.
    #[error("payload has no pusher name")]
    MissingPusherName,

    /// `pusher.email` is absent, empty, or not a string.
    #[error("payload has no pusher email")]
    MissingPusherEmail,

    /// `head_commit` is absent or not an object.
    #[error("payload has no head commit")]
    MissingHeadCommit,
}

impl SkipReason {
    /// Short machine-readable label used in responses and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingPusher => "missing_pusher",
            Self::MissingPusherName => "missing_pusher_name",
            Self::MissingPusherEmail => "missing_pusher_email",
            Self::MissingHeadCommit => "missing_head_commit",
        }
    }
}

/// Extracts a push event from a decoded webhook payload.
///
/// The whole payload is kept verbatim on the returned event.
///
/// # Errors
///
/// Returns the `SkipReason` when the payload lacks a required substructure.
pub fn extract_push(payload: Map<String, Value>) -> Result<NewPushEvent, SkipReason> {
    let pusher = payload.get("pusher").and_then(Value::as_object).ok_or(SkipReason::MissingPusher)?;
    let pusher_name = non_empty_str(pusher, "name").ok_or(SkipReason::MissingPusherName)?;
    let pusher_email = non_empty_str(pusher, "email").ok_or(SkipReason::MissingPusherEmail)?;

    let head_commit =
        payload.get("head_commit").and_then(Value::as_object).ok_or(SkipReason::MissingHeadCommit)?;

    let commit_at = parse_commit_timestamp(head_commit.get("timestamp")).unwrap_or_else(|| {
        warn!(
            pusher_name = %pusher_name,
            "head commit timestamp missing or malformed, using default timestamp"
        );
        DateTime::<Utc>::default()
    });

    let pusher_name = pusher_name.to_string();
    let pusher_email = pusher_email.to_string();

    build_event(pusher_name, pusher_email, Value::Object(payload), commit_at)
}

/// Builds the event, naming the identity field the model rejected.
fn build_event(
    pusher_name: String,
    pusher_email: String,
    payload: Value,
    commit_at: DateTime<Utc>,
) -> Result<NewPushEvent, SkipReason> {
    let reason = if pusher_name.is_empty() {
        SkipReason::MissingPusherName
    } else {
        SkipReason::MissingPusherEmail
    };

    NewPushEvent::new(pusher_name, pusher_email, payload, commit_at).map_err(|_| reason)
}

/// Parses a head commit timestamp as RFC3339 and normalizes it to UTC.
///
/// Returns `None` for absent, non-string, or unparseable values.
pub fn parse_commit_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.with_timezone(&Utc))
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
