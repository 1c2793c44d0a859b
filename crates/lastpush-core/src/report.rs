//! Last-push report for the monitored identity.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::models::PushEvent;

const NANOS_PER_HOUR: f64 = 3_600_000_000_000.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// How long ago a pusher last pushed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastPushReport {
    /// Name of the pusher.
    pub pusher_name: String,
    /// Email of the pusher.
    pub pusher_email: String,
    /// Commit timestamp of the newest push, rendered as RFC3339.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub commit_at: DateTime<Utc>,
    /// Hours elapsed between `commit_at` and the report time.
    pub old: f64,
}

impl LastPushReport {
    /// Builds a report for `event` as seen at `now`.
    pub fn new(event: &PushEvent, now: DateTime<Utc>) -> Self {
        Self {
            pusher_name: event.pusher_name.clone(),
            pusher_email: event.pusher_email.clone(),
            commit_at: event.commit_at,
            old: elapsed_hours(event.commit_at, now),
        }
    }
}

/// Hours from `from` to `to` as a float; negative when `to` is earlier.
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to.signed_duration_since(from);
    // Nanosecond precision overflows past ~292 years; fall back to millis.
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / NANOS_PER_HOUR,
        None => delta.num_milliseconds() as f64 / MILLIS_PER_HOUR,
    }
}

fn serialize_rfc3339<S: Serializer>(
    ts: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}
