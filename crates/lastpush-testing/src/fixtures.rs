//! Push payload builders for deterministic tests.
//!
//! Payloads follow the shape of a GitHub `push` delivery, trimmed to the
//! fields the ingestor reads plus a little realistic noise.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

/// Builder for push delivery payloads.
#[derive(Debug, Clone)]
pub struct PushPayloadBuilder {
    pusher_name: Option<Value>,
    pusher_email: Option<Value>,
    include_pusher: bool,
    include_head_commit: bool,
    timestamp: Option<Value>,
    extra: Map<String, Value>,
}

impl PushPayloadBuilder {
    /// Creates a builder for the canonical payload: `alice` pushing a
    /// commit dated `2024-01-01T00:00:00Z`.
    pub fn new() -> Self {
        Self {
            pusher_name: Some(json!("alice")),
            pusher_email: Some(json!("alice@x.com")),
            include_pusher: true,
            include_head_commit: true,
            timestamp: Some(json!("2024-01-01T00:00:00Z")),
            extra: Map::new(),
        }
    }

    /// Sets the pusher name.
    #[must_use]
    pub fn pusher_name(mut self, name: impl Into<String>) -> Self {
        self.pusher_name = Some(Value::String(name.into()));
        self
    }

    /// Sets the pusher email.
    #[must_use]
    pub fn pusher_email(mut self, email: impl Into<String>) -> Self {
        self.pusher_email = Some(Value::String(email.into()));
        self
    }

    /// Sets name and email together, deriving the email from the name.
    #[must_use]
    pub fn pusher(self, name: &str) -> Self {
        self.pusher_name(name).pusher_email(format!("{name}@x.com"))
    }

    /// Drops `pusher.name`.
    #[must_use]
    pub fn without_pusher_name(mut self) -> Self {
        self.pusher_name = None;
        self
    }

    /// Drops `pusher.email`.
    #[must_use]
    pub fn without_pusher_email(mut self) -> Self {
        self.pusher_email = None;
        self
    }

    /// Drops the whole `pusher` object.
    #[must_use]
    pub fn without_pusher(mut self) -> Self {
        self.include_pusher = false;
        self
    }

    /// Drops the whole `head_commit` object.
    #[must_use]
    pub fn without_head_commit(mut self) -> Self {
        self.include_head_commit = false;
        self
    }

    /// Sets the head commit timestamp.
    #[must_use]
    pub fn committed_at(self, at: DateTime<Utc>) -> Self {
        self.raw_timestamp(json!(at.to_rfc3339_opts(SecondsFormat::Secs, true)))
    }

    /// Sets the head commit timestamp to an arbitrary JSON value.
    #[must_use]
    pub fn raw_timestamp(mut self, value: Value) -> Self {
        self.timestamp = Some(value);
        self
    }

    /// Drops `head_commit.timestamp`.
    #[must_use]
    pub fn without_timestamp(mut self) -> Self {
        self.timestamp = None;
        self
    }

    /// Adds a top-level field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Builds the payload as a JSON value.
    pub fn build(self) -> Value {
        let mut payload = Map::new();
        payload.insert("ref".to_string(), json!("refs/heads/main"));
        payload.insert("repository".to_string(), json!({"full_name": "alice/dotfiles"}));

        if self.include_pusher {
            let mut pusher = Map::new();
            if let Some(name) = self.pusher_name {
                pusher.insert("name".to_string(), name);
            }
            if let Some(email) = self.pusher_email {
                pusher.insert("email".to_string(), email);
            }
            payload.insert("pusher".to_string(), Value::Object(pusher));
        }

        if self.include_head_commit {
            let mut head_commit = Map::new();
            head_commit.insert("id".to_string(), json!("0d1a26e67d8f5eaf1f6ba5c57fc3c7d91ac0fd1c"));
            head_commit.insert("message".to_string(), json!("Update README"));
            if let Some(timestamp) = self.timestamp {
                head_commit.insert("timestamp".to_string(), timestamp);
            }
            payload.insert("head_commit".to_string(), Value::Object(head_commit));
        }

        payload.extend(self.extra);
        Value::Object(payload)
    }

    /// Builds the payload as serialized JSON bytes.
    pub fn to_bytes(self) -> Vec<u8> {
        self.build().to_string().into_bytes()
    }
}

impl Default for PushPayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory functions for common delivery shapes.
pub mod scenarios {
    use serde_json::json;

    use super::PushPayloadBuilder;

    /// The canonical push from `alice`.
    pub fn canonical_push() -> Vec<u8> {
        PushPayloadBuilder::new().to_bytes()
    }

    /// A `ping` delivery sent when a hook is created.
    pub fn ping_delivery() -> Vec<u8> {
        json!({"zen": "Keep it logically awesome.", "hook_id": 1}).to_string().into_bytes()
    }

    /// A branch deletion, which carries no head commit.
    pub fn branch_deletion() -> Vec<u8> {
        PushPayloadBuilder::new().without_head_commit().field("deleted", json!(true)).to_bytes()
    }
}
