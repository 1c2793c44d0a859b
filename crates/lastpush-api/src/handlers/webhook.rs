//! Push delivery ingestion.
//!
//! Runs after the signature gate. Decodes the body, extracts the pusher
//! and head commit, and appends one event to the store.

use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use lastpush_core::{extract_push, storage::within_budget, EventId};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::{error::ApiError, AppState};

const ACK_MESSAGE: &str = "cool";

/// Response to an accepted delivery.
#[derive(Debug, Serialize)]
pub struct PushAck {
    /// Always `cool`.
    pub message: &'static str,
    /// Whether an event was stored.
    pub recorded: bool,
    /// Identifier of the stored event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    /// Why the delivery was not stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl PushAck {
    fn recorded(event_id: EventId) -> Self {
        Self { message: ACK_MESSAGE, recorded: true, event_id: Some(event_id), reason: None }
    }

    fn skipped(reason: &'static str) -> Self {
        Self { message: ACK_MESSAGE, recorded: false, event_id: None, reason: Some(reason) }
    }
}

/// Records a signed push delivery.
///
/// # Errors
///
/// - 400: body is not a JSON object
/// - 503: the store failed or exceeded its budget
#[instrument(
    name = "receive_push",
    skip(state, headers, body),
    fields(
        delivery = headers.get("x-github-delivery").and_then(|v| v.to_str().ok()).unwrap_or("none"),
        event = headers.get("x-github-event").and_then(|v| v.to_str().ok()).unwrap_or("none"),
        body_len = body.len(),
    )
)]
pub async fn receive_push(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PushAck>, ApiError> {
    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("Payload is not a JSON object");
            return Err(ApiError::MalformedPayload("payload must be a JSON object".to_string()));
        },
        Err(e) => {
            warn!(error = %e, "Payload is not valid JSON");
            return Err(ApiError::MalformedPayload(e.to_string()));
        },
    };

    let event = match extract_push(payload) {
        Ok(event) => event,
        Err(reason) => {
            warn!(reason = reason.as_str(), "{reason}, delivery not recorded");
            return Ok(Json(PushAck::skipped(reason.as_str())));
        },
    };

    let pusher_name = event.pusher_name().to_string();
    let commit_at = event.commit_at();

    let event_id =
        within_budget("insert_push_event", state.webhook.store_timeout, state.store.insert(event))
            .await
            .map_err(|e| {
                error!(error = %e, pusher_name = %pusher_name, "Failed to record push event");
                ApiError::from(e)
            })?;

    info!(
        event_id = %event_id,
        pusher_name = %pusher_name,
        commit_at = %commit_at,
        "Push event recorded"
    );

    Ok(Json(PushAck::recorded(event_id)))
}
