//! Last-push report for the monitored user.

use axum::{extract::State, Json};
use lastpush_core::{storage::within_budget, LastPushReport};
use tracing::{debug, error, instrument};

use crate::{error::ApiError, AppState};

/// Reports hours elapsed since the monitored user's newest recorded commit.
///
/// # Errors
///
/// - 404: nothing recorded for the monitored user
/// - 503: the store failed or exceeded its budget
#[instrument(name = "last_push", skip(state))]
pub async fn last_push(State(state): State<AppState>) -> Result<Json<LastPushReport>, ApiError> {
    let pusher_name = state.webhook.monitored_username.as_str();

    let latest = within_budget(
        "latest_push_event",
        state.webhook.store_timeout,
        state.store.latest_for_pusher(pusher_name),
    )
    .await
    .map_err(|e| {
        error!(error = %e, pusher_name, "Failed to load latest push event");
        ApiError::from(e)
    })?;

    let Some(event) = latest else {
        debug!(pusher_name, "No push recorded for monitored user");
        return Err(ApiError::NoPushRecorded { pusher_name: pusher_name.to_string() });
    };

    let report = LastPushReport::new(&event, state.clock.now_utc());
    debug!(event_id = %event.id, pusher_name, old = report.old, "Last push report built");

    Ok(Json(report))
}
