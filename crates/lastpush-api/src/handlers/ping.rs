//! Reachability probe.

use axum::Json;
use serde::Serialize;

/// Body of `GET /ping`.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    /// Always `pong`.
    pub message: &'static str,
}

/// Answers `{"message":"pong"}`.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { message: "pong" })
}
