//! Signature gate for webhook deliveries.
//!
//! Verification runs before any parsing or persistence. A rejected
//! request never reaches the handler.

use axum::{
    body::{self, Body},
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use tracing::{debug, warn};

use crate::{
    crypto::{verify_signature, SIGNATURE_HEADER},
    error::ApiError,
    AppState,
};

/// Largest body buffered for verification.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Extracts the signature header value, if present and valid UTF-8.
fn extract_signature(headers: &HeaderMap) -> Option<&str> {
    headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok())
}

/// Whether a buffering error was caused by the body limit.
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Axum middleware that rejects deliveries whose signature does not match
/// the raw body.
pub async fn signature_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();

    let bytes = body::to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        if exceeds_limit(&e) {
            warn!(limit = MAX_BODY_BYTES, "Webhook body exceeds size limit");
            ApiError::PayloadTooLarge { limit_bytes: MAX_BODY_BYTES }
        } else {
            ApiError::UnreadableBody(e.to_string())
        }
    })?;

    if let Err(e) =
        verify_signature(&bytes, extract_signature(&parts.headers), &state.webhook.secret)
    {
        warn!(error = %e, body_len = bytes.len(), "Rejected webhook delivery");
        return Err(e.into());
    }

    debug!(body_len = bytes.len(), "Webhook signature verified");

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
