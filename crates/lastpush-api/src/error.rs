//! HTTP error taxonomy.
//!
//! Every error response is a JSON object with a human-readable `error`
//! message and a stable `code`. Store failures answer `503` with a
//! `Retry-After` hint; they are never reported as success.

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use lastpush_core::CoreError;
use serde::Serialize;
use thiserror::Error;

use crate::crypto::SignatureError;

/// Seconds suggested to clients before retrying after a store failure.
const RETRY_AFTER_SECS: &str = "5";

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error description
    pub error: String,
    /// Error code from the taxonomy (E1001-E3002)
    pub code: &'static str,
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Signature header absent (E1001).
    #[error("missing signature")]
    MissingSignature,

    /// Signature did not match the body (E1001).
    #[error("invalid signature")]
    InvalidSignature,

    /// Request body could not be buffered (E1002).
    #[error("failed to read body: {0}")]
    UnreadableBody(String),

    /// Body exceeds the buffering limit (E1005).
    #[error("payload exceeds {limit_bytes} bytes")]
    PayloadTooLarge {
        /// Largest accepted body
        limit_bytes: usize,
    },

    /// Body is not a JSON object (E1003).
    #[error("{0}")]
    MalformedPayload(String),

    /// Nothing recorded yet for the monitored pusher (E1004).
    #[error("no push recorded for {pusher_name}")]
    NoPushRecorded {
        /// The monitored pusher name
        pusher_name: String,
    },

    /// Store operation exceeded its budget (E3001).
    #[error("store timed out: {0}")]
    StoreTimeout(String),

    /// Store operation failed (E3002).
    #[error("store unavailable")]
    StoreUnavailable(#[source] CoreError),
}

impl ApiError {
    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingSignature | Self::InvalidSignature => "E1001",
            Self::UnreadableBody(_) => "E1002",
            Self::MalformedPayload(_) => "E1003",
            Self::NoPushRecorded { .. } => "E1004",
            Self::PayloadTooLarge { .. } => "E1005",
            Self::StoreTimeout(_) => "E3001",
            Self::StoreUnavailable(_) => "E3002",
        }
    }

    /// Returns the HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingSignature | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::UnreadableBody(_) | Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::NoPushRecorded { .. } => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::StoreTimeout(_) | Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<SignatureError> for ApiError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::MissingSignature => Self::MissingSignature,
            SignatureError::VerificationFailed | SignatureError::InvalidSecret => {
                Self::InvalidSignature
            },
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Timeout { .. } => Self::StoreTimeout(err.to_string()),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse { error: self.to_string(), code: self.code() };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response.headers_mut().insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}
