//! Test infrastructure for lastpush.
//!
//! `TestEnv` wires the real router to an in-memory store and a
//! deterministic clock, so HTTP behavior can be exercised without a
//! database. `TestDatabase` covers the Postgres repository when
//! `DATABASE_URL` points at a server.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use lastpush_api::{
    create_router,
    crypto::{sign, WebhookSecret, SIGNATURE_HEADER},
    AppState, WebhookSettings,
};
pub use lastpush_core::{storage::mock::MockEventStore, TestClock};
use serde_json::Value;
use tower::ServiceExt;

pub mod database;
pub mod fixtures;
pub mod strategies;

pub use database::TestDatabase;
pub use fixtures::PushPayloadBuilder;

/// Secret every `TestEnv` signs with.
pub const TEST_SECRET: &str = "test-webhook-secret";

/// Pusher name every `TestEnv` monitors.
pub const MONITORED_USERNAME: &str = "alice";

/// Collected HTTP response for assertions.
#[derive(Debug)]
pub struct TestResponse {
    /// Response status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Body decoded as JSON, `Value::Null` when empty or not JSON
    pub body: Value,
}

/// Test environment with an in-memory store and a controllable clock.
pub struct TestEnv {
    /// In-memory event store shared with the router
    pub store: MockEventStore,
    /// Deterministic clock shared with the router
    pub clock: TestClock,
    settings: WebhookSettings,
    request_timeout: Duration,
}

impl TestEnv {
    /// Creates an environment monitoring `alice` with the default store
    /// budget.
    pub fn new() -> Self {
        Self {
            store: MockEventStore::new(),
            clock: TestClock::new(),
            settings: WebhookSettings {
                secret: WebhookSecret::new(TEST_SECRET),
                monitored_username: MONITORED_USERNAME.to_string(),
                store_timeout: Duration::from_secs(2),
            },
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the per-operation store budget.
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.settings.store_timeout = timeout;
        self
    }

    /// Overrides the monitored pusher name.
    #[must_use]
    pub fn with_monitored_username(mut self, name: impl Into<String>) -> Self {
        self.settings.monitored_username = name.into();
        self
    }

    /// Application state backed by this environment's store and clock.
    pub fn state(&self) -> AppState {
        AppState::new(
            Arc::new(self.store.clone()),
            Arc::new(self.clock.clone()),
            self.settings.clone(),
        )
    }

    /// Router wired to this environment.
    pub fn router(&self) -> Router {
        create_router(self.state(), self.request_timeout)
    }

    /// Signature header value for `body` under the test secret.
    pub fn sign(&self, body: &[u8]) -> String {
        sign(body, &self.settings.secret).unwrap_or_default()
    }

    /// Sends a request through a fresh router.
    ///
    /// # Errors
    ///
    /// Returns an error if the router fails or the body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router().oneshot(request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Ok(TestResponse { status, headers, body })
    }

    /// Posts `body` to `/webhook` with a valid signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or sent.
    pub async fn post_signed(&self, body: impl Into<Vec<u8>>) -> Result<TestResponse> {
        let body = body.into();
        let signature = self.sign(&body);
        self.post_webhook(body, Some(&signature)).await
    }

    /// Posts `body` to `/webhook` with the given signature header, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or sent.
    pub async fn post_webhook(
        &self,
        body: impl Into<Vec<u8>>,
        signature: Option<&str>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", "push");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }

        self.send(builder.body(Body::from(body.into()))?).await
    }

    /// Issues a `GET` to `uri`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or sent.
    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.send(Request::builder().method("GET").uri(uri).body(Body::empty())?).await
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
