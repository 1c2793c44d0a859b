//! Health check handlers for service monitoring.
//!
//! `/health` probes the event store; `/live` only proves the process
//! answers HTTP.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use lastpush_core::{storage::within_budget, Clock, EventStore};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Individual component health checks
    pub checks: HealthChecks,
    /// Service version information
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Critical systems failing
    Unhealthy,
}

/// Individual component health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Database connectivity and basic query test
    pub database: ComponentHealth,
}

/// Health status for individual components.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: ComponentStatus,
    /// Optional error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

/// Component-level health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is healthy
    Up,
    /// Component is experiencing issues
    Down,
}

/// Health service that encapsulates clock dependency for testable health
/// checks.
pub struct HealthService {
    clock: Arc<dyn Clock>,
    budget: Duration,
}

impl HealthService {
    /// Creates a new health service; each probe gets `budget` to answer.
    pub fn new(clock: Arc<dyn Clock>, budget: Duration) -> Self {
        Self { clock, budget }
    }

    /// Performs service health checks.
    pub async fn health_check(&self, store: &dyn EventStore) -> HealthResponse {
        debug!("Performing health check");

        let timestamp = self.clock.now_utc();
        let start_time = self.clock.now();

        let (status, message) =
            match within_budget("health_check", self.budget, store.health_check()).await {
                Ok(()) => {
                    debug!("Database health check passed");
                    (ComponentStatus::Up, None)
                },
                Err(e) => {
                    error!("Database health check failed: {}", e);
                    (ComponentStatus::Down, Some(format!("Database connection failed: {e}")))
                },
            };
        let db_duration = self.clock.now().saturating_duration_since(start_time);

        let overall_status = match status {
            ComponentStatus::Up => HealthStatus::Healthy,
            ComponentStatus::Down => HealthStatus::Unhealthy,
        };

        HealthResponse {
            status: overall_status,
            timestamp,
            checks: HealthChecks {
                database: ComponentHealth {
                    status,
                    message,
                    response_time_ms: u64::try_from(db_duration.as_millis()).unwrap_or(u64::MAX),
                },
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check endpoint handler.
///
/// Answers `503` when the store is unreachable.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let health_service = HealthService::new(state.clock.clone(), state.webhook.store_timeout);
    let response = health_service.health_check(state.store.as_ref()).await;

    let status_code = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    debug!(
        status = ?response.status,
        db_status = ?response.checks.database.status,
        "Health check completed"
    );

    (status_code, Json(response)).into_response()
}

/// Liveness check endpoint.
///
/// Does not touch the store.
#[instrument(name = "liveness_check", skip(state))]
pub async fn liveness_check(State(state): State<AppState>) -> Response {
    debug!("Performing liveness check");

    let response = serde_json::json!({
        "status": "alive",
        "timestamp": state.clock.now_utc(),
        "service": "lastpush"
    });

    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use lastpush_core::{storage::mock::MockEventStore, TestClock};

    use super::*;

    #[tokio::test]
    async fn healthy_store_reports_up() {
        let service = HealthService::new(Arc::new(TestClock::new()), Duration::from_secs(1));
        let store = MockEventStore::new();

        let response = service.health_check(&store).await;

        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.checks.database.status, ComponentStatus::Up);
        assert!(response.checks.database.message.is_none());
    }

    #[tokio::test]
    async fn failing_store_reports_down() {
        let service = HealthService::new(Arc::new(TestClock::new()), Duration::from_secs(1));
        let store = MockEventStore::new();
        store.fail_with("connection refused").await;

        let response = service.health_check(&store).await;

        assert_eq!(response.status, HealthStatus::Unhealthy);
        assert_eq!(response.checks.database.status, ComponentStatus::Down);
        assert!(response.checks.database.message.unwrap().contains("connection refused"));
    }
}
