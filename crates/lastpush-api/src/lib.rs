//! lastpush HTTP API.
//!
//! Records signed GitHub push deliveries and reports how long ago the
//! monitored user last committed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{sync::Arc, time::Duration};

use lastpush_core::{Clock, EventStore};

pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod telemetry;

pub use config::{Config, LogFormat, MigrateDirection, MigrationConfig};
pub use error::ApiError;
pub use server::{create_router, start_server};

/// Immutable webhook settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Shared secret used to verify delivery signatures.
    pub secret: crypto::WebhookSecret,
    /// Pusher name reported by `/last_push`.
    pub monitored_username: String,
    /// Budget for each store operation.
    pub store_timeout: Duration,
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Event persistence.
    pub store: Arc<dyn EventStore>,
    /// Time source for elapsed-hour computation and health timestamps.
    pub clock: Arc<dyn Clock>,
    /// Webhook settings.
    pub webhook: Arc<WebhookSettings>,
}

impl AppState {
    /// Creates application state.
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>, webhook: WebhookSettings) -> Self {
        Self { store, clock, webhook: Arc::new(webhook) }
    }
}
