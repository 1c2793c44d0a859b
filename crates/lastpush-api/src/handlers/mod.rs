//! HTTP request handlers for the lastpush API.
//!
//! Handlers are grouped by functionality:
//! - `ping` - trivial reachability probe
//! - `webhook` - signed push delivery ingestion
//! - `last_push` - elapsed time since the monitored user's newest commit
//! - `health` - health and liveness probes
//!
//! Every error response is built from `ApiError`, so it carries a code
//! from the taxonomy (E1001-E3002) alongside the message.

pub mod health;
pub mod last_push;
pub mod ping;
pub mod webhook;

pub use health::{health_check, liveness_check};
pub use last_push::last_push;
pub use ping::ping;
pub use webhook::receive_push;
