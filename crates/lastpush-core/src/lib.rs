//! Core domain models for push webhook recording.
//!
//! Provides the push event model, payload extraction rules, the last-push
//! report, error taxonomy, clock abstraction, and the storage layer. The
//! HTTP crate and the binaries depend on these types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod ingest;
pub mod models;
pub mod report;
pub mod storage;
pub mod time;

pub use error::{CoreError, Result};
pub use ingest::{extract_push, parse_commit_timestamp, SkipReason};
pub use models::{EventId, NewPushEvent, PushEvent};
pub use report::{elapsed_hours, LastPushReport};
pub use storage::{EventStore, PostgresEventStore, Storage};
pub use time::{Clock, RealClock, TestClock};
