//! Property-based test strategies for webhook inputs.

use chrono::{DateTime, TimeZone, Utc};
use proptest::{
    prelude::{any, prop, Strategy},
    test_runner::Config as ProptestConfig,
};

/// Creates property test configuration based on environment.
///
/// Uses environment variables:
/// - `PROPTEST_CASES`: Number of test cases (default: 64, 256 on CI)
/// - `CI`: If set to "true", uses CI configuration
pub fn config() -> ProptestConfig {
    let is_ci = std::env::var("CI").unwrap_or_default() == "true";
    let default_cases = if is_ci { 256 } else { 64 };

    let cases =
        std::env::var("PROPTEST_CASES").ok().and_then(|s| s.parse().ok()).unwrap_or(default_cases);

    ProptestConfig { failure_persistence: None, ..ProptestConfig::with_cases(cases) }
}

/// Arbitrary delivery bodies, including empty and non-UTF-8 ones.
pub fn body_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..2048)
}

/// Non-empty printable secrets.
pub fn secret_strategy() -> impl Strategy<Value = String> {
    "[ -~]{1,64}"
}

/// Pusher names the ingestor accepts.
pub fn pusher_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,38}"
}

/// Commit timestamps between 2000 and 2100 at whole-second precision.
pub fn commit_time_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_102_444_800i64)
        .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
}
