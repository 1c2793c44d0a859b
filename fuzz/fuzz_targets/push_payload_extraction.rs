#![no_main]

//! Fuzz target for push payload extraction.
//!
//! Any JSON object must either yield an event with a non-empty pusher
//! identity or a skip reason, never a panic.

use lastpush_core::extract_push;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(Value::Object(payload)) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    if let Ok(event) = extract_push(payload) {
        assert!(!event.pusher_name().is_empty());
        assert!(!event.pusher_email().is_empty());
    }
});
