#![no_main]

//! Fuzz target for webhook signature verification.
//!
//! The input is split into a secret, a header value, and a body. Whatever
//! the bytes, verification must not panic, and it must only succeed when
//! the header is exactly the signature of the body.

use lastpush_api::crypto::{sign, verify_signature, WebhookSecret};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut parts = data.splitn(3, |b| *b == 0);
    let secret = String::from_utf8_lossy(parts.next().unwrap_or_default()).into_owned();
    let header = String::from_utf8_lossy(parts.next().unwrap_or_default()).into_owned();
    let body = parts.next().unwrap_or_default();

    let secret = WebhookSecret::new(secret);
    let Ok(expected) = sign(body, &secret) else {
        return;
    };

    let verdict = verify_signature(body, Some(&header), &secret);
    assert_eq!(verdict.is_ok(), !header.is_empty() && header == expected);

    // The genuine signature always verifies.
    assert!(verify_signature(body, Some(&expected), &secret).is_ok());
});
