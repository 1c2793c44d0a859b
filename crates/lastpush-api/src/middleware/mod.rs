//! HTTP middleware for request authentication.
//!
//! Webhook routes sit behind the signature gate, which buffers the raw body,
//! checks it against `X-Hub-Signature-256`, and hands the same bytes on to
//! the handler.
pub mod signature;
