//! Cryptographic utilities for webhook signature validation.
//!
//! Deliveries carry `X-Hub-Signature-256: sha256=<hex>`, the lowercase hex
//! HMAC-SHA256 of the raw body keyed with the shared secret. The whole
//! header value is compared against the expected value in constant time.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Shared webhook secret.
///
/// `Debug` is redacted so the secret never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    /// Wraps a secret value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the secret bytes used as the HMAC key.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(***)")
    }
}

/// Signature validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature header absent or empty.
    MissingSignature,
    /// Signature did not match the body.
    VerificationFailed,
    /// Secret could not be used as an HMAC key.
    InvalidSecret,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSignature => write!(f, "missing signature"),
            Self::VerificationFailed => write!(f, "invalid signature"),
            Self::InvalidSecret => write!(f, "invalid secret key"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Verifies a delivery signature against the raw body.
///
/// `signature` is the header value as received, `sha256=` prefix included.
///
/// # Errors
///
/// Returns `SignatureError::MissingSignature` for an absent or empty
/// signature and `SignatureError::VerificationFailed` on mismatch.
/// Verification never succeeds on an error path.
///
/// # Example
///
/// ```
/// use lastpush_api::crypto::{sign, verify_signature, WebhookSecret};
///
/// let secret = WebhookSecret::new("my_secret_key");
/// let body = br#"{"zen":"Keep it logically awesome."}"#;
/// let signature = sign(body, &secret).unwrap();
///
/// assert!(verify_signature(body, Some(&signature), &secret).is_ok());
/// ```
pub fn verify_signature(
    body: &[u8],
    signature: Option<&str>,
    secret: &WebhookSecret,
) -> Result<(), SignatureError> {
    let signature = signature.filter(|s| !s.is_empty()).ok_or(SignatureError::MissingSignature)?;

    let expected = sign(body, secret)?;

    if timing_safe_eq(expected.as_bytes(), signature.as_bytes()) {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}

/// Computes the signature header value for `body`.
///
/// Produces `sha256=` followed by the lowercase hex HMAC-SHA256 digest.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` if the secret is rejected as a
/// key.
pub fn sign(body: &[u8], secret: &WebhookSecret) -> Result<String, SignatureError> {
    Ok(format!("{SIGNATURE_PREFIX}{}", generate_hmac_hex(body, secret)?))
}

/// Generates the HMAC-SHA256 digest of `body` as lowercase hex.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` if the secret is rejected as a
/// key.
pub fn generate_hmac_hex(body: &[u8], secret: &WebhookSecret) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;

    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Timing-safe byte comparison.
///
/// Only the length may short-circuit; every byte pair is visited otherwise.
pub fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let diff = a.iter().zip(b.iter()).fold(0u8, |diff, (x, y)| diff | (x ^ y));
    diff == 0
}
