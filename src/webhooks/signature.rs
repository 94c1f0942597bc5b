//! Payload signing and verification.
//!
//! Deliveries to webhooks with a secret carry an HMAC of the request body in
//! the [`HEADER_SIGNATURE`] header. The body is the canonical JSON encoding
//! of the event (see [`canonical_json`]), so a receiver can verify either the
//! raw bytes it received with [`verify_bytes`] or a parsed value with
//! [`verify`].
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use webhook_delivery::webhooks::{sign, verify, SignatureMethod};
//!
//! let payload = json!({"b": 1, "a": [true, null]});
//! let signature = sign(&payload, "whsec_123", SignatureMethod::HmacSha256).unwrap();
//! assert_eq!(signature.len(), 64);
//!
//! assert!(verify(&payload, &signature, "whsec_123", SignatureMethod::HmacSha256).unwrap());
//! assert!(!verify(&payload, &signature, "other", SignatureMethod::HmacSha256).unwrap());
//! ```
//!
//! # Security
//!
//! All signature comparisons use constant-time comparison to prevent timing
//! attacks.

use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

use super::{SignatureMethod, WebhookError};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

// ============================================================================
// Header Constants
// ============================================================================

/// Hex-encoded HMAC of the request body. Present only for signed webhooks.
pub const HEADER_SIGNATURE: &str = "X-Webhook-Signature";

/// Id of the webhook the delivery is addressed to.
pub const HEADER_WEBHOOK_ID: &str = "X-Webhook-Id";

/// Type of the event being delivered (`batch` for batched deliveries).
pub const HEADER_EVENT_TYPE: &str = "X-Event-Type";

/// Id of the event being delivered.
pub const HEADER_EVENT_ID: &str = "X-Event-Id";

/// Id of the delivery. Stable across retries, usable for idempotency.
pub const HEADER_DELIVERY_ID: &str = "X-Delivery-Id";

/// One-based attempt number.
pub const HEADER_DELIVERY_ATTEMPT: &str = "X-Delivery-Attempt";

// ============================================================================
// Canonical encoding
// ============================================================================

/// Encodes a JSON value compactly with object keys sorted at every depth.
///
/// Two structurally equal values always produce the same bytes, whatever the
/// insertion order of their maps.
///
/// ```rust
/// use serde_json::json;
/// use webhook_delivery::webhooks::canonical_json;
///
/// let bytes = canonical_json(&json!({"z": 1, "a": {"y": 2, "b": 3}}));
/// assert_eq!(bytes, br#"{"a":{"b":3,"y":2},"z":1}"#);
/// ```
#[must_use]
pub fn canonical_json(value: &Value) -> Vec<u8> {
    canonicalize(value).to_string().into_bytes()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key.clone(), canonicalize(value)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

// ============================================================================
// Signing
// ============================================================================

/// Signs the canonical encoding of `payload`.
///
/// # Errors
///
/// Returns [`WebhookError::UnsupportedSignatureMethod`] for
/// [`SignatureMethod::Jwt`].
pub fn sign(payload: &Value, secret: &str, method: SignatureMethod) -> Result<String, WebhookError> {
    sign_bytes(&canonical_json(payload), secret, method)
}

/// Verifies `signature` against the canonical encoding of `payload`.
///
/// # Errors
///
/// Returns [`WebhookError::UnsupportedSignatureMethod`] for
/// [`SignatureMethod::Jwt`].
pub fn verify(
    payload: &Value,
    signature: &str,
    secret: &str,
    method: SignatureMethod,
) -> Result<bool, WebhookError> {
    verify_bytes(&canonical_json(payload), signature, secret, method)
}

/// Signs raw bytes, returning a lowercase hex digest.
///
/// # Errors
///
/// Returns [`WebhookError::UnsupportedSignatureMethod`] for
/// [`SignatureMethod::Jwt`].
pub fn sign_bytes(
    message: &[u8],
    secret: &str,
    method: SignatureMethod,
) -> Result<String, WebhookError> {
    let digest = match method {
        SignatureMethod::HmacSha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(invalid_key)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureMethod::HmacSha512 => {
            let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).map_err(invalid_key)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureMethod::Jwt => return Err(unsupported(method)),
    };
    Ok(hex::encode(digest))
}

/// Verifies a hex signature over raw bytes, such as a received request body.
///
/// Hex case is ignored. Comparison is constant-time.
///
/// # Errors
///
/// Returns [`WebhookError::UnsupportedSignatureMethod`] for
/// [`SignatureMethod::Jwt`].
pub fn verify_bytes(
    message: &[u8],
    signature: &str,
    secret: &str,
    method: SignatureMethod,
) -> Result<bool, WebhookError> {
    let expected = sign_bytes(message, secret, method)?;
    Ok(constant_time_compare(
        &expected,
        &signature.trim().to_ascii_lowercase(),
    ))
}

/// Performs constant-time comparison of two strings.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    // ConstantTimeEq handles different lengths securely
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unsupported(method: SignatureMethod) -> WebhookError {
    WebhookError::UnsupportedSignatureMethod {
        method: method.to_string(),
    }
}

fn invalid_key(error: hmac::digest::InvalidLength) -> WebhookError {
    WebhookError::invalid(format!("invalid signing key: {error}"))
}
