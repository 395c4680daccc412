// crates/pci-gate-core/src/runtime/webhook.rs
// ============================================================================
// Module: Webhook Verifier
// Description: Constant-time signature comparison and HMAC verification.
// Purpose: Authenticate inbound processor webhooks without timing leaks.
// Dependencies: hmac, sha2, subtle, time
// ============================================================================

//! ## Overview
//! [`compare_webhook_signatures`] is the primitive: length mismatch returns
//! false immediately (signature length is public), otherwise bytes are
//! compared in constant time. On top of it, processor-style signature headers
//! (`t=<unix seconds>,v1=<hex>`) are parsed and verified as HMAC-SHA-256 over
//! `"{t}.{payload}"`, rejecting timestamps outside the tolerance window.

// ============================================================================
// SECTION: Imports
// ============================================================================

use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::hashing::hex_encode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default replay tolerance in seconds.
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Webhook verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature header did not carry `t` and `v1`.
    #[error("malformed webhook signature header")]
    MalformedHeader,
    /// Timestamp outside the tolerance window.
    #[error("webhook timestamp outside tolerance window")]
    StaleTimestamp,
    /// No signature matched.
    #[error("webhook signature mismatch")]
    SignatureMismatch,
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Compares two signatures in constant time.
#[must_use]
pub fn compare_webhook_signatures(expected: &str, received: &str) -> bool {
    let expected = expected.as_bytes();
    let received = received.as_bytes();
    if expected.len() != received.len() {
        return false;
    }
    expected.ct_eq(received).into()
}

// ============================================================================
// SECTION: HMAC Signatures
// ============================================================================

/// Parsed `t=..,v1=..` signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSignatureHeader {
    /// Signing timestamp in unix seconds.
    pub timestamp: i64,
    /// Candidate `v1` signatures.
    pub signatures: Vec<String>,
}

/// Parses a signature header.
///
/// # Errors
///
/// Returns [`WebhookError::MalformedHeader`] when `t` or `v1` is missing.
pub fn parse_signature_header(header: &str) -> Result<WebhookSignatureHeader, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((name, value)) = part.trim().split_once('=') else {
            continue;
        };
        match name.trim() {
            "t" => timestamp = value.trim().parse::<i64>().ok(),
            "v1" if !value.trim().is_empty() => signatures.push(value.trim().to_string()),
            _ => {}
        }
    }
    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(WebhookSignatureHeader {
            timestamp,
            signatures,
        }),
        _ => Err(WebhookError::MalformedHeader),
    }
}

/// Computes the lowercase hex HMAC-SHA-256 signature for a payload.
#[must_use]
pub fn compute_webhook_signature(secret: &[u8], timestamp: i64, payload: &[u8]) -> String {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret) else {
        return String::new();
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex_encode(&mac.finalize().into_bytes())
}

/// Verifies a signed webhook payload.
///
/// # Errors
///
/// - [`WebhookError::MalformedHeader`] for unparseable headers.
/// - [`WebhookError::StaleTimestamp`] when `|now - t| > tolerance_secs`.
/// - [`WebhookError::SignatureMismatch`] when no `v1` value matches.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &[u8],
    now: OffsetDateTime,
    tolerance_secs: i64,
) -> Result<(), WebhookError> {
    let parsed = parse_signature_header(header)?;
    if now.unix_timestamp().abs_diff(parsed.timestamp) > tolerance_secs.unsigned_abs() {
        return Err(WebhookError::StaleTimestamp);
    }
    let expected = compute_webhook_signature(secret, parsed.timestamp, payload);
    if parsed
        .signatures
        .iter()
        .any(|candidate| compare_webhook_signatures(&expected, &candidate.to_ascii_lowercase()))
    {
        return Ok(());
    }
    Err(WebhookError::SignatureMismatch)
}
