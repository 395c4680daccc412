// crates/pci-gate-core/tests/webhook_headers.rs
// ============================================================================
// Module: Webhook and Header Tests
// Description: Signature comparison, HMAC verification, and response headers.
// ============================================================================
//! ## Overview
//! Covers the constant-time comparison contract, signed webhook
//! verification, and security header overrides.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use pci_gate_core::PCI_COMPLIANCE_GUIDANCE;
use pci_gate_core::WebhookError;
use pci_gate_core::build_pci_security_headers;
use pci_gate_core::compare_webhook_signatures;
use pci_gate_core::runtime::headers::to_header_map;
use pci_gate_core::runtime::webhook::DEFAULT_WEBHOOK_TOLERANCE_SECS;
use pci_gate_core::runtime::webhook::compute_webhook_signature;
use pci_gate_core::runtime::webhook::parse_signature_header;
use pci_gate_core::verify_webhook_signature;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Signatures
// ============================================================================

#[test]
fn comparison_matches_exact_strings_only() {
    assert!(compare_webhook_signatures("abc", "abc"));
    assert!(!compare_webhook_signatures("abc", "abd"));
    assert!(!compare_webhook_signatures("ab", "abc"));
    assert!(compare_webhook_signatures("", ""));
}

#[test]
fn signature_header_parses_timestamp_and_candidates() {
    let header = parse_signature_header("t=1700000000, v1=aa, v0=zz, v1=bb").unwrap();
    assert_eq!(header.timestamp, 1_700_000_000);
    assert_eq!(header.signatures, vec!["aa", "bb"]);
    assert_eq!(parse_signature_header("v1=aa"), Err(WebhookError::MalformedHeader));
    assert_eq!(parse_signature_header("t=abc,v1=aa"), Err(WebhookError::MalformedHeader));
    assert_eq!(parse_signature_header("t=1"), Err(WebhookError::MalformedHeader));
}

#[test]
fn signed_payload_verifies_within_tolerance() {
    let secret = b"whsec_test";
    let payload = br#"{"type":"payment_intent.succeeded"}"#;
    let now = OffsetDateTime::from_unix_timestamp(1_700_000_100).unwrap();
    let signature = compute_webhook_signature(secret, 1_700_000_000, payload);
    let header = format!("t=1700000000,v1=deadbeef,v1={signature}");
    assert_eq!(
        verify_webhook_signature(payload, &header, secret, now, DEFAULT_WEBHOOK_TOLERANCE_SECS),
        Ok(())
    );
    assert_eq!(
        verify_webhook_signature(b"{}", &header, secret, now, DEFAULT_WEBHOOK_TOLERANCE_SECS),
        Err(WebhookError::SignatureMismatch)
    );
    assert_eq!(
        verify_webhook_signature(payload, &header, b"other", now, DEFAULT_WEBHOOK_TOLERANCE_SECS),
        Err(WebhookError::SignatureMismatch)
    );
}

#[test]
fn stale_timestamps_are_rejected() {
    let secret = b"whsec_test";
    let payload = b"{}";
    let signature = compute_webhook_signature(secret, 1_700_000_000, payload);
    let header = format!("t=1700000000,v1={signature}");
    let late = OffsetDateTime::from_unix_timestamp(1_700_000_301).unwrap();
    assert_eq!(
        verify_webhook_signature(payload, &header, secret, late, DEFAULT_WEBHOOK_TOLERANCE_SECS),
        Err(WebhookError::StaleTimestamp)
    );
    let early = OffsetDateTime::from_unix_timestamp(1_699_999_699).unwrap();
    assert_eq!(
        verify_webhook_signature(payload, &header, secret, early, DEFAULT_WEBHOOK_TOLERANCE_SECS),
        Err(WebhookError::StaleTimestamp)
    );
}

// ============================================================================
// SECTION: Headers
// ============================================================================

#[test]
fn default_headers_are_complete() {
    let headers = build_pci_security_headers(None);
    assert_eq!(headers.get("Cache-Control").map(String::as_str), Some("no-store"));
    assert_eq!(headers.get("Pragma").map(String::as_str), Some("no-cache"));
    assert_eq!(headers.get("X-Content-Type-Options").map(String::as_str), Some("nosniff"));
    assert_eq!(headers.get("Referrer-Policy").map(String::as_str), Some("no-referrer"));
    assert_eq!(headers.get("X-Frame-Options").map(String::as_str), Some("DENY"));
    assert!(headers.contains_key("Permissions-Policy"));
    assert_eq!(headers.len(), 6);
}

#[test]
fn caller_overrides_win_case_insensitively() {
    let extra = BTreeMap::from([
        ("x-frame-options".to_string(), "SAMEORIGIN".to_string()),
        ("X-Request-Id".to_string(), "req-1".to_string()),
    ]);
    let headers = build_pci_security_headers(Some(&extra));
    assert!(!headers.contains_key("X-Frame-Options"));
    assert_eq!(headers.get("x-frame-options").map(String::as_str), Some("SAMEORIGIN"));
    assert_eq!(headers.get("X-Request-Id").map(String::as_str), Some("req-1"));
    assert_eq!(headers.len(), 7);

    let map = to_header_map(&headers);
    assert_eq!(map.get("X-FRAME-OPTIONS").unwrap(), "SAMEORIGIN");
    assert_eq!(map.len(), 7);
}

// ============================================================================
// SECTION: Guidance
// ============================================================================

#[test]
fn guidance_serializes_all_sections() {
    let value = serde_json::to_value(PCI_COMPLIANCE_GUIDANCE).unwrap();
    for section in ["enforcedControls", "operationalChecklist", "prohibitedPractices"] {
        assert!(!value[section].as_array().unwrap().is_empty(), "{section}");
    }
}
