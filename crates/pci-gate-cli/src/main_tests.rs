// crates/pci-gate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for input limits and command helpers.
// Purpose: Ensure bounded reads fail closed and commands render stable JSON.
// Dependencies: pci-gate-cli main helpers
// ============================================================================

//! ## Overview
//! Exercises the command helpers behind each subcommand without spawning the
//! binary.
//!
//! Security posture: CLI inputs are untrusted; size limits must fail closed.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use pci_gate_config::AuditSinkKind;
use pci_gate_config::PciGateConfig;
use pci_gate_core::PciError;
use pci_gate_core::core::time::parse_rfc3339;
use pci_gate_core::runtime::webhook::compute_webhook_signature;
use serde_json::json;
use time::OffsetDateTime;

use super::CLI_ERROR_CODE;
use super::CheckDocument;
use super::CliError;
use super::ReadLimitError;
use super::WEBHOOK_ERROR_CODE;
use super::WebhookVerifyCommand;
use super::command_assessment;
use super::command_check;
use super::command_headers;
use super::command_scan;
use super::command_webhook_verify;
use super::load_config;
use super::parse_header_pair;
use super::parse_json;
use super::read_bytes_with_limit;
use super::read_input;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Config that discards audit events.
fn quiet_config() -> PciGateConfig {
    let mut config = PciGateConfig::default();
    config.audit.sink = AuditSinkKind::None;
    config
}

/// Webhook command over `payload` with the test secret variable.
fn webhook_command(payload: PathBuf, signature: String) -> WebhookVerifyCommand {
    WebhookVerifyCommand {
        payload,
        signature,
        secret_env: "TEST_WEBHOOK_SECRET".to_string(),
        tolerance: 300,
    }
}

// ============================================================================
// SECTION: Input Limits
// ============================================================================

#[test]
fn bounded_read_accepts_inputs_at_the_limit() {
    let bytes = read_bytes_with_limit(Cursor::new(vec![7u8; 16]), 16).unwrap();
    assert_eq!(bytes.len(), 16);
}

#[test]
fn bounded_read_rejects_oversized_inputs() {
    let err = read_bytes_with_limit(Cursor::new(vec![7u8; 17]), 16).unwrap_err();
    assert!(matches!(
        err,
        ReadLimitError::TooLarge {
            limit: 16
        }
    ));
}

#[test]
fn missing_input_file_is_reported() {
    let err = read_input(&PathBuf::from("/nonexistent/pci-gate-input.json")).unwrap_err();
    assert_eq!(err.code, CLI_ERROR_CODE);
    assert!(err.message.contains("failed to read"));
}

#[test]
fn header_pairs_parse_and_trim() {
    assert_eq!(
        parse_header_pair("X-Frame-Options = SAMEORIGIN").unwrap(),
        ("X-Frame-Options".to_string(), "SAMEORIGIN".to_string())
    );
    assert!(parse_header_pair("no-separator").is_err());
    assert!(parse_header_pair("=value").is_err());
}

// ============================================================================
// SECTION: Commands
// ============================================================================

#[test]
fn scan_reports_clean_payloads_and_fails_on_pans() {
    assert_eq!(command_scan(&json!({ "token": "tok_visa" })).unwrap(), json!({ "clean": true }));
    let err = command_scan(&json!({ "note": "4111 1111 1111 1111" })).unwrap_err();
    assert_eq!(err.code, "PCI_RAW_CARD_DATA_DETECTED");
}

#[test]
fn pci_errors_keep_their_codes() {
    let err = CliError::from(PciError::InsecureTransport);
    assert_eq!(err.to_json()["code"], json!("PCI_INSECURE_TRANSPORT"));
}

#[test]
fn header_overrides_replace_defaults() {
    let headers = command_headers(vec![("cache-control".to_string(), "private".to_string())]);
    assert_eq!(headers["cache-control"], json!("private"));
    assert!(headers.get("Cache-Control").is_none());
    assert_eq!(headers["X-Frame-Options"], json!("DENY"));
}

#[test]
fn assessment_prefers_flag_over_config() {
    let mut config = quiet_config();
    config.assessment.last_assessment_at = Some("2026-01-01T00:00:00Z".to_string());
    let now = Some(parse_rfc3339("2026-02-01T00:00:00Z").unwrap());
    let from_config = command_assessment(&config, None, now).unwrap();
    assert_eq!(from_config["overdue"], json!(false));
    assert_eq!(from_config["daysUntilDue"], json!(59));
    let from_flag = command_assessment(&config, Some("2025-10-01T00:00:00Z"), now).unwrap();
    assert_eq!(from_flag["overdue"], json!(true));
    let err = command_assessment(&config, Some("not a date"), now).unwrap_err();
    assert!(err.message.contains("invalid timestamp"));
}

#[tokio::test]
async fn check_document_runs_through_the_gate() {
    let document: CheckDocument = parse_json(
        json!({
            "method": "POST",
            "url": "https://api.rentals.example/payments",
            "headers": { "Idempotency-Key": "idem-1" },
            "actor": { "id": "svc1", "role": "service" },
            "permission": "payments:create",
            "body": { "paymentMethodId": "pm_123" }
        })
        .to_string()
        .as_bytes(),
    )
    .unwrap();
    let output = command_check(&quiet_config(), document).await.unwrap();
    assert_eq!(output["allowed"], json!(true));
    assert_eq!(output["token"]["id"], json!("pm_123"));
    assert_eq!(output["auditEvent"]["action"], json!("payment.create"));
}

#[tokio::test]
async fn check_document_denials_surface_error_codes() {
    let document: CheckDocument = parse_json(
        json!({
            "method": "POST",
            "url": "https://api.rentals.example/payments",
            "headers": { "Idempotency-Key": "idem-1" },
            "actor": { "id": "support-1", "role": "support" },
            "permission": "payments:refund",
            "body": { "paymentMethodId": "pm_123" }
        })
        .to_string()
        .as_bytes(),
    )
    .unwrap();
    let err = command_check(&quiet_config(), document).await.unwrap_err();
    assert_eq!(err.code, "PCI_ACCESS_DENIED");
}

#[test]
fn check_document_rejects_unknown_fields() {
    let result: Result<CheckDocument, String> = parse_json(br#"{"method":"GET","extra":1}"#);
    assert!(result.is_err());
}

#[test]
fn json_errors_report_position_without_input_values() {
    let document = br#"{"method":"GET","url":"https://x","actor":{"id":"a","role":"4111111111111111"},"permission":"payments:read"}"#;
    let message = parse_json::<CheckDocument>(document).unwrap_err();
    assert!(message.starts_with("invalid json at line 1 column"));
    assert!(!message.contains("4111111111111111"));
}

#[test]
fn webhook_verify_uses_the_named_secret() {
    let dir = tempfile::tempdir().unwrap();
    let payload_path = dir.path().join("event.json");
    let payload = br#"{"type":"charge.refunded"}"#;
    fs::write(&payload_path, payload).unwrap();
    let timestamp = OffsetDateTime::now_utc().unix_timestamp();
    let signature = compute_webhook_signature(b"whsec_cli", timestamp, payload);
    let command = webhook_command(payload_path, format!("t={timestamp},v1={signature}"));

    let lookup = |name: &str| (name == "TEST_WEBHOOK_SECRET").then(|| "whsec_cli".to_string());
    assert_eq!(command_webhook_verify(&command, lookup).unwrap(), json!({ "verified": true }));

    let wrong = |_: &str| Some("other".to_string());
    let err = command_webhook_verify(&command, wrong).unwrap_err();
    assert_eq!(err.code, WEBHOOK_ERROR_CODE);

    let missing = |_: &str| None;
    let err = command_webhook_verify(&command, missing).unwrap_err();
    assert!(err.message.contains("TEST_WEBHOOK_SECRET"));
}

// ============================================================================
// SECTION: Config
// ============================================================================

#[test]
fn explicit_config_path_is_loaded_and_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pci-gate.toml");
    fs::write(&path, "[audit]\nsink = \"none\"\n").unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.audit.sink, AuditSinkKind::None);

    fs::write(&path, "[audit]\nsink = \"file\"\n").unwrap();
    let err = load_config(Some(&path)).unwrap_err();
    assert!(err.message.contains("audit.path"));
}
