// crates/pci-gate-core/tests/gate.rs
// ============================================================================
// Module: Payment Gate Tests
// Description: End-to-end control flow with audit recording.
// ============================================================================
//! ## Overview
//! Runs full requests through the gate and inspects the audit trail it
//! produced for each outcome.

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

use std::sync::Arc;

use async_trait::async_trait;
use pci_gate_core::AuditOutcome;
use pci_gate_core::AuditSinkError;
use pci_gate_core::AuditWriter;
use pci_gate_core::EncryptionOptions;
use pci_gate_core::MemoryAuditWriter;
use pci_gate_core::PaymentActor;
use pci_gate_core::PaymentAuditEvent;
use pci_gate_core::PaymentGate;
use pci_gate_core::PaymentGateSettings;
use pci_gate_core::PaymentPermission;
use pci_gate_core::PaymentRequest;
use pci_gate_core::PaymentRole;
use pci_gate_core::PciError;
use pci_gate_core::PciErrorCode;
use pci_gate_core::RequestContext;
use pci_gate_core::StripeTokenKind;
use pci_gate_core::StripeTokenReference;
use pci_gate_core::assert_no_raw_card_data;
use pci_gate_core::core::hashing::hex_encode;
use pci_gate_core::runtime::encryption::decrypt_with_key;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Encryption key used by gate tests.
const KEY: [u8; 32] = [5u8; 32];

/// Builds a gate over a shared memory writer.
fn gate() -> (PaymentGate<Arc<MemoryAuditWriter>>, Arc<MemoryAuditWriter>) {
    let writer = Arc::new(MemoryAuditWriter::new());
    let settings = PaymentGateSettings {
        encryption: EncryptionOptions::with_key(hex_encode(&KEY)).key_version("v2"),
        ..PaymentGateSettings::default()
    };
    (PaymentGate::new(Arc::clone(&writer), settings), writer)
}

/// HTTPS POST context carrying an idempotency key.
fn secure_post() -> RequestContext {
    RequestContext::new("POST", "https://api.rentals.example/payments")
        .with_header("Idempotency-Key", "idem-42")
}

/// Writer that always fails.
struct FailingWriter;

#[async_trait]
impl AuditWriter for FailingWriter {
    async fn write(&self, _event: &PaymentAuditEvent) -> Result<(), AuditSinkError> {
        Err(AuditSinkError::Rejected("store offline".to_string()))
    }
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

#[tokio::test]
async fn service_actor_creates_payment_with_token() {
    let (gate, writer) = gate();
    let actor = PaymentActor::new("svc1", PaymentRole::Service);
    let request = PaymentRequest::new(
        secure_post(),
        actor,
        PaymentPermission::Create,
        json!({ "paymentMethodId": "pm_123", "amount": 50 }),
    );
    let decision = gate.authorize(&request).await.unwrap();
    assert_eq!(
        decision.token,
        StripeTokenReference {
            kind: StripeTokenKind::PaymentMethod,
            id: "pm_123".to_string(),
        }
    );
    assert_eq!(decision.encrypted_metadata, None);

    let events = writer.events();
    assert_eq!(events, vec![decision.audit_event.clone()]);
    let event = &events[0];
    assert_eq!(event.outcome, AuditOutcome::Success);
    assert_eq!(event.actor_id, "svc1");
    assert_eq!(event.action, "payment.create");
    assert_eq!(event.request_id.as_deref(), Some("idem-42"));
    assert_eq!(event.metadata["tokenType"], json!("payment_method"));
    assert!(assert_no_raw_card_data(&Value::Object(event.metadata.clone())).is_ok());
}

#[tokio::test]
async fn sensitive_metadata_is_encrypted() {
    let (gate, writer) = gate();
    let mut request = PaymentRequest::new(
        secure_post(),
        PaymentActor::new("admin-1", PaymentRole::Admin),
        PaymentPermission::Refund,
        json!({ "payment_intent": "pi_3Mtw" }),
    );
    request.sensitive_metadata = Some("tenant unit 4B".to_string());
    request.resource_id = Some("pay_77".to_string());
    let decision = gate.authorize(&request).await.unwrap();
    let envelope = decision.encrypted_metadata.unwrap();
    assert_eq!(envelope.key_version, "v2");
    assert_eq!(decrypt_with_key(&envelope, &KEY).unwrap(), "tenant unit 4B");
    let event = &writer.events()[0];
    assert_eq!(event.metadata["keyVersion"], json!("v2"));
    assert!(event.resource_id_hash.is_some());
}

#[tokio::test]
async fn denied_actor_is_audited_as_denied() {
    let (gate, writer) = gate();
    let request = PaymentRequest::new(
        secure_post(),
        PaymentActor::new("support-3", PaymentRole::Support),
        PaymentPermission::Refund,
        json!({ "paymentMethodId": "pm_123" }),
    );
    let err = gate.authorize(&request).await.unwrap_err();
    assert_eq!(err.code(), Some(PciErrorCode::AccessDenied));
    let event = &writer.events()[0];
    assert_eq!(event.outcome, AuditOutcome::Denied);
    assert_eq!(event.action, "payment.refund");
    assert_eq!(event.metadata["errorCode"], json!("PCI_ACCESS_DENIED"));
}

#[tokio::test]
async fn raw_card_data_is_rejected_and_not_audited_verbatim() {
    let (gate, writer) = gate();
    let request = PaymentRequest::new(
        secure_post(),
        PaymentActor::new("u1", PaymentRole::User),
        PaymentPermission::Create,
        json!({ "card": { "number": "4242424242424242" }, "amount": 10 }),
    );
    let err = gate.authorize(&request).await.unwrap_err();
    assert_eq!(err.code(), Some(PciErrorCode::RawCardDataDetected));
    let events = writer.events();
    assert_eq!(events[0].outcome, AuditOutcome::Failure);
    let serialized = serde_json::to_string(&events[0]).unwrap();
    assert!(!serialized.contains("4242424242424242"));
    assert!(serialized.contains("$.card.number"));
}

#[tokio::test]
async fn pan_keyed_objects_never_reach_the_audit_trail() {
    let (gate, writer) = gate();
    let request = PaymentRequest::new(
        secure_post(),
        PaymentActor::new("u1", PaymentRole::User),
        PaymentPermission::Create,
        json!({ "paymentMethodId": "pm_1", "notes": { "4111111111111111": "5555555555554444" } }),
    );
    let err = gate.authorize(&request).await.unwrap_err();
    assert_eq!(err.code(), Some(PciErrorCode::RawCardDataDetected));
    let serialized = serde_json::to_string(&writer.events()[0]).unwrap();
    assert!(!serialized.contains("4111111111111111"));
    assert!(!serialized.contains("5555555555554444"));
    assert!(serialized.contains("$.notes.[REDACTED]"));
}

#[tokio::test]
async fn insecure_transport_fails_before_body_checks() {
    let (gate, writer) = gate();
    let request = PaymentRequest::new(
        RequestContext::new("POST", "http://api.rentals.example/payments"),
        PaymentActor::new("svc1", PaymentRole::Service),
        PaymentPermission::Create,
        json!({}),
    );
    assert_eq!(gate.authorize(&request).await, Err(PciError::InsecureTransport));
    assert_eq!(writer.events()[0].metadata["errorCode"], json!("PCI_INSECURE_TRANSPORT"));
}

#[tokio::test]
async fn audit_failure_overrides_success() {
    let gate = PaymentGate::new(FailingWriter, PaymentGateSettings::default());
    let request = PaymentRequest::new(
        secure_post(),
        PaymentActor::new("svc1", PaymentRole::Service),
        PaymentPermission::Create,
        json!({ "token": "tok_visa" }),
    );
    let err = gate.authorize(&request).await.unwrap_err();
    assert_eq!(err.code(), Some(PciErrorCode::AuditWriteFailed));

    let rejected = PaymentRequest::new(
        secure_post(),
        PaymentActor::new("svc1", PaymentRole::Service),
        PaymentPermission::Create,
        json!({ "token": "bogus" }),
    );
    let err = gate.authorize(&rejected).await.unwrap_err();
    assert_eq!(err.code(), Some(PciErrorCode::InvalidToken));
}
