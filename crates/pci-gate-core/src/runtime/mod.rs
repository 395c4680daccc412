// crates/pci-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: PCI Gate Runtime
// Description: Enforcement operations over the core data model.
// Purpose: Implement scanning, tokens, transport, access, crypto, and audit.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Every operation here is synchronous and free of shared mutable state,
//! except for audit writes which await the injected writer.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod access;
pub mod audit;
pub mod audit_sinks;
pub mod encryption;
pub mod gate;
pub mod headers;
pub mod incident;
pub mod scanner;
pub mod scheduler;
pub mod tokens;
pub mod transport;
pub mod webhook;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::assert_payment_access;
pub use audit::create_pci_audit_event;
pub use audit::write_pci_audit_event;
pub use audit_sinks::HashChainedFileAuditWriter;
pub use audit_sinks::MemoryAuditWriter;
pub use audit_sinks::NoopAuditWriter;
pub use audit_sinks::StderrAuditWriter;
pub use audit_sinks::verify_audit_chain;
pub use encryption::EncryptionOptions;
pub use encryption::KeyMaterialPolicy;
pub use encryption::decrypt_sensitive_payment_metadata;
pub use encryption::encrypt_sensitive_payment_metadata;
pub use gate::GateDecision;
pub use gate::PaymentGate;
pub use gate::PaymentGateSettings;
pub use gate::PaymentRequest;
pub use headers::build_pci_security_headers;
pub use incident::create_pci_breach_incident_response;
pub use scanner::REDACTION_MARKER;
pub use scanner::assert_no_raw_card_data;
pub use scanner::sanitize_pci_payload;
pub use scheduler::get_quarterly_assessment_status;
pub use tokens::extract_stripe_token_reference;
pub use transport::TransportPolicy;
pub use transport::assert_pci_api_request_security;
pub use webhook::WebhookError;
pub use webhook::compare_webhook_signatures;
pub use webhook::verify_webhook_signature;
