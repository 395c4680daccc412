// crates/pci-gate-core/src/lib.rs
// ============================================================================
// Module: PCI Gate Core Library
// Description: Public API surface for the payment compliance gate.
// Purpose: Expose core types, the audit writer seam, and runtime controls.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The PCI gate sits between a rental-payments API and its card processor.
//! It keeps raw cardholder data out of the platform, requires processor
//! tokens, enforces secure transport and payment permissions, encrypts
//! sensitive metadata at rest, and records a redacted audit trail. It owns no
//! HTTP stack or storage; hosts integrate through [`RequestContext`] and
//! [`AuditWriter`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::AuditEventInput;
pub use crate::core::AuditOutcome;
pub use crate::core::CardDataFinding;
pub use crate::core::EncryptionEnvelope;
pub use crate::core::IncidentSeverity;
pub use crate::core::PCI_COMPLIANCE_GUIDANCE;
pub use crate::core::PaymentActor;
pub use crate::core::PaymentAuditEvent;
pub use crate::core::PaymentPermission;
pub use crate::core::PaymentRole;
pub use crate::core::PciBreachIncident;
pub use crate::core::PciBreachIncidentInput;
pub use crate::core::PciComplianceGuidance;
pub use crate::core::PciError;
pub use crate::core::PciErrorCode;
pub use crate::core::QuarterlyAssessmentStatus;
pub use crate::core::RequestContext;
pub use crate::core::RequestHeaders;
pub use crate::core::StripeTokenKind;
pub use crate::core::StripeTokenReference;
pub use crate::interfaces::AuditSinkError;
pub use crate::interfaces::AuditWriter;
pub use crate::runtime::EncryptionOptions;
pub use crate::runtime::GateDecision;
pub use crate::runtime::HashChainedFileAuditWriter;
pub use crate::runtime::KeyMaterialPolicy;
pub use crate::runtime::MemoryAuditWriter;
pub use crate::runtime::NoopAuditWriter;
pub use crate::runtime::PaymentGate;
pub use crate::runtime::PaymentGateSettings;
pub use crate::runtime::PaymentRequest;
pub use crate::runtime::REDACTION_MARKER;
pub use crate::runtime::StderrAuditWriter;
pub use crate::runtime::TransportPolicy;
pub use crate::runtime::WebhookError;
pub use crate::runtime::assert_no_raw_card_data;
pub use crate::runtime::assert_payment_access;
pub use crate::runtime::assert_pci_api_request_security;
pub use crate::runtime::build_pci_security_headers;
pub use crate::runtime::compare_webhook_signatures;
pub use crate::runtime::create_pci_audit_event;
pub use crate::runtime::create_pci_breach_incident_response;
pub use crate::runtime::decrypt_sensitive_payment_metadata;
pub use crate::runtime::encrypt_sensitive_payment_metadata;
pub use crate::runtime::extract_stripe_token_reference;
pub use crate::runtime::get_quarterly_assessment_status;
pub use crate::runtime::sanitize_pci_payload;
pub use crate::runtime::verify_audit_chain;
pub use crate::runtime::verify_webhook_signature;
pub use crate::runtime::write_pci_audit_event;
