// crates/pci-gate-core/src/core/mod.rs
// ============================================================================
// Module: PCI Gate Core Types
// Description: Canonical data model for payment compliance enforcement.
// Purpose: Provide stable, serializable types shared by every gate component.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types define actors, token references, encryption envelopes, audit
//! records, compliance records, and the error taxonomy. Runtime modules
//! operate on these types and never define their own wire formats.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod actor;
pub mod audit;
pub mod compliance;
pub mod envelope;
pub mod error;
pub mod guidance;
pub mod hashing;
pub mod request;
pub mod time;
pub mod token;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use actor::ALL_PAYMENT_PERMISSIONS;
pub use actor::PaymentActor;
pub use actor::PaymentPermission;
pub use actor::PaymentRole;
pub use audit::AuditEventInput;
pub use audit::AuditOutcome;
pub use audit::PaymentAuditEvent;
pub use compliance::IncidentSeverity;
pub use compliance::PciBreachIncident;
pub use compliance::PciBreachIncidentInput;
pub use compliance::QuarterlyAssessmentStatus;
pub use envelope::DEFAULT_KEY_VERSION;
pub use envelope::ENCRYPTION_KEY_BYTES;
pub use envelope::ENVELOPE_ALGORITHM;
pub use envelope::EncryptionEnvelope;
pub use error::CardDataFinding;
pub use error::PciError;
pub use error::PciErrorCode;
pub use guidance::PCI_COMPLIANCE_GUIDANCE;
pub use guidance::PciComplianceGuidance;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use request::RequestContext;
pub use request::RequestHeaders;
pub use token::StripeTokenKind;
pub use token::StripeTokenReference;
