// crates/pci-gate-core/src/core/guidance.rs
// ============================================================================
// Module: Compliance Guidance
// Description: Static description of enforced controls and operating rules.
// Purpose: Expose documentation for compliance reporting.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The guidance object is read-only documentation. Nothing here is enforced
//! beyond what the runtime modules already enforce.

use serde::Serialize;

/// Read-only description of the gate's compliance posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PciComplianceGuidance {
    /// Controls enforced programmatically by the gate.
    pub enforced_controls: &'static [&'static str],
    /// Recurring operational tasks owned by operators.
    pub operational_checklist: &'static [&'static str],
    /// Practices that are never acceptable.
    pub prohibited_practices: &'static [&'static str],
}

/// Compliance guidance for the rental-payments platform.
pub const PCI_COMPLIANCE_GUIDANCE: PciComplianceGuidance = PciComplianceGuidance {
    enforced_controls: &[
        "Payloads containing Luhn-valid primary account numbers or forbidden card fields are rejected",
        "Card-presenting operations accept only processor-issued token references",
        "Payment endpoints require HTTPS (or a trusted forwarded protocol) outside loopback hosts",
        "Mutating payment requests require an idempotency key",
        "Payment permissions are enforced from a fixed role table plus explicit grants",
        "Sensitive payment metadata is encrypted at rest with AES-256-GCM",
        "Audit records are sanitized and store resource ids and IP addresses only as digests",
        "Webhook signatures are compared in constant time",
        "Payment responses carry no-store caching and anti-framing headers",
    ],
    operational_checklist: &[
        "Complete the PCI self-assessment questionnaire every quarter",
        "Rotate the payment metadata encryption key and record the new key version",
        "Review payment audit trail alerts for write failures",
        "Review role assignments and explicit payment grants",
        "Exercise the breach incident response plan at least annually",
    ],
    prohibited_practices: &[
        "Storing, logging, or transmitting full card numbers outside the processor",
        "Storing card security codes, PINs, or track data after authorization",
        "Embedding encryption keys in source code or configuration files",
        "Serving payment endpoints over plain HTTP",
        "Deleting or editing payment audit records",
    ],
};
