// crates/pci-gate-core/src/runtime/incident.rs
// ============================================================================
// Module: Incident Responder
// Description: Breach incident response plan generation.
// Purpose: Produce a consistent containment, notification, and investigation plan.
// Dependencies: rand, time, crate::core
// ============================================================================

//! ## Overview
//! Plans are generated without side effects. Apart from the incident id
//! (`pci-inc-{unix_ms}-{8 hex}`), the output is fully determined by the input.
//! High and critical incidents get an escalation step at the head of the
//! notification checklist.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::RngCore;
use rand::rngs::OsRng;
use time::OffsetDateTime;

use crate::core::compliance::PciBreachIncident;
use crate::core::compliance::PciBreachIncidentInput;
use crate::core::hashing::hex_encode;
use crate::core::time::unix_millis;

// ============================================================================
// SECTION: Checklists
// ============================================================================

/// Incident id prefix.
pub const INCIDENT_ID_PREFIX: &str = "pci-inc";

/// Escalation step for high and critical incidents.
pub const ESCALATION_ACTION: &str =
    "Trigger 24/7 escalation to the incident commander and security on-call";

/// Containment checklist.
pub const CONTAINMENT_ACTIONS: &[&str] = &[
    "Isolate suspected systems from the payment network",
    "Rotate payment processor API keys and webhook secrets",
    "Rotate the payment metadata encryption key",
    "Preserve logs, audit trails, and system images for forensics",
    "Disable compromised accounts and revoke active sessions",
];

/// Notification checklist, before any escalation step.
pub const NOTIFICATION_ACTIONS: &[&str] = &[
    "Notify the payment processor and acquiring bank",
    "Notify the internal security, legal, and compliance leads",
    "Assess card brand and regulatory notification deadlines",
    "Prepare customer communication if cardholder data exposure is confirmed",
];

/// Investigation checklist.
pub const INVESTIGATION_ACTIONS: &[&str] = &[
    "Determine the intrusion vector and timeline",
    "Identify cardholder data elements and records affected",
    "Review payment audit events for anomalous access",
    "Engage a PCI forensic investigator if required",
    "Document root cause and remediation for the post-incident review",
];

// ============================================================================
// SECTION: Generation
// ============================================================================

/// Generates a breach incident response plan.
#[must_use]
pub fn create_pci_breach_incident_response(input: PciBreachIncidentInput) -> PciBreachIncident {
    let detected_at = input.detected_at.unwrap_or_else(OffsetDateTime::now_utc);
    let mut notification_actions = Vec::with_capacity(NOTIFICATION_ACTIONS.len() + 1);
    if input.severity.requires_escalation() {
        notification_actions.push(ESCALATION_ACTION.to_string());
    }
    notification_actions.extend(owned(NOTIFICATION_ACTIONS));
    PciBreachIncident {
        incident_id: new_incident_id(OffsetDateTime::now_utc()),
        detected_at,
        severity: input.severity,
        suspected_systems: dedupe(input.suspected_systems),
        suspected_data_types: dedupe(input.suspected_data_types),
        containment_actions: owned(CONTAINMENT_ACTIONS).collect(),
        notification_actions,
        investigation_actions: owned(INVESTIGATION_ACTIONS).collect(),
    }
}

/// Returns a time-based incident id with a random suffix.
#[must_use]
pub fn new_incident_id(now: OffsetDateTime) -> String {
    let mut suffix = [0u8; 4];
    OsRng.fill_bytes(&mut suffix);
    format!("{INCIDENT_ID_PREFIX}-{}-{}", unix_millis(now), hex_encode(&suffix))
}

/// Trims entries, drops empties, and keeps the first occurrence of each.
fn dedupe(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Converts a static checklist into owned strings.
fn owned(items: &'static [&'static str]) -> impl Iterator<Item = String> {
    items.iter().map(|item| (*item).to_string())
}
