// crates/pci-gate-core/src/core/audit.rs
// ============================================================================
// Module: Payment Audit Records
// Description: Audit intents and the redacted records built from them.
// Purpose: Define the immutable audit trail format for payment actions.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Callers describe what happened with an [`AuditEventInput`]. The audit
//! factory turns it into a [`PaymentAuditEvent`]: metadata is sanitized and
//! identifying fields are replaced with one-way digests. Events are handed to
//! an audit writer once and never updated or deleted by the gate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::time::deserialize_rfc3339_opt;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Action completed.
    Success,
    /// Action failed validation or processing.
    Failure,
    /// Action was refused by access control.
    Denied,
}

impl AuditOutcome {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Audit Input
// ============================================================================

/// Raw intent to record a payment action.
///
/// # Invariants
/// - `resource_id` and `ip_address` are never persisted in this form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventInput {
    /// Acting principal.
    pub actor_id: String,
    /// Action label (for example `payment.create`).
    pub action: String,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier (hashed before persistence).
    #[serde(default)]
    pub resource_id: Option<String>,
    /// Outcome of the action.
    pub outcome: AuditOutcome,
    /// Optional human-readable reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Optional request identifier.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Caller IP address (hashed before persistence).
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Free-form metadata (sanitized before persistence).
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// When the action happened; defaults to the time the event is built.
    #[serde(default, deserialize_with = "deserialize_rfc3339_opt")]
    pub occurred_at: Option<OffsetDateTime>,
}

impl AuditEventInput {
    /// Builds an input with the required fields and empty optionals.
    #[must_use]
    pub fn new(
        actor_id: impl Into<String>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            outcome,
            reason: None,
            request_id: None,
            ip_address: None,
            metadata: Map::new(),
            occurred_at: None,
        }
    }
}

// ============================================================================
// SECTION: Audit Event
// ============================================================================

/// Persisted, redacted audit record.
///
/// # Invariants
/// - `metadata` contains no raw card data.
/// - Identifying fields appear only as hex digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAuditEvent {
    /// Acting principal.
    pub actor_id: String,
    /// Action label.
    pub action: String,
    /// Resource type label.
    pub resource_type: String,
    /// Digest of the resource identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id_hash: Option<String>,
    /// Outcome of the action.
    pub outcome: AuditOutcome,
    /// Optional reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Optional request identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Digest of the caller IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address_hash: Option<String>,
    /// Sanitized metadata.
    pub metadata: Map<String, Value>,
    /// RFC 3339 timestamp.
    pub occurred_at: String,
}

impl PaymentAuditEvent {
    /// Returns the SHA-256 digest of the event's canonical JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn content_hash(&self) -> Result<HashDigest, HashError> {
        hash_canonical_json(self)
    }
}
