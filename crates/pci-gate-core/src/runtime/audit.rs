// crates/pci-gate-core/src/runtime/audit.rs
// ============================================================================
// Module: Audit Event Factory
// Description: Builds redacted payment audit events and hands them to writers.
// Purpose: Record every payment outcome without leaking card or identity data.
// Dependencies: time, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`create_pci_audit_event`] sanitizes metadata, re-checks the sanitized copy,
//! and replaces identifying fields with digests. [`write_pci_audit_event`]
//! performs exactly one write attempt; retry policy belongs to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;

use crate::core::audit::AuditEventInput;
use crate::core::audit::PaymentAuditEvent;
use crate::core::error::PciError;
use crate::core::hashing::hash_identifier;
use crate::core::time::format_rfc3339;
use crate::interfaces::AuditWriter;
use crate::runtime::scanner::assert_redacted_map;
use crate::runtime::scanner::sanitize_pci_map;

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Builds a redacted audit event.
///
/// `hash_key` switches identifier digests from SHA-256 to HMAC-SHA-256.
///
/// # Errors
///
/// Returns [`PciError::RawCardDataDetected`] if card data survives
/// sanitization, or [`PciError::PayloadTooDeep`].
pub fn create_pci_audit_event(
    input: AuditEventInput,
    hash_key: Option<&[u8]>,
) -> Result<PaymentAuditEvent, PciError> {
    let metadata = sanitize_pci_map(&input.metadata);
    assert_redacted_map(&metadata)?;
    let digest = |value: &String| hash_identifier(value, hash_key).value;
    let occurred_at = input.occurred_at.unwrap_or_else(OffsetDateTime::now_utc);
    Ok(PaymentAuditEvent {
        actor_id: input.actor_id,
        action: input.action,
        resource_type: input.resource_type,
        resource_id_hash: input.resource_id.as_ref().map(digest),
        outcome: input.outcome,
        reason: input.reason,
        request_id: input.request_id,
        ip_address_hash: input.ip_address.as_ref().map(digest),
        metadata,
        occurred_at: format_rfc3339(occurred_at),
    })
}

// ============================================================================
// SECTION: Writing
// ============================================================================

/// Hands an event to the writer once.
///
/// # Errors
///
/// Returns [`PciError::AuditWriteFailed`] carrying the writer's message.
pub async fn write_pci_audit_event<W>(event: &PaymentAuditEvent, writer: &W) -> Result<(), PciError>
where
    W: AuditWriter + ?Sized,
{
    writer.write(event).await.map_err(|err| PciError::AuditWriteFailed(err.to_string()))
}
