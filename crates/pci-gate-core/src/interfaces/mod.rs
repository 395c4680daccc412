// crates/pci-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: PCI Gate Interfaces
// Description: Backend-agnostic seams for audit persistence.
// Purpose: Keep the gate free of any concrete storage technology.
// Dependencies: async-trait, crate::core, thiserror
// ============================================================================

//! ## Overview
//! The gate depends on a single capability: persisting an audit event. Hosts
//! implement [`AuditWriter`] for their storage and inject it. Writers must not
//! mutate or drop fields of the events they receive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::audit::PaymentAuditEvent;

// ============================================================================
// SECTION: Audit Writer
// ============================================================================

/// Errors raised by audit writers.
#[derive(Debug, Error)]
pub enum AuditSinkError {
    /// I/O failure.
    #[error("audit sink io error: {0}")]
    Io(String),
    /// Event could not be serialized.
    #[error("audit sink serialization error: {0}")]
    Serialization(String),
    /// Backend rejected the event.
    #[error("audit sink rejected event: {0}")]
    Rejected(String),
}

/// Persistence capability for payment audit events.
#[async_trait]
pub trait AuditWriter: Send + Sync {
    /// Persists an audit event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError`] when the event could not be persisted.
    async fn write(&self, event: &PaymentAuditEvent) -> Result<(), AuditSinkError>;
}

#[async_trait]
impl<W: AuditWriter + ?Sized> AuditWriter for std::sync::Arc<W> {
    async fn write(&self, event: &PaymentAuditEvent) -> Result<(), AuditSinkError> {
        (**self).write(event).await
    }
}
