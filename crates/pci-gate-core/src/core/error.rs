// crates/pci-gate-core/src/core/error.rs
// ============================================================================
// Module: PCI Gate Errors
// Description: Closed error taxonomy for payment compliance enforcement.
// Purpose: Give callers stable machine-readable codes and value-free messages.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Every failure raised by the gate is a [`PciError`]. Variants that belong to
//! the published taxonomy map to a [`PciErrorCode`] through
//! [`PciError::code`]; the remaining variants are local validation failures
//! without a published code.
//!
//! Security posture: messages reference field paths, field names, permission
//! labels and actor ids. They never carry the offending payload value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::actor::PaymentPermission;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Published error codes.
///
/// # Invariants
/// - Wire labels are stable; callers map them to HTTP statuses and alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PciErrorCode {
    /// Raw cardholder data or a forbidden field was found in a payload.
    #[serde(rename = "PCI_RAW_CARD_DATA_DETECTED")]
    RawCardDataDetected,
    /// No processor token reference was supplied.
    #[serde(rename = "PCI_TOKEN_REQUIRED")]
    TokenRequired,
    /// A token field was present but did not match any known token shape.
    #[serde(rename = "PCI_INVALID_TOKEN")]
    InvalidToken,
    /// The request did not arrive over a secure transport.
    #[serde(rename = "PCI_INSECURE_TRANSPORT")]
    InsecureTransport,
    /// The actor lacks the required payment permission.
    #[serde(rename = "PCI_ACCESS_DENIED")]
    AccessDenied,
    /// No encryption key could be resolved.
    #[serde(rename = "PCI_ENCRYPTION_KEY_MISSING")]
    EncryptionKeyMissing,
    /// Encryption key material did not decode to exactly 32 bytes.
    #[serde(rename = "PCI_ENCRYPTION_KEY_INVALID")]
    EncryptionKeyInvalid,
    /// The audit writer failed to persist an audit event.
    #[serde(rename = "PCI_AUDIT_WRITE_FAILED")]
    AuditWriteFailed,
}

impl PciErrorCode {
    /// Returns the stable wire label for the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RawCardDataDetected => "PCI_RAW_CARD_DATA_DETECTED",
            Self::TokenRequired => "PCI_TOKEN_REQUIRED",
            Self::InvalidToken => "PCI_INVALID_TOKEN",
            Self::InsecureTransport => "PCI_INSECURE_TRANSPORT",
            Self::AccessDenied => "PCI_ACCESS_DENIED",
            Self::EncryptionKeyMissing => "PCI_ENCRYPTION_KEY_MISSING",
            Self::EncryptionKeyInvalid => "PCI_ENCRYPTION_KEY_INVALID",
            Self::AuditWriteFailed => "PCI_AUDIT_WRITE_FAILED",
        }
    }
}

impl fmt::Display for PciErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Findings
// ============================================================================

/// Reason a payload location was classified as cardholder data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardDataFinding {
    /// A string value that looks like a primary account number.
    PrimaryAccountNumber,
    /// An object key that names sensitive card data.
    ForbiddenField,
}

impl CardDataFinding {
    /// Returns a stable label for the finding.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PrimaryAccountNumber => "primary account number",
            Self::ForbiddenField => "forbidden field",
        }
    }
}

impl fmt::Display for CardDataFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Payment compliance failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PciError {
    /// Raw card data or a forbidden field name was found.
    #[error("raw cardholder data detected ({finding}) at {path}")]
    RawCardDataDetected {
        /// Dotted/indexed path to the offending location.
        path: String,
        /// Classification reason.
        finding: CardDataFinding,
    },
    /// Payload nesting exceeded the traversal limit.
    #[error("payload nesting exceeds {max_depth} levels at {path}")]
    PayloadTooDeep {
        /// Path at which traversal stopped.
        path: String,
        /// Configured depth limit.
        max_depth: usize,
    },
    /// No processor token reference was present.
    #[error("a payment processor token reference is required")]
    TokenRequired,
    /// A token field did not match any known token shape.
    #[error("field {field} does not contain a valid payment processor token")]
    InvalidToken {
        /// Offending field name.
        field: String,
    },
    /// Request arrived over an insecure channel.
    #[error("payment requests must use a secure transport")]
    InsecureTransport,
    /// Mutating request without an idempotency key.
    #[error("mutating payment requests require an idempotency key")]
    IdempotencyKeyRequired,
    /// Actor lacks the permission.
    #[error("actor {actor_id} is not permitted to perform {permission}")]
    AccessDenied {
        /// Actor identifier.
        actor_id: String,
        /// Permission that was required.
        permission: PaymentPermission,
    },
    /// No key material configured.
    #[error("payment metadata encryption key is not configured")]
    EncryptionKeyMissing,
    /// Key material did not decode to 32 bytes.
    #[error("payment metadata encryption key must decode to exactly 32 bytes")]
    EncryptionKeyInvalid,
    /// Audit persistence failed.
    #[error("failed to write payment audit event: {0}")]
    AuditWriteFailed(String),
    /// Envelope names an algorithm the gate does not support.
    #[error("unsupported encryption envelope algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// Envelope fields could not be decoded.
    #[error("malformed encryption envelope: {0}")]
    MalformedEnvelope(String),
    /// Ciphertext failed authentication.
    #[error("payment metadata failed authentication during decryption")]
    DecryptionFailed,
    /// Cipher failure while encrypting.
    #[error("payment metadata encryption failed")]
    EncryptionFailed,
    /// Timestamp input did not parse.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl PciError {
    /// Returns the published error code when the variant has one.
    #[must_use]
    pub const fn code(&self) -> Option<PciErrorCode> {
        match self {
            Self::RawCardDataDetected {
                ..
            } => Some(PciErrorCode::RawCardDataDetected),
            Self::TokenRequired => Some(PciErrorCode::TokenRequired),
            Self::InvalidToken {
                ..
            } => Some(PciErrorCode::InvalidToken),
            Self::InsecureTransport | Self::IdempotencyKeyRequired => {
                Some(PciErrorCode::InsecureTransport)
            }
            Self::AccessDenied {
                ..
            } => Some(PciErrorCode::AccessDenied),
            Self::EncryptionKeyMissing => Some(PciErrorCode::EncryptionKeyMissing),
            Self::EncryptionKeyInvalid => Some(PciErrorCode::EncryptionKeyInvalid),
            Self::AuditWriteFailed(_) => Some(PciErrorCode::AuditWriteFailed),
            Self::PayloadTooDeep {
                ..
            }
            | Self::UnsupportedAlgorithm(_)
            | Self::MalformedEnvelope(_)
            | Self::DecryptionFailed
            | Self::EncryptionFailed
            | Self::InvalidTimestamp(_) => None,
        }
    }

    /// Returns the wire label for the error, falling back to a generic label.
    #[must_use]
    pub const fn code_label(&self) -> &'static str {
        match self.code() {
            Some(code) => code.as_str(),
            None => "PCI_ERROR",
        }
    }
}
