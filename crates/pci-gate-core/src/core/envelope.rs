// crates/pci-gate-core/src/core/envelope.rs
// ============================================================================
// Module: Encryption Envelope
// Description: Persisted ciphertext plus the non-secret parameters to decrypt it.
// Purpose: Define the stable storage format for encrypted payment metadata.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Envelopes are produced by the encryption service and persisted by callers.
//! All binary fields are standard base64. The key itself is never embedded;
//! `key_version` only labels which operator key was used.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Algorithm tag written into every envelope.
pub const ENVELOPE_ALGORITHM: &str = "aes-256-gcm";
/// Key version label used when the caller does not supply one.
pub const DEFAULT_KEY_VERSION: &str = "v1";
/// Required key length in bytes.
pub const ENCRYPTION_KEY_BYTES: usize = 32;
/// Nonce length in bytes (96-bit).
pub const ENVELOPE_IV_BYTES: usize = 12;
/// Authentication tag length in bytes (128-bit).
pub const ENVELOPE_TAG_BYTES: usize = 16;

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Encrypted payment metadata envelope.
///
/// # Invariants
/// - `iv` decodes to [`ENVELOPE_IV_BYTES`] and `auth_tag` to
///   [`ENVELOPE_TAG_BYTES`] for envelopes produced by this crate.
/// - `ciphertext` is only decryptable with the matching key, iv, and tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionEnvelope {
    /// Algorithm tag.
    pub algorithm: String,
    /// Operator key version label.
    pub key_version: String,
    /// Base64 nonce.
    pub iv: String,
    /// Base64 authentication tag.
    pub auth_tag: String,
    /// Base64 ciphertext.
    pub ciphertext: String,
}
