// crates/pci-gate-core/src/core/hashing.rs
// ============================================================================
// Module: PCI Gate Hashing
// Description: One-way digests for audit identifiers and canonical records.
// Purpose: Keep identifying audit fields out of storage in plaintext form.
// Dependencies: hmac, serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Identifying fields (resource ids, IP addresses) are stored only as digests:
//! HMAC-SHA-256 when an operator hash key is configured, plain SHA-256
//! otherwise. Whole audit records are hashed over RFC 8785 canonical JSON so
//! digests are stable regardless of key order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// Plain SHA-256.
    Sha256,
    /// HMAC-SHA-256 keyed by an operator secret.
    HmacSha256,
}

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Digest representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing digests.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes canonical JSON with SHA-256.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(&bytes))
}

/// Hashes raw bytes with SHA-256.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    HashDigest::new(HashAlgorithm::Sha256, &digest)
}

/// Computes HMAC-SHA-256 over `bytes` keyed by `key`.
#[must_use]
pub fn hmac_bytes(key: &[u8], bytes: &[u8]) -> HashDigest {
    // HMAC accepts keys of any length; the error arm is unreachable in practice.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(key) else {
        return hash_bytes(bytes);
    };
    mac.update(bytes);
    let digest = mac.finalize().into_bytes();
    HashDigest::new(HashAlgorithm::HmacSha256, &digest)
}

/// Hashes an identifying value, keyed when a hash key is supplied.
#[must_use]
pub fn hash_identifier(value: &str, hash_key: Option<&[u8]>) -> HashDigest {
    match hash_key {
        Some(key) => hmac_bytes(key, value.as_bytes()),
        None => hash_bytes(value.as_bytes()),
    }
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

/// Decodes a hex string (either case). Returns `None` on odd length or non-hex input.
#[must_use]
pub fn hex_decode(value: &str) -> Option<Vec<u8>> {
    let bytes = value.as_bytes();
    if bytes.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let high = hex_nibble(pair[0])?;
        let low = hex_nibble(pair[1])?;
        out.push((high << 4) | low);
    }
    Some(out)
}

/// Decodes a single ASCII hex digit.
const fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0' ..= b'9' => Some(byte - b'0'),
        b'a' ..= b'f' => Some(byte - b'a' + 10),
        b'A' ..= b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
