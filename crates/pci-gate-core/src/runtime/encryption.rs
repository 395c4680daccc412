// crates/pci-gate-core/src/runtime/encryption.rs
// ============================================================================
// Module: Encryption Service
// Description: AES-256-GCM envelope encryption for payment metadata.
// Purpose: Keep sensitive non-card metadata encrypted at rest.
// Dependencies: aes-gcm, base64, rand, crate::core
// ============================================================================

//! ## Overview
//! Each call resolves key material, decodes it to exactly 32 bytes, and
//! encrypts under a fresh 96-bit nonce. Keys are resolved on every call and
//! never cached.
//!
//! Key resolution order:
//! 1. `EncryptionOptions::key`
//! 2. `PCI_ENCRYPTION_KEY`
//! 3. `PAYMENT_ENCRYPTION_KEY`
//!
//! Key decoding order: 64 hex characters, then standard base64 decoding to
//! 32 bytes, then (only under [`KeyMaterialPolicy::AllowRawUtf8`]) the raw
//! UTF-8 bytes.
//!
//! Security posture: authentication failures surface as
//! [`PciError::DecryptionFailed`]; altered ciphertext never yields plaintext.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aes_gcm::Aes256Gcm;
use aes_gcm::Nonce;
use aes_gcm::aead::Aead;
use aes_gcm::aead::KeyInit;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde::Serialize;

use crate::core::envelope::DEFAULT_KEY_VERSION;
use crate::core::envelope::ENCRYPTION_KEY_BYTES;
use crate::core::envelope::ENVELOPE_ALGORITHM;
use crate::core::envelope::ENVELOPE_IV_BYTES;
use crate::core::envelope::ENVELOPE_TAG_BYTES;
use crate::core::envelope::EncryptionEnvelope;
use crate::core::error::PciError;
use crate::core::hashing::hex_decode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Primary key environment variable.
pub const PCI_ENCRYPTION_KEY_ENV: &str = "PCI_ENCRYPTION_KEY";
/// Fallback key environment variable.
pub const PAYMENT_ENCRYPTION_KEY_ENV: &str = "PAYMENT_ENCRYPTION_KEY";
/// Environment variables consulted for key material, in order.
pub const ENCRYPTION_KEY_ENV_VARS: &[&str] = &[PCI_ENCRYPTION_KEY_ENV, PAYMENT_ENCRYPTION_KEY_ENV];

// ============================================================================
// SECTION: Options
// ============================================================================

/// Accepted key material encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMaterialPolicy {
    /// Hex or base64 only.
    #[default]
    Strict,
    /// Hex, base64, or exactly 32 raw UTF-8 bytes.
    AllowRawUtf8,
}

/// Per-call encryption options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionOptions {
    /// Explicit key material overriding the environment.
    pub key: Option<String>,
    /// Key version label written into new envelopes.
    pub key_version: Option<String>,
    /// Accepted key encodings.
    pub key_policy: KeyMaterialPolicy,
}

impl EncryptionOptions {
    /// Returns options that use an explicit key.
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Sets the key version label.
    #[must_use]
    pub fn key_version(mut self, version: impl Into<String>) -> Self {
        self.key_version = Some(version.into());
        self
    }

    /// Sets the key material policy.
    #[must_use]
    pub const fn key_policy(mut self, policy: KeyMaterialPolicy) -> Self {
        self.key_policy = policy;
        self
    }
}

// ============================================================================
// SECTION: Key Material
// ============================================================================

/// Resolves key material from options, then the process environment.
///
/// # Errors
///
/// See [`resolve_encryption_key_with`].
pub fn resolve_encryption_key(options: &EncryptionOptions) -> Result<[u8; 32], PciError> {
    resolve_encryption_key_with(options, |name| std::env::var(name).ok())
}

/// Resolves key material from options, then `lookup` for each key variable.
///
/// # Errors
///
/// - [`PciError::EncryptionKeyMissing`] when no non-blank source is found.
/// - [`PciError::EncryptionKeyInvalid`] when the material does not decode.
pub fn resolve_encryption_key_with<F>(
    options: &EncryptionOptions,
    lookup: F,
) -> Result<[u8; 32], PciError>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = options.key.as_deref().map(str::trim).filter(|key| !key.is_empty());
    let raw = match explicit {
        Some(key) => key.to_string(),
        None => ENCRYPTION_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or(PciError::EncryptionKeyMissing)?,
    };
    decode_key_material(&raw, options.key_policy)
}

/// Decodes key material to exactly 32 bytes.
///
/// # Errors
///
/// Returns [`PciError::EncryptionKeyInvalid`] when no accepted encoding
/// yields 32 bytes.
pub fn decode_key_material(raw: &str, policy: KeyMaterialPolicy) -> Result<[u8; 32], PciError> {
    if raw.len() == ENCRYPTION_KEY_BYTES * 2
        && let Some(bytes) = hex_decode(raw)
    {
        return key_array(&bytes);
    }
    if let Ok(bytes) = STANDARD.decode(raw)
        && bytes.len() == ENCRYPTION_KEY_BYTES
    {
        return key_array(&bytes);
    }
    match policy {
        KeyMaterialPolicy::AllowRawUtf8 => key_array(raw.as_bytes()),
        KeyMaterialPolicy::Strict => Err(PciError::EncryptionKeyInvalid),
    }
}

/// Copies a 32-byte slice into a key array.
fn key_array(bytes: &[u8]) -> Result<[u8; 32], PciError> {
    <[u8; 32]>::try_from(bytes).map_err(|_| PciError::EncryptionKeyInvalid)
}

// ============================================================================
// SECTION: Encrypt / Decrypt
// ============================================================================

/// Encrypts metadata using key material from options or the environment.
///
/// # Errors
///
/// See [`encrypt_with_key`] and [`resolve_encryption_key`].
pub fn encrypt_sensitive_payment_metadata(
    plaintext: &str,
    options: &EncryptionOptions,
) -> Result<EncryptionEnvelope, PciError> {
    let key = resolve_encryption_key(options)?;
    encrypt_with_key(plaintext, &key, options.key_version.as_deref())
}

/// Decrypts an envelope using key material from options or the environment.
///
/// # Errors
///
/// See [`decrypt_with_key`] and [`resolve_encryption_key`].
pub fn decrypt_sensitive_payment_metadata(
    envelope: &EncryptionEnvelope,
    options: &EncryptionOptions,
) -> Result<String, PciError> {
    ensure_supported_algorithm(envelope)?;
    let key = resolve_encryption_key(options)?;
    decrypt_with_key(envelope, &key)
}

/// Encrypts metadata under an already-decoded key.
///
/// # Errors
///
/// Returns [`PciError::EncryptionFailed`] when the cipher rejects the input.
pub fn encrypt_with_key(
    plaintext: &str,
    key: &[u8; 32],
    key_version: Option<&str>,
) -> Result<EncryptionEnvelope, PciError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| PciError::EncryptionKeyInvalid)?;
    let mut iv = [0u8; ENVELOPE_IV_BYTES];
    OsRng.fill_bytes(&mut iv);
    let sealed = cipher
        .encrypt(&Nonce::from(iv), plaintext.as_bytes())
        .map_err(|_| PciError::EncryptionFailed)?;
    let split = sealed.len().checked_sub(ENVELOPE_TAG_BYTES).ok_or(PciError::EncryptionFailed)?;
    let (ciphertext, tag) = sealed.split_at(split);
    let key_version = key_version.map(str::trim).filter(|version| !version.is_empty());
    Ok(EncryptionEnvelope {
        algorithm: ENVELOPE_ALGORITHM.to_string(),
        key_version: key_version.unwrap_or(DEFAULT_KEY_VERSION).to_string(),
        iv: STANDARD.encode(iv),
        auth_tag: STANDARD.encode(tag),
        ciphertext: STANDARD.encode(ciphertext),
    })
}

/// Authenticates and decrypts an envelope under an already-decoded key.
///
/// # Errors
///
/// - [`PciError::UnsupportedAlgorithm`] for foreign algorithm tags.
/// - [`PciError::MalformedEnvelope`] for undecodable or wrongly sized fields.
/// - [`PciError::DecryptionFailed`] when authentication fails.
pub fn decrypt_with_key(envelope: &EncryptionEnvelope, key: &[u8; 32]) -> Result<String, PciError> {
    ensure_supported_algorithm(envelope)?;
    let iv = decode_field("iv", &envelope.iv)?;
    let tag = decode_field("authTag", &envelope.auth_tag)?;
    let ciphertext = decode_field("ciphertext", &envelope.ciphertext)?;
    let iv = <[u8; ENVELOPE_IV_BYTES]>::try_from(iv.as_slice())
        .map_err(|_| PciError::MalformedEnvelope("iv must be 12 bytes".to_string()))?;
    if tag.len() != ENVELOPE_TAG_BYTES {
        return Err(PciError::MalformedEnvelope("authTag must be 16 bytes".to_string()));
    }
    let mut sealed = ciphertext;
    sealed.extend_from_slice(&tag);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| PciError::EncryptionKeyInvalid)?;
    let plaintext = cipher
        .decrypt(&Nonce::from(iv), sealed.as_slice())
        .map_err(|_| PciError::DecryptionFailed)?;
    String::from_utf8(plaintext)
        .map_err(|_| PciError::MalformedEnvelope("plaintext is not utf-8".to_string()))
}

/// Rejects envelopes produced by another algorithm.
fn ensure_supported_algorithm(envelope: &EncryptionEnvelope) -> Result<(), PciError> {
    if envelope.algorithm == ENVELOPE_ALGORITHM {
        return Ok(());
    }
    Err(PciError::UnsupportedAlgorithm(envelope.algorithm.clone()))
}

/// Decodes a base64 envelope field.
fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, PciError> {
    STANDARD
        .decode(value)
        .map_err(|_| PciError::MalformedEnvelope(format!("{name} is not valid base64")))
}
