// crates/pci-gate-core/src/runtime/scanner.rs
// ============================================================================
// Module: Card Data Scanner
// Description: Detection and redaction of raw cardholder data in payloads.
// Purpose: Guarantee that PANs and card fields never pass the gate unredacted.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Payloads are walked depth-first as JSON values. A location is sensitive
//! when either:
//! - a string value's digit-only form has 13 to 19 digits and passes the Luhn
//!   checksum, or
//! - an object key, lowercased with non-alphanumerics stripped, contains one
//!   of the forbidden card-field substrings, or
//! - an object key is itself PAN-shaped.
//!
//! The processor token fields in [`TOKEN_FIELD_CANDIDATES`] are exempt from
//! name matching (`setupIntentId` contains `pin`); their values are still
//! scanned.
//!
//! [`assert_no_raw_card_data`] rejects on the first finding. Digit runs that
//! fail Luhn (phone numbers, order ids) are never flagged.
//! [`sanitize_pci_payload`] never fails and returns a redacted copy.
//!
//! Security posture: errors carry the path to the offending location, never
//! its value. PAN-shaped keys appear in paths and sanitized output as
//! [`REDACTION_MARKER`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::error::CardDataFinding;
use crate::core::error::PciError;
use crate::runtime::tokens::TOKEN_FIELD_CANDIDATES;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Replacement written over sensitive values.
pub const REDACTION_MARKER: &str = "[REDACTED]";
/// Maximum container nesting depth walked by the scanner.
pub const MAX_PAYLOAD_DEPTH: usize = 64;
/// Minimum PAN length in digits.
pub const PAN_MIN_DIGITS: usize = 13;
/// Maximum PAN length in digits.
pub const PAN_MAX_DIGITS: usize = 19;
/// Path label for the payload root.
const ROOT_PATH: &str = "$";

/// Normalized substrings that mark a field as card data.
pub const FORBIDDEN_FIELD_SUBSTRINGS: &[&str] = &[
    "cardnumber",
    "ccnumber",
    "creditcard",
    "pan",
    "cvv",
    "cvc",
    "cvn",
    "securitycode",
    "pin",
    "track",
    "magstripe",
    "expmonth",
    "expyear",
    "expdate",
    "expiry",
];

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Returns true when the digit string passes the Luhn checksum.
///
/// Non-digit input returns false.
#[must_use]
pub fn passes_luhn(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }
    let mut total = 0u32;
    for (index, ch) in digits.chars().rev().enumerate() {
        let Some(mut digit) = ch.to_digit(10) else {
            return false;
        };
        if index % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        total += digit;
    }
    total % 10 == 0
}

/// Returns true when the value's digit-only form looks like a PAN.
#[must_use]
pub fn is_probable_pan(value: &str) -> bool {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    (PAN_MIN_DIGITS ..= PAN_MAX_DIGITS).contains(&digits.len()) && passes_luhn(&digits)
}

/// Lowercases a field name and strips non-alphanumeric characters.
#[must_use]
pub fn normalize_field_name(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).map(|ch| ch.to_ascii_lowercase()).collect()
}

/// Returns true when the field name marks card data.
///
/// Processor token field names are never forbidden.
#[must_use]
pub fn is_forbidden_field_name(name: &str) -> bool {
    if TOKEN_FIELD_CANDIDATES.contains(&name) {
        return false;
    }
    let normalized = normalize_field_name(name);
    FORBIDDEN_FIELD_SUBSTRINGS.iter().any(|needle| normalized.contains(needle))
}

// ============================================================================
// SECTION: Assertion
// ============================================================================

/// Fails on the first raw card value or forbidden field found in `input`.
///
/// # Errors
///
/// Returns [`PciError::RawCardDataDetected`] with the offending path, or
/// [`PciError::PayloadTooDeep`] when nesting exceeds [`MAX_PAYLOAD_DEPTH`].
pub fn assert_no_raw_card_data(input: &Value) -> Result<(), PciError> {
    scan_value(input, ROOT_PATH, 0, ScanMode::Strict)
}

/// Fails unless `input` is free of card data once redaction has been applied.
///
/// Forbidden fields are accepted only when their value is exactly
/// [`REDACTION_MARKER`]; PAN-like strings and keys are rejected anywhere.
///
/// # Errors
///
/// Same as [`assert_no_raw_card_data`].
pub fn assert_redacted_payload(input: &Value) -> Result<(), PciError> {
    scan_value(input, ROOT_PATH, 0, ScanMode::Redacted)
}

/// Object-map form of [`assert_redacted_payload`].
///
/// # Errors
///
/// Same as [`assert_no_raw_card_data`].
pub fn assert_redacted_map(input: &Map<String, Value>) -> Result<(), PciError> {
    scan_map(input, ROOT_PATH, 0, ScanMode::Redacted)
}

/// Treatment of forbidden field names during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    /// Any forbidden field name fails.
    Strict,
    /// Forbidden field names holding the redaction marker pass.
    Redacted,
}

/// Recursive worker for the assertions.
fn scan_value(value: &Value, path: &str, depth: usize, mode: ScanMode) -> Result<(), PciError> {
    match value {
        Value::String(text) => {
            if is_probable_pan(text) {
                return Err(PciError::RawCardDataDetected {
                    path: path.to_string(),
                    finding: CardDataFinding::PrimaryAccountNumber,
                });
            }
            Ok(())
        }
        Value::Array(items) => {
            ensure_depth(path, depth)?;
            for (index, item) in items.iter().enumerate() {
                scan_value(item, &index_path(path, index), depth + 1, mode)?;
            }
            Ok(())
        }
        Value::Object(map) => scan_map(map, path, depth, mode),
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(()),
    }
}

/// Scans the entries of an object at `depth`.
fn scan_map(
    map: &Map<String, Value>,
    path: &str,
    depth: usize,
    mode: ScanMode,
) -> Result<(), PciError> {
    ensure_depth(path, depth)?;
    for (key, item) in map {
        let child = key_path(path, key);
        if is_probable_pan(key) {
            return Err(PciError::RawCardDataDetected {
                path: child,
                finding: CardDataFinding::PrimaryAccountNumber,
            });
        }
        if is_forbidden_field_name(key) {
            if mode == ScanMode::Redacted && is_redaction_marker(item) {
                continue;
            }
            return Err(PciError::RawCardDataDetected {
                path: child,
                finding: CardDataFinding::ForbiddenField,
            });
        }
        scan_value(item, &child, depth + 1, mode)?;
    }
    Ok(())
}

/// Rejects containers nested deeper than [`MAX_PAYLOAD_DEPTH`].
fn ensure_depth(path: &str, depth: usize) -> Result<(), PciError> {
    if depth >= MAX_PAYLOAD_DEPTH {
        return Err(PciError::PayloadTooDeep {
            path: path.to_string(),
            max_depth: MAX_PAYLOAD_DEPTH,
        });
    }
    Ok(())
}

// ============================================================================
// SECTION: Sanitization
// ============================================================================

/// Returns a redacted copy of `input`.
///
/// Forbidden fields are redacted whatever their value, PAN-like strings and
/// PAN-shaped keys are replaced with [`REDACTION_MARKER`] (such entries
/// collapse into one redacted entry), and containers nested past
/// [`MAX_PAYLOAD_DEPTH`] are replaced wholesale. Everything else is copied
/// unchanged.
#[must_use]
pub fn sanitize_pci_payload(input: &Value) -> Value {
    sanitize_value(input, 0)
}

/// Sanitizes a JSON object map.
#[must_use]
pub fn sanitize_pci_map(input: &Map<String, Value>) -> Map<String, Value> {
    sanitize_map(input, 0)
}

/// Recursive worker for [`sanitize_pci_payload`].
fn sanitize_value(value: &Value, depth: usize) -> Value {
    match value {
        Value::String(text) if is_probable_pan(text) => redacted(),
        Value::Array(_) | Value::Object(_) if depth >= MAX_PAYLOAD_DEPTH => redacted(),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| sanitize_value(item, depth + 1)).collect())
        }
        Value::Object(map) => Value::Object(sanitize_map(map, depth)),
        other => other.clone(),
    }
}

/// Sanitizes the entries of an object at `depth`.
fn sanitize_map(map: &Map<String, Value>, depth: usize) -> Map<String, Value> {
    map.iter()
        .map(|(key, item)| {
            if is_probable_pan(key) {
                return (REDACTION_MARKER.to_string(), redacted());
            }
            let value = if is_forbidden_field_name(key) {
                redacted()
            } else {
                sanitize_value(item, depth + 1)
            };
            (key.clone(), value)
        })
        .collect()
}

/// Returns true when the value is the redaction marker.
fn is_redaction_marker(value: &Value) -> bool {
    value.as_str() == Some(REDACTION_MARKER)
}

/// Returns the redaction marker as a JSON value.
fn redacted() -> Value {
    Value::String(REDACTION_MARKER.to_string())
}

// ============================================================================
// SECTION: Paths
// ============================================================================

/// Appends an object key to a path, masking PAN-shaped keys.
fn key_path(parent: &str, key: &str) -> String {
    if is_probable_pan(key) {
        return format!("{parent}.{REDACTION_MARKER}");
    }
    format!("{parent}.{key}")
}

/// Appends an array index to a path.
fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}
