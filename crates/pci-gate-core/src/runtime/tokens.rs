// crates/pci-gate-core/src/runtime/tokens.rs
// ============================================================================
// Module: Token Extractor
// Description: Locates and validates processor token references in payloads.
// Purpose: Ensure card-presenting requests carry tokens, never card data.
// Dependencies: regex, serde_json
// ============================================================================

//! ## Overview
//! Extraction first asserts the payload is free of raw card data, then scans
//! a fixed, ordered list of candidate fields. The first candidate holding a
//! non-empty string decides the outcome: it either matches one of the known
//! token shapes or the request is rejected as carrying an invalid token.
//!
//! Token patterns are compiled once into a process-wide table. A pattern that
//! fails to compile is dropped, which can only reject more input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::core::error::PciError;
use crate::core::token::StripeTokenKind;
use crate::core::token::StripeTokenReference;
use crate::runtime::scanner::assert_no_raw_card_data;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Candidate fields, in lookup order.
pub const TOKEN_FIELD_CANDIDATES: &[&str] = &[
    "paymentMethodId",
    "paymentMethod",
    "payment_method",
    "token",
    "source",
    "paymentIntentId",
    "payment_intent",
    "setupIntentId",
    "setup_intent",
    "clientSecret",
    "client_secret",
];

/// Token shapes, most specific first.
const TOKEN_PATTERN_SOURCES: &[(StripeTokenKind, &str)] = &[
    (StripeTokenKind::ClientSecret, r"^(?:pi|seti)_[A-Za-z0-9]+_secret_[A-Za-z0-9]+$"),
    (StripeTokenKind::PaymentMethod, r"^pm_[A-Za-z0-9_]+$"),
    (StripeTokenKind::Token, r"^tok_[A-Za-z0-9_]+$"),
    (StripeTokenKind::Source, r"^src_[A-Za-z0-9_]+$"),
    (StripeTokenKind::SetupIntent, r"^seti_[A-Za-z0-9]+$"),
    (StripeTokenKind::PaymentIntent, r"^pi_[A-Za-z0-9]+$"),
];

/// Compiled token shapes.
static TOKEN_PATTERNS: LazyLock<Vec<(StripeTokenKind, Regex)>> = LazyLock::new(|| {
    TOKEN_PATTERN_SOURCES
        .iter()
        .filter_map(|(kind, source)| Regex::new(source).ok().map(|regex| (*kind, regex)))
        .collect()
});

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies a token identifier by shape.
#[must_use]
pub fn classify_stripe_token(id: &str) -> Option<StripeTokenKind> {
    TOKEN_PATTERNS.iter().find(|(_, regex)| regex.is_match(id)).map(|(kind, _)| *kind)
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Extracts the processor token reference from a payload.
///
/// # Errors
///
/// - [`PciError::RawCardDataDetected`] when the payload carries card data.
/// - [`PciError::InvalidToken`] naming the first populated candidate field
///   whose value matches no token shape.
/// - [`PciError::TokenRequired`] when no candidate field is populated.
pub fn extract_stripe_token_reference(input: &Value) -> Result<StripeTokenReference, PciError> {
    assert_no_raw_card_data(input)?;
    let Some(map) = input.as_object() else {
        return Err(PciError::TokenRequired);
    };
    for field in TOKEN_FIELD_CANDIDATES {
        let Some(candidate) = map.get(*field).and_then(Value::as_str) else {
            continue;
        };
        let candidate = candidate.trim();
        if candidate.is_empty() {
            continue;
        }
        return classify_stripe_token(candidate)
            .map(|kind| StripeTokenReference {
                kind,
                id: candidate.to_string(),
            })
            .ok_or_else(|| PciError::InvalidToken {
                field: (*field).to_string(),
            });
    }
    Err(PciError::TokenRequired)
}
