// crates/pci-gate-core/src/core/token.rs
// ============================================================================
// Module: Processor Token References
// Description: Tagged references to card data held by the payment processor.
// Purpose: Represent card-presenting operations without cardholder data.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`StripeTokenReference`] is produced only by the token extractor after the
//! source payload was checked for raw card data. References are transient and
//! consumed by the payment call they enable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Token Kinds
// ============================================================================

/// Processor token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StripeTokenKind {
    /// `pm_...` payment method.
    PaymentMethod,
    /// `tok_...` one-time token.
    Token,
    /// `src_...` legacy source.
    Source,
    /// `pi_...` payment intent.
    PaymentIntent,
    /// `seti_...` setup intent.
    SetupIntent,
    /// `pi_..._secret_...` or `seti_..._secret_...` client secret.
    ClientSecret,
}

impl StripeTokenKind {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentMethod => "payment_method",
            Self::Token => "token",
            Self::Source => "source",
            Self::PaymentIntent => "payment_intent",
            Self::SetupIntent => "setup_intent",
            Self::ClientSecret => "client_secret",
        }
    }
}

impl fmt::Display for StripeTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Token Reference
// ============================================================================

/// Validated processor token reference.
///
/// # Invariants
/// - `id` matched the shape registered for `kind` at extraction time.
/// - `id` never contains a PAN or security code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeTokenReference {
    /// Token kind.
    #[serde(rename = "type")]
    pub kind: StripeTokenKind,
    /// Token identifier.
    pub id: String,
}
