// crates/pci-gate-core/src/runtime/headers.rs
// ============================================================================
// Module: Security Header Builder
// Description: Response headers required on payment endpoints.
// Purpose: Disable caching, sniffing, referrers, framing, and device APIs.
// Dependencies: http
// ============================================================================

//! ## Overview
//! The builder returns the fixed header set merged with caller overrides.
//! Override names match defaults case-insensitively and the caller's value
//! and spelling win.

use std::collections::BTreeMap;

use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;

/// Default payment response headers.
pub const PCI_SECURITY_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-store"),
    ("Pragma", "no-cache"),
    ("X-Content-Type-Options", "nosniff"),
    ("Referrer-Policy", "no-referrer"),
    ("X-Frame-Options", "DENY"),
    ("Permissions-Policy", "camera=(), microphone=(), geolocation=(), payment=(self)"),
];

/// Builds the security header set with optional overrides.
#[must_use]
pub fn build_pci_security_headers(
    extra: Option<&BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = PCI_SECURITY_HEADERS
        .iter()
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect();
    for (name, value) in extra.into_iter().flatten() {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        headers.insert(name.clone(), value.clone());
    }
    headers
}

/// Converts a header set into an [`HeaderMap`], skipping invalid entries.
#[must_use]
pub fn to_header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        if let (Ok(name), Ok(value)) =
            (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value))
        {
            map.insert(name, value);
        }
    }
    map
}
