// crates/pci-gate-core/src/core/request.rs
// ============================================================================
// Module: Payment Request Context
// Description: Transport-level view of an inbound payment request.
// Purpose: Carry method, URL, headers, and actor into the transport guard.
// Dependencies: http, serde
// ============================================================================

//! ## Overview
//! The gate does not own an HTTP stack. Callers translate their framework's
//! request into a [`RequestContext`]. Headers can come from an
//! [`http::HeaderMap`] or from plain key/value pairs; lookups are always
//! case-insensitive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use http::HeaderMap;
use serde::Deserialize;
use serde::Serialize;

use crate::core::actor::PaymentActor;

// ============================================================================
// SECTION: Headers
// ============================================================================

/// Case-insensitive request header collection.
///
/// # Invariants
/// - Keys are stored lowercased; repeated headers keep the first value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct RequestHeaders {
    /// Lowercased header name to value.
    entries: BTreeMap<String, String>,
}

impl RequestHeaders {
    /// Creates an empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds headers from key/value pairs.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.insert(name.as_ref(), value);
        }
        headers
    }

    /// Builds headers from an [`http::HeaderMap`], skipping non-UTF-8 values.
    #[must_use]
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut headers = Self::new();
        for (name, value) in map {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str(), value);
            }
        }
        headers
    }

    /// Inserts a header unless one with the same name is already present.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries.entry(name.to_ascii_lowercase()).or_insert_with(|| value.into());
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

impl From<BTreeMap<String, String>> for RequestHeaders {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::from_pairs(map)
    }
}

impl From<RequestHeaders> for BTreeMap<String, String> {
    fn from(headers: RequestHeaders) -> Self {
        headers.entries
    }
}

impl From<&HeaderMap> for RequestHeaders {
    fn from(map: &HeaderMap) -> Self {
        Self::from_header_map(map)
    }
}

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context for transport and access checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// HTTP method.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Request headers.
    #[serde(default)]
    pub headers: RequestHeaders,
    /// Authenticated actor, when known.
    #[serde(default)]
    pub actor: Option<PaymentActor>,
    /// Per-request override for the idempotency key requirement.
    #[serde(default)]
    pub require_idempotency_key: Option<bool>,
}

impl RequestContext {
    /// Builds a context with no headers or actor.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: RequestHeaders::new(),
            actor: None,
            require_idempotency_key: None,
        }
    }

    /// Returns a copy with the given header added.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns a copy with the actor set.
    #[must_use]
    pub fn with_actor(mut self, actor: PaymentActor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Returns a copy with the idempotency requirement overridden.
    #[must_use]
    pub fn with_idempotency_requirement(mut self, required: bool) -> Self {
        self.require_idempotency_key = Some(required);
        self
    }

    /// Returns true for POST requests.
    #[must_use]
    pub fn is_post(&self) -> bool {
        self.method.trim().eq_ignore_ascii_case("POST")
    }
}
