// crates/pci-gate-core/src/runtime/transport.rs
// ============================================================================
// Module: Transport Guard
// Description: Secure-channel, access, and idempotency checks for requests.
// Purpose: Reject payment requests that arrive over insecure transports.
// Dependencies: url, crate::core
// ============================================================================

//! ## Overview
//! A request is on a secure channel when its URL scheme is `https`, when a
//! forwarding proxy reports `https`, or (when allowed) when the host is a
//! loopback name used in development and tests. Checks run in a fixed order:
//! transport, then access (if a permission and actor are present), then the
//! idempotency key for POST requests.
//!
//! Missing idempotency keys surface as [`PciError::IdempotencyKeyRequired`],
//! which reports the `PCI_INSECURE_TRANSPORT` code for compatibility with
//! existing callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;

use url::Host;
use url::Url;

use crate::core::actor::PaymentPermission;
use crate::core::error::PciError;
use crate::core::request::RequestContext;
use crate::core::request::RequestHeaders;
use crate::runtime::access::assert_payment_access;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Proxy header carrying the original protocol.
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";
/// RFC 7239 forwarding header.
pub const FORWARDED_HEADER: &str = "forwarded";
/// Idempotency key header names, in lookup order.
pub const IDEMPOTENCY_KEY_HEADERS: &[&str] = &["idempotency-key", "x-idempotency-key"];

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Transport enforcement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportPolicy {
    /// Accept plain HTTP on loopback hosts.
    pub allow_loopback: bool,
    /// Require an idempotency key on POST requests unless the request opts out.
    pub require_idempotency_key: bool,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            allow_loopback: true,
            require_idempotency_key: true,
        }
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Asserts transport security with the default policy.
///
/// # Errors
///
/// See [`assert_request_security_with_policy`].
pub fn assert_pci_api_request_security(
    context: &RequestContext,
    permission: Option<PaymentPermission>,
) -> Result<(), PciError> {
    assert_request_security_with_policy(context, permission, TransportPolicy::default())
}

/// Asserts transport security, access, and idempotency for a request.
///
/// # Errors
///
/// - [`PciError::InsecureTransport`] when no secure channel is evident.
/// - [`PciError::AccessDenied`] when a permission is supplied and the actor lacks it.
/// - [`PciError::IdempotencyKeyRequired`] for POST requests without a key.
pub fn assert_request_security_with_policy(
    context: &RequestContext,
    permission: Option<PaymentPermission>,
    policy: TransportPolicy,
) -> Result<(), PciError> {
    if !is_secure_transport(context, policy) {
        return Err(PciError::InsecureTransport);
    }
    if let (Some(permission), Some(actor)) = (permission, context.actor.as_ref()) {
        assert_payment_access(actor, permission)?;
    }
    let requires_key = context.require_idempotency_key.unwrap_or(policy.require_idempotency_key);
    if context.is_post() && requires_key && idempotency_key(&context.headers).is_none() {
        return Err(PciError::IdempotencyKeyRequired);
    }
    Ok(())
}

/// Returns the first non-blank idempotency key header value.
#[must_use]
pub fn idempotency_key(headers: &RequestHeaders) -> Option<&str> {
    IDEMPOTENCY_KEY_HEADERS
        .iter()
        .filter_map(|name| headers.get(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Returns true when the request arrived over a secure channel.
///
/// Forwarding headers are honoured even when the URL is a bare path.
#[must_use]
pub fn is_secure_transport(context: &RequestContext, policy: TransportPolicy) -> bool {
    if forwarded_proto_is_https(&context.headers) {
        return true;
    }
    let Ok(url) = Url::parse(context.url.trim()) else {
        return false;
    };
    if url.scheme() == "https" {
        return true;
    }
    policy.allow_loopback && url.host().is_some_and(|host| is_loopback_host(&host))
}

/// Returns true when a forwarding header reports HTTPS.
fn forwarded_proto_is_https(headers: &RequestHeaders) -> bool {
    if let Some(value) = headers.get(FORWARDED_PROTO_HEADER) {
        let first = value.split(',').next().unwrap_or_default().trim();
        if first.eq_ignore_ascii_case("https") {
            return true;
        }
    }
    headers.get(FORWARDED_HEADER).is_some_and(|value| {
        value
            .split(',')
            .next()
            .unwrap_or_default()
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .any(|(name, proto)| {
                name.trim().eq_ignore_ascii_case("proto")
                    && proto.trim().trim_matches('"').eq_ignore_ascii_case("https")
            })
    })
}

/// Returns true for `localhost` and loopback IP literals.
fn is_loopback_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(name) => name.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(addr) => IpAddr::V4(*addr).is_loopback(),
        Host::Ipv6(addr) => IpAddr::V6(*addr).is_loopback(),
    }
}
