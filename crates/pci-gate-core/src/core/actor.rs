// crates/pci-gate-core/src/core/actor.rs
// ============================================================================
// Module: Payment Actors
// Description: Roles, permissions, and caller identity for payment operations.
// Purpose: Provide the static role table used by access enforcement.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Actors carry a fixed role and an optional set of explicit grants. The role
//! table is a compile-time constant; explicit grants are additive only and
//! there is no inheritance between permissions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Permissions
// ============================================================================

/// Payment permissions.
///
/// # Invariants
/// - Wire labels are stable (`payments:<verb>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaymentPermission {
    /// Create payments.
    #[serde(rename = "payments:create")]
    Create,
    /// Update payments.
    #[serde(rename = "payments:update")]
    Update,
    /// Read payments.
    #[serde(rename = "payments:read")]
    Read,
    /// Refund payments.
    #[serde(rename = "payments:refund")]
    Refund,
    /// Read the payment audit trail.
    #[serde(rename = "payments:audit")]
    Audit,
}

/// Every payment permission, in declaration order.
pub const ALL_PAYMENT_PERMISSIONS: &[PaymentPermission] = &[
    PaymentPermission::Create,
    PaymentPermission::Update,
    PaymentPermission::Read,
    PaymentPermission::Refund,
    PaymentPermission::Audit,
];

impl PaymentPermission {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "payments:create",
            Self::Update => "payments:update",
            Self::Read => "payments:read",
            Self::Refund => "payments:refund",
            Self::Audit => "payments:audit",
        }
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        ALL_PAYMENT_PERMISSIONS.iter().copied().find(|permission| permission.as_str() == value)
    }
}

impl fmt::Display for PaymentPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Roles
// ============================================================================

/// Actor roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRole {
    /// Internal service account.
    Service,
    /// Platform administrator.
    Admin,
    /// Customer support agent.
    Support,
    /// End user (tenant or landlord).
    User,
    /// Compliance auditor.
    Auditor,
}

impl PaymentRole {
    /// Returns the permissions statically granted to the role.
    #[must_use]
    pub const fn permissions(self) -> &'static [PaymentPermission] {
        match self {
            Self::Service => &[
                PaymentPermission::Create,
                PaymentPermission::Update,
                PaymentPermission::Read,
                PaymentPermission::Audit,
            ],
            Self::Admin => ALL_PAYMENT_PERMISSIONS,
            Self::Support => &[PaymentPermission::Read],
            Self::User => &[PaymentPermission::Create, PaymentPermission::Read],
            Self::Auditor => &[PaymentPermission::Read, PaymentPermission::Audit],
        }
    }

    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Admin => "admin",
            Self::Support => "support",
            Self::User => "user",
            Self::Auditor => "auditor",
        }
    }
}

// ============================================================================
// SECTION: Actor
// ============================================================================

/// Caller attempting a payment operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentActor {
    /// Actor identifier.
    pub id: String,
    /// Actor role.
    pub role: PaymentRole,
    /// Explicit grants in addition to the role table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<PaymentPermission>>,
}

impl PaymentActor {
    /// Builds an actor with no explicit grants.
    #[must_use]
    pub fn new(id: impl Into<String>, role: PaymentRole) -> Self {
        Self {
            id: id.into(),
            role,
            permissions: None,
        }
    }

    /// Returns a copy with an additional explicit grant.
    #[must_use]
    pub fn with_permission(mut self, permission: PaymentPermission) -> Self {
        self.permissions.get_or_insert_with(BTreeSet::new).insert(permission);
        self
    }

    /// Returns true when the role table or explicit grants include the permission.
    #[must_use]
    pub fn holds(&self, permission: PaymentPermission) -> bool {
        self.role.permissions().contains(&permission)
            || self.permissions.as_ref().is_some_and(|granted| granted.contains(&permission))
    }
}
