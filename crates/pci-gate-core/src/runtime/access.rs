// crates/pci-gate-core/src/runtime/access.rs
// ============================================================================
// Module: Payment Access Control
// Description: Fail-closed permission checks for payment actors.
// Purpose: Enforce the static role table plus explicit per-actor grants.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Access is granted only when the permission appears in the role table or
//! in the actor's explicit grants. There is no hierarchy: `payments:refund`
//! does not imply `payments:update`.

use crate::core::actor::PaymentActor;
use crate::core::actor::PaymentPermission;
use crate::core::error::PciError;

/// Fails unless the actor holds `permission`.
///
/// # Errors
///
/// Returns [`PciError::AccessDenied`] naming the actor and permission.
pub fn assert_payment_access(
    actor: &PaymentActor,
    permission: PaymentPermission,
) -> Result<(), PciError> {
    if actor.holds(permission) {
        return Ok(());
    }
    Err(PciError::AccessDenied {
        actor_id: actor.id.clone(),
        permission,
    })
}
