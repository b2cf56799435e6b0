//! `vendora-purchasing` — purchase order lifecycle domain.
//!
//! Carries the canonical status vocabulary (plus the lossy legacy mapping
//! used at the persistence boundary), the purchase order model, the status
//! state machine, and the data-driven role permission policy.

pub mod machine;
pub mod order;
pub mod permissions;
pub mod status;

pub use machine::{
    StatusTransition, TransitionContext, TransitionOutcome, allowed_targets, can_transition,
    execute_transition, next_logical_status, validate_transition,
};
pub use order::{OrderLine, OrderSnapshot, PurchaseOrder, PurchaseOrderId};
pub use permissions::{PermissionPolicy, RoleGrant, validate_user_permissions};
pub use status::{EnhancedStatus, LegacyStatus};
