//! Role permission policy.
//!
//! Which role may drive which transition is configuration, not code: the
//! policy is a serde-deserializable table handed to the checker, so changing
//! who can approve what never requires recompilation.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use vendora_core::{Role, ValidationResult};

use crate::order::PurchaseOrder;
use crate::status::EnhancedStatus;

/// What a single role is allowed to do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Target statuses this role may drive an order into.
    #[serde(default)]
    pub targets: Vec<EnhancedStatus>,
    /// Ceiling on the order total this role may approve, if any.
    #[serde(default)]
    pub approval_limit: Option<Decimal>,
    /// Bypass all target and amount checks.
    #[serde(default)]
    pub unrestricted: bool,
}

/// Role-keyed permission table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionPolicy {
    grants: HashMap<Role, RoleGrant>,
}

impl PermissionPolicy {
    pub fn new(grants: HashMap<Role, RoleGrant>) -> Self {
        Self { grants }
    }

    pub fn grant(&self, role: &Role) -> Option<&RoleGrant> {
        self.grants.get(role)
    }
}

impl Default for PermissionPolicy {
    /// The stock policy: admin unrestricted; manager approves (up to a
    /// ceiling), cancels, and receives; purchaser drafts, submits, and
    /// cancels; warehouse receives. Unknown roles get nothing.
    fn default() -> Self {
        use EnhancedStatus::*;
        let mut grants = HashMap::new();
        grants.insert(
            Role::admin(),
            RoleGrant {
                unrestricted: true,
                ..RoleGrant::default()
            },
        );
        grants.insert(
            Role::manager(),
            RoleGrant {
                targets: vec![Approved, Cancelled, PartiallyReceived, FullyReceived],
                approval_limit: Some(dec!(10000)),
                unrestricted: false,
            },
        );
        grants.insert(
            Role::purchaser(),
            RoleGrant {
                targets: vec![Draft, PendingApproval, Cancelled],
                approval_limit: None,
                unrestricted: false,
            },
        );
        grants.insert(
            Role::warehouse(),
            RoleGrant {
                targets: vec![PartiallyReceived, FullyReceived],
                approval_limit: None,
                unrestricted: false,
            },
        );
        Self { grants }
    }
}

/// Check whether `role` may drive `order` into `target` under `policy`.
///
/// Violations are returned, never thrown, with distinct codes so the caller
/// can present them alongside business-rule errors.
pub fn validate_user_permissions(
    policy: &PermissionPolicy,
    role: &Role,
    target: EnhancedStatus,
    order: &PurchaseOrder,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    let Some(grant) = policy.grant(role) else {
        result.block(
            "role",
            "INSUFFICIENT_PERMISSIONS",
            format!("role '{role}' has no purchase order permissions"),
        );
        return result;
    };

    if grant.unrestricted {
        return result;
    }

    if !grant.targets.contains(&target) {
        result.block(
            "role",
            "INSUFFICIENT_PERMISSIONS",
            format!("role '{role}' may not set status {target}"),
        );
    }

    if target == EnhancedStatus::Approved {
        if let Some(limit) = grant.approval_limit {
            if order.total() > limit {
                result.block(
                    "total",
                    "EXCEEDS_APPROVAL_LIMIT",
                    format!(
                        "order total {} exceeds the {} approval limit of role '{role}'",
                        order.total(),
                        limit
                    ),
                );
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderLine;
    use vendora_core::{ProductId, RoundingPolicy, SupplierId, UserId};

    fn order_totalling(total_units: Decimal) -> PurchaseOrder {
        PurchaseOrder::new(
            "PO-PERM",
            Some(SupplierId::new()),
            vec![OrderLine {
                line_no: 1,
                product_id: ProductId::new(),
                quantity: total_units,
                unit_cost: Decimal::ONE,
            }],
            Decimal::ZERO,
            UserId::new(),
            &RoundingPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn admin_is_unrestricted() {
        let policy = PermissionPolicy::default();
        let order = order_totalling(dec!(1000000));
        for target in [
            EnhancedStatus::Approved,
            EnhancedStatus::Cancelled,
            EnhancedStatus::Closed,
        ] {
            let result = validate_user_permissions(&policy, &Role::admin(), target, &order);
            assert!(result.is_valid(), "admin blocked from {target}");
        }
    }

    #[test]
    fn manager_approval_respects_the_ceiling() {
        let policy = PermissionPolicy::default();

        let small = order_totalling(dec!(9999));
        let result = validate_user_permissions(
            &policy,
            &Role::manager(),
            EnhancedStatus::Approved,
            &small,
        );
        assert!(result.is_valid());

        let large = order_totalling(dec!(10001));
        let result = validate_user_permissions(
            &policy,
            &Role::manager(),
            EnhancedStatus::Approved,
            &large,
        );
        assert!(result.has_error("EXCEEDS_APPROVAL_LIMIT"));
    }

    #[test]
    fn warehouse_only_receives() {
        let policy = PermissionPolicy::default();
        let order = order_totalling(dec!(100));

        let result = validate_user_permissions(
            &policy,
            &Role::warehouse(),
            EnhancedStatus::FullyReceived,
            &order,
        );
        assert!(result.is_valid());

        let result = validate_user_permissions(
            &policy,
            &Role::warehouse(),
            EnhancedStatus::Approved,
            &order,
        );
        assert!(result.has_error("INSUFFICIENT_PERMISSIONS"));
    }

    #[test]
    fn unknown_roles_get_nothing() {
        let policy = PermissionPolicy::default();
        let order = order_totalling(dec!(1));
        let result = validate_user_permissions(
            &policy,
            &Role::new("intern"),
            EnhancedStatus::Draft,
            &order,
        );
        assert!(result.has_error("INSUFFICIENT_PERMISSIONS"));
    }
}
