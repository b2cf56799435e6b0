//! Purchase order state machine.
//!
//! A static transition table defines which status edges exist; target-specific
//! business rules layer on top. Validation is pure and runs to completion so
//! the caller sees every violated rule, not just the first. Execution
//! re-validates, produces the updated order plus an immutable
//! [`StatusTransition`] record, and persists nothing; persistence belongs to
//! the caller.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use vendora_core::{RecordId, UserId, ValidationResult};

use crate::order::{PurchaseOrder, PurchaseOrderId};
use crate::status::EnhancedStatus;

use EnhancedStatus::*;

/// Allowed outgoing edges per status. `cancelled` and `closed` are terminal.
pub fn allowed_targets(from: EnhancedStatus) -> &'static [EnhancedStatus] {
    match from {
        Draft => &[PendingApproval, Cancelled],
        PendingApproval => &[Approved, Draft, Cancelled],
        Approved => &[SentToSupplier, PartiallyReceived, FullyReceived, Cancelled],
        SentToSupplier => &[PartiallyReceived, FullyReceived, Cancelled],
        PartiallyReceived => &[FullyReceived],
        FullyReceived => &[Closed],
        Cancelled | Closed => &[],
    }
}

/// Pure lookup against the static transition table.
pub fn can_transition(from: EnhancedStatus, to: EnhancedStatus) -> bool {
    allowed_targets(from).contains(&to)
}

/// Actor context for a transition attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionContext {
    pub actor: Option<UserId>,
    pub reason: Option<String>,
    /// Free-form metadata copied onto the transition record.
    #[serde(default)]
    pub metadata: JsonValue,
}

impl TransitionContext {
    pub fn by(actor: UserId) -> Self {
        Self {
            actor: Some(actor),
            ..Self::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Append-only audit record of one successful transition. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub id: RecordId,
    pub order_id: PurchaseOrderId,
    pub from: EnhancedStatus,
    pub to: EnhancedStatus,
    pub occurred_at: DateTime<Utc>,
    pub actor: Option<UserId>,
    pub reason: Option<String>,
    pub metadata: JsonValue,
}

/// Result of a successful [`execute_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub order: PurchaseOrder,
    pub transition: StatusTransition,
}

/// Validate a transition: table lookup first, then target-specific business
/// rules. All violations accumulate.
pub fn validate_transition(
    order: &PurchaseOrder,
    target: EnhancedStatus,
    context: &TransitionContext,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    let current = order.status();

    if !can_transition(current, target) {
        result.block(
            "status",
            "INVALID_TRANSITION",
            format!("cannot transition from {current} to {target}"),
        );
    }

    match target {
        PendingApproval => {
            if order.lines().is_empty() {
                result.block(
                    "lines",
                    "NO_LINE_ITEMS",
                    "order has no line items",
                );
            }
            if order.total() <= Decimal::ZERO {
                result.block(
                    "total",
                    "INVALID_TOTAL",
                    "order total must be greater than zero",
                );
            }
            if order.supplier_id().is_none() {
                result.block(
                    "supplier",
                    "NO_SUPPLIER",
                    "order has no supplier reference",
                );
            }
        }
        Approved => {
            if context.actor.is_none() {
                result.block("actor", "NO_APPROVER", "approval requires an actor identity");
            }
        }
        PartiallyReceived | FullyReceived => {
            if !matches!(current, Approved | SentToSupplier | PartiallyReceived) {
                result.block(
                    "status",
                    "NOT_READY_FOR_RECEIVING",
                    format!("order in status {current} cannot receive goods"),
                );
            }
        }
        Cancelled => {
            if matches!(current, FullyReceived | Closed) {
                result.block(
                    "status",
                    "CANNOT_CANCEL_RECEIVED",
                    "received orders cannot be cancelled",
                );
            }
        }
        _ => {}
    }

    result
}

/// Re-validate and execute a transition.
///
/// On success, returns the updated order (status changed, received date
/// stamped on first entry into `fully_received`) and a fresh transition
/// record. Deterministic apart from the generated record id and timestamps;
/// retrying with identical inputs yields identical derived state.
pub fn execute_transition(
    order: &PurchaseOrder,
    target: EnhancedStatus,
    context: &TransitionContext,
) -> Result<TransitionOutcome, ValidationResult> {
    let result = validate_transition(order, target, context);
    if !result.can_proceed() {
        return Err(result);
    }

    let from = order.status();
    let now = Utc::now();

    let mut updated = order.clone();
    updated.set_status(target);
    if target == FullyReceived {
        updated.stamp_received(now);
    }

    let transition = StatusTransition {
        id: RecordId::new(),
        order_id: order.id(),
        from,
        to: target,
        occurred_at: now,
        actor: context.actor,
        reason: context.reason.clone(),
        metadata: context.metadata.clone(),
    };

    Ok(TransitionOutcome {
        order: updated,
        transition,
    })
}

/// Advisory helper proposing the natural next step. Never executed
/// automatically; a suggestion surface for the orchestrator/UI.
///
/// `received` maps line numbers to *cumulative* received quantities; when
/// present it decides between partial and full receipt.
pub fn next_logical_status(
    order: &PurchaseOrder,
    received: Option<&HashMap<u32, Decimal>>,
) -> Option<EnhancedStatus> {
    match order.status() {
        Draft => Some(PendingApproval),
        PendingApproval => Some(Approved),
        Approved | SentToSupplier | PartiallyReceived => {
            if let Some(received) = received {
                let complete = order.lines().iter().all(|line| {
                    received
                        .get(&line.line_no)
                        .copied()
                        .unwrap_or(Decimal::ZERO)
                        >= line.quantity
                });
                let any = order.lines().iter().any(|line| {
                    received
                        .get(&line.line_no)
                        .copied()
                        .unwrap_or(Decimal::ZERO)
                        > Decimal::ZERO
                });
                if complete && !order.lines().is_empty() {
                    Some(FullyReceived)
                } else if any {
                    Some(PartiallyReceived)
                } else if order.status() == Approved {
                    Some(SentToSupplier)
                } else {
                    None
                }
            } else {
                match order.status() {
                    Approved => Some(SentToSupplier),
                    PartiallyReceived => Some(FullyReceived),
                    _ => None,
                }
            }
        }
        FullyReceived => Some(Closed),
        Cancelled | Closed => None,
    }
}
