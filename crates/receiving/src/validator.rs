//! The receiving tolerance validator.
//!
//! `validate_receiving` is a pure function: receipt lines plus context plus
//! configuration in, one accumulated result out. Rule groups run
//! independently and never short-circuit, except that an empty receipt ends
//! validation immediately: there is nothing left to check.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use vendora_core::{ProductId, Role, ValidationResult};

use crate::config::{DamagedItemPolicy, ToleranceConfig, ToleranceMode};
use crate::receipt::{ItemCondition, QualityStatus, ReceiptItem};

/// Context of one receiving action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivingContext {
    pub role: Role,
    /// The receipt is explicitly flagged as partial.
    pub is_partial: bool,
    pub partial_reason: Option<String>,
    /// Partial receipts already recorded for this order.
    pub prior_partial_receipts: u32,
    /// Date the goods arrive; expiry windows are measured from here.
    pub receipt_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    SupplierNotificationPending,
}

/// Ledger-style side entry produced by validation (not an error: a fact the
/// orchestrator must act on).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivingAdjustment {
    pub kind: AdjustmentKind,
    pub line_no: u32,
    pub product_id: ProductId,
    pub note: String,
}

/// Validation outcome plus pending adjustments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivingValidation {
    pub checks: ValidationResult,
    pub adjustments: Vec<ReceivingAdjustment>,
}

impl ReceivingValidation {
    pub fn is_valid(&self) -> bool {
        self.checks.is_valid()
    }

    pub fn can_proceed(&self) -> bool {
        self.checks.can_proceed()
    }

    pub fn requires_approval(&self) -> bool {
        self.checks.requires_approval
    }
}

/// Deviation measured according to the configured mode.
fn deviation_measure(deviation: Decimal, ordered: Decimal, mode: ToleranceMode) -> Decimal {
    match mode {
        ToleranceMode::Percentage => deviation / ordered * dec!(100),
        ToleranceMode::Units => deviation,
    }
}

/// Validate a batch of receipt lines.
pub fn validate_receiving(
    items: &[ReceiptItem],
    context: &ReceivingContext,
    config: &ToleranceConfig,
) -> ReceivingValidation {
    let mut out = ReceivingValidation::default();

    if items.is_empty() {
        out.checks
            .block("items", "NO_ITEMS_RECEIVED", "receipt contains no items");
        return out;
    }

    if !config.receiving_roles.contains(&context.role) {
        out.checks.block(
            "role",
            "INSUFFICIENT_PERMISSIONS",
            format!("role '{}' may not receive goods", context.role),
        );
    }

    for (idx, item) in items.iter().enumerate() {
        if items[..idx].iter().any(|prev| prev.line_no == item.line_no) {
            out.checks.block(
                "items",
                "DUPLICATE_RECEIPT_LINE",
                format!("order line {} appears more than once", item.line_no),
            );
        }
    }

    check_partial(context, config, &mut out.checks);

    for item in items {
        check_quantity(item, context, config, &mut out.checks);
        check_quality(item, context, config, &mut out.checks);
        check_expiry(item, context, config, &mut out.checks);
        check_damage(item, config, &mut out);
    }

    out
}

fn check_partial(
    context: &ReceivingContext,
    config: &ToleranceConfig,
    checks: &mut ValidationResult,
) {
    if !context.is_partial {
        return;
    }
    if !config.partial.enabled {
        checks.block(
            "partial",
            "PARTIAL_NOT_ENABLED",
            "partial receiving is not enabled",
        );
    }
    if context
        .partial_reason
        .as_deref()
        .is_none_or(|reason| reason.trim().is_empty())
    {
        checks.block(
            "partial",
            "PARTIAL_REASON_REQUIRED",
            "a reason is required for partial receipts",
        );
    }
    if context.prior_partial_receipts >= config.partial.max_partial_receipts {
        checks.block(
            "partial",
            "MAX_PARTIAL_RECEIPTS",
            format!(
                "order already has {} partial receipts (maximum {})",
                context.prior_partial_receipts, config.partial.max_partial_receipts
            ),
        );
    }
}

fn check_quantity(
    item: &ReceiptItem,
    context: &ReceivingContext,
    config: &ToleranceConfig,
    checks: &mut ValidationResult,
) {
    if item.ordered_quantity <= Decimal::ZERO {
        return;
    }

    let cumulative = item.cumulative_received();
    let over = cumulative - item.ordered_quantity;

    if over > Decimal::ZERO {
        let rules = &config.over;
        let measure = deviation_measure(over, item.ordered_quantity, rules.mode);
        if measure >= rules.block_threshold {
            checks.block(
                "quantity",
                "OVER_RECEIPT_BLOCKED",
                format!(
                    "line {}: cumulative {} exceeds ordered {} beyond the block threshold",
                    item.line_no, cumulative, item.ordered_quantity
                ),
            );
        } else if measure > rules.tolerance {
            checks.require_approval(rules.approval_roles.iter().cloned());
            checks.warn(
                "quantity",
                "OVER_RECEIPT_APPROVAL",
                format!(
                    "line {}: over-receipt of {} requires approval",
                    item.line_no, over
                ),
            );
        } else if measure > rules.warning_threshold {
            checks.warn(
                "quantity",
                "OVER_RECEIPT_WARNING",
                format!("line {}: over-receipt of {}", item.line_no, over),
            );
        }
        return;
    }

    // Short deliveries are advisory only, and a receipt explicitly flagged
    // partial already explains the shortfall.
    if context.is_partial {
        return;
    }
    let short = item.ordered_quantity - cumulative;
    if short > Decimal::ZERO {
        let rules = &config.under;
        let measure = deviation_measure(short, item.ordered_quantity, rules.mode);
        if measure > rules.tolerance {
            checks.warn(
                "quantity",
                "UNDER_RECEIPT_WARNING",
                format!(
                    "line {}: received {} of {} ordered",
                    item.line_no, cumulative, item.ordered_quantity
                ),
            );
        }
    }
}

fn check_quality(
    item: &ReceiptItem,
    context: &ReceivingContext,
    config: &ToleranceConfig,
    checks: &mut ValidationResult,
) {
    let policy = &config.quality;
    if !policy.enabled {
        return;
    }

    let Some(quality) = item.quality else {
        checks.block(
            "quality",
            "QUALITY_CHECK_REQUIRED",
            format!("line {}: no quality outcome recorded", item.line_no),
        );
        return;
    };

    if !policy.recorder_roles.contains(&context.role) {
        checks.block(
            "quality",
            "QUALITY_RECORDER_NOT_AUTHORIZED",
            format!(
                "role '{}' may not record quality outcomes",
                context.role
            ),
        );
    }

    if quality == QualityStatus::Rejected {
        match policy.damaged_item_policy {
            DamagedItemPolicy::PartialAccept => checks.warn(
                "quality",
                "QUALITY_REJECTED",
                format!("line {}: quality rejected, accepting under partial-accept policy", item.line_no),
            ),
            DamagedItemPolicy::RejectOutright => checks.block(
                "quality",
                "QUALITY_REJECTED",
                format!("line {}: quality rejected", item.line_no),
            ),
        }
    }
}

fn check_expiry(
    item: &ReceiptItem,
    context: &ReceivingContext,
    config: &ToleranceConfig,
    checks: &mut ValidationResult,
) {
    let policy = &config.expiry;

    let expired_by_date = item
        .expiry_date
        .is_some_and(|date| date < context.receipt_date);
    if item.condition == ItemCondition::Expired || expired_by_date {
        if policy.reject_expired {
            checks.block(
                "expiry",
                "ITEM_EXPIRED",
                format!("line {}: item is already expired", item.line_no),
            );
        } else {
            checks.warn(
                "expiry",
                "ITEM_EXPIRED",
                format!("line {}: item is already expired", item.line_no),
            );
        }
        return;
    }

    let Some(date) = item.expiry_date else {
        return;
    };
    let days_left = (date - context.receipt_date).num_days();
    if days_left <= policy.near_expiry_days {
        checks.require_approval(policy.approval_roles.iter().cloned());
        checks.warn(
            "expiry",
            "NEAR_EXPIRY",
            format!("line {}: expires in {} days", item.line_no, days_left),
        );
    } else if days_left <= policy.warning_days {
        checks.warn(
            "expiry",
            "EXPIRY_WARNING",
            format!("line {}: expires in {} days", item.line_no, days_left),
        );
    }
}

fn check_damage(item: &ReceiptItem, config: &ToleranceConfig, out: &mut ReceivingValidation) {
    if item.condition != ItemCondition::Damaged {
        return;
    }

    let Some(report) = &item.damage_report else {
        out.checks.block(
            "damage",
            "DAMAGE_REPORT_REQUIRED",
            format!("line {}: damaged items need a damage report", item.line_no),
        );
        return;
    };

    if !config.damage.categories.iter().any(|c| c == &report.category) {
        out.checks.warn(
            "damage",
            "UNKNOWN_DAMAGE_CATEGORY",
            format!(
                "line {}: unrecognized damage category '{}'",
                item.line_no, report.category
            ),
        );
    }

    if config.damage.require_supplier_notification && !report.supplier_notified {
        out.adjustments.push(ReceivingAdjustment {
            kind: AdjustmentKind::SupplierNotificationPending,
            line_no: item.line_no,
            product_id: item.product_id,
            note: format!(
                "supplier notification pending for damaged line {} ({})",
                item.line_no, report.category
            ),
        });
    }
}
