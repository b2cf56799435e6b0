//! Mapping cost results to general-ledger adjustments.
//!
//! A pure mapping with no side effects: each cost result becomes one signed
//! inventory-value entry. Account codes default to placeholders and are
//! caller-overridable configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{ProductId, RoundingPolicy};

use crate::weighted_average::CostResult;

/// GL account codes used for inventory revaluation entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlAccounts {
    /// Inventory asset account.
    pub inventory_account: String,
    /// Purchase price variance / adjustment account.
    pub adjustment_account: String,
}

impl Default for GlAccounts {
    fn default() -> Self {
        // Placeholder codes; real charts of accounts override these.
        Self {
            inventory_account: "1300".to_string(),
            adjustment_account: "5200".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
}

/// One signed inventory-value ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAdjustment {
    pub product_id: ProductId,
    pub direction: AdjustmentDirection,
    /// Absolute adjustment amount, money precision.
    pub amount: Decimal,
    pub debit_account: String,
    pub credit_account: String,
    pub memo: String,
}

/// Map each cost result to the ledger entry reflecting its change in
/// inventory value. Increases debit inventory; decreases credit it.
pub fn value_adjustments(
    results: &[CostResult],
    accounts: &GlAccounts,
    rounding: &RoundingPolicy,
) -> Vec<LedgerAdjustment> {
    results
        .iter()
        .map(|result| {
            let delta = rounding.round_money(result.new_value - result.current_value);
            let direction = if delta < Decimal::ZERO {
                AdjustmentDirection::Decrease
            } else {
                AdjustmentDirection::Increase
            };
            let (debit_account, credit_account) = match direction {
                AdjustmentDirection::Increase => (
                    accounts.inventory_account.clone(),
                    accounts.adjustment_account.clone(),
                ),
                AdjustmentDirection::Decrease => (
                    accounts.adjustment_account.clone(),
                    accounts.inventory_account.clone(),
                ),
            };
            LedgerAdjustment {
                product_id: result.product_id,
                direction,
                amount: delta.abs(),
                debit_account,
                credit_account,
                memo: format!(
                    "inventory revaluation to {} per unit ({} units)",
                    result.new_cost, result.new_stock
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighted_average::{CostConfig, CostInput, calculate_weighted_average};
    use rust_decimal_macros::dec;

    fn result_for(
        stock: Decimal,
        cost: Decimal,
        qty: Decimal,
        incoming: Decimal,
    ) -> CostResult {
        calculate_weighted_average(
            &CostInput {
                product_id: ProductId::new(),
                current_stock: stock,
                current_cost: cost,
                incoming_quantity: qty,
                incoming_cost: incoming,
            },
            &CostConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn receipts_increase_inventory_value() {
        let result = result_for(dec!(100), dec!(10), dec!(50), dec!(16));
        let entries = value_adjustments(
            &[result],
            &GlAccounts::default(),
            &RoundingPolicy::default(),
        );
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.direction, AdjustmentDirection::Increase);
        // 150 * 12.00 - 100 * 10.00
        assert_eq!(entry.amount, dec!(800.00));
        assert_eq!(entry.debit_account, "1300");
        assert_eq!(entry.credit_account, "5200");
    }

    #[test]
    fn accounts_are_caller_overridable() {
        let result = result_for(dec!(0), dec!(0), dec!(10), dec!(5));
        let accounts = GlAccounts {
            inventory_account: "1405".to_string(),
            adjustment_account: "5310".to_string(),
        };
        let entries = value_adjustments(&[result], &accounts, &RoundingPolicy::default());
        assert_eq!(entries[0].debit_account, "1405");
        assert_eq!(entries[0].credit_account, "5310");
    }
}
