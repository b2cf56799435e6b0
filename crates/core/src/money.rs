//! Monetary rounding policy.
//!
//! All money arithmetic uses [`rust_decimal::Decimal`]. Storage-facing totals
//! round to 2 decimal places and unit costs to 4, so many small receipts do
//! not compound rounding error. Both precisions live in one policy value so
//! every call site shares the same contract.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    /// Decimal places for storage-facing money totals.
    pub money_dp: u32,
    /// Decimal places for per-unit costs.
    pub unit_cost_dp: u32,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            money_dp: 2,
            unit_cost_dp: 4,
        }
    }
}

impl RoundingPolicy {
    /// Round a money amount (totals, variance amounts, adjustments).
    pub fn round_money(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.money_dp, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Round a per-unit cost.
    pub fn round_unit_cost(&self, cost: Decimal) -> Decimal {
        cost.round_dp_with_strategy(self.unit_cost_dp, RoundingStrategy::MidpointAwayFromZero)
    }
}
