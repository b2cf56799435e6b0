//! `vendora-costing` — weighted average cost engine.
//!
//! Recomputes the moving-average inventory cost on every receipt, detects
//! price variances between ordered and actual unit costs, and maps cost
//! changes to signed general-ledger adjustments. Everything here is pure
//! computation; persistence of the derived figures is the caller's concern.

pub mod adjustments;
pub mod variance;
pub mod weighted_average;

pub use adjustments::{AdjustmentDirection, GlAccounts, LedgerAdjustment, value_adjustments};
pub use variance::{
    ActualCost, DEFAULT_PRICE_VARIANCE_PCT, OrderedCost, PriceVarianceRecord,
    VarianceReviewStatus, detect_price_variances,
};
pub use weighted_average::{
    BatchCostOutcome, CostConfig, CostError, CostInput, CostResult, calculate_batch,
    calculate_weighted_average,
};
