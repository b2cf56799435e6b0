//! Price variance detection.
//!
//! Compares the unit cost actually paid on a receipt against the unit cost
//! on the order line. Only deviations beyond the configured percentage are
//! recorded; each record enters a review workflow of its own.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use vendora_core::{ProductId, RecordId, RoundingPolicy};

/// Review state of a detected variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceReviewStatus {
    Pending,
    Reviewed,
    Approved,
    Rejected,
}

/// Ordered side of the comparison: one order line's costing terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedCost {
    pub line_no: u32,
    pub product_id: ProductId,
    pub unit_cost: Decimal,
}

/// Actual side: what one receipt paid for a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualCost {
    pub line_no: u32,
    pub product_id: ProductId,
    pub unit_cost: Decimal,
    pub quantity: Decimal,
}

/// Persisted audit of a cost deviation between ordered and actual unit cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceVarianceRecord {
    pub id: RecordId,
    pub line_no: u32,
    pub product_id: ProductId,
    pub ordered_cost: Decimal,
    pub actual_cost: Decimal,
    /// Per-unit deviation, actual minus ordered.
    pub unit_variance: Decimal,
    /// Deviation across the received quantity.
    pub total_variance: Decimal,
    pub variance_pct: Decimal,
    pub status: VarianceReviewStatus,
    pub detected_at: DateTime<Utc>,
}

/// Default recording threshold: deviations of 5% or less are noise.
pub const DEFAULT_PRICE_VARIANCE_PCT: Decimal = dec!(5);

/// Compare each receipt against its order line and record deviations beyond
/// `threshold_pct`. Receipts without a matching order line are ignored;
/// line matching is the receiving validator's business, not the cost
/// engine's.
pub fn detect_price_variances(
    ordered: &[OrderedCost],
    actuals: &[ActualCost],
    threshold_pct: Decimal,
    rounding: &RoundingPolicy,
) -> Vec<PriceVarianceRecord> {
    let mut records = Vec::new();

    for actual in actuals {
        let Some(line) = ordered.iter().find(|o| o.line_no == actual.line_no) else {
            continue;
        };

        let unit_variance = actual.unit_cost - line.unit_cost;
        let variance_pct = if line.unit_cost == Decimal::ZERO {
            Decimal::ZERO
        } else {
            unit_variance / line.unit_cost * dec!(100)
        };

        if variance_pct.abs() <= threshold_pct {
            continue;
        }

        records.push(PriceVarianceRecord {
            id: RecordId::new(),
            line_no: actual.line_no,
            product_id: actual.product_id,
            ordered_cost: line.unit_cost,
            actual_cost: actual.unit_cost,
            unit_variance: rounding.round_unit_cost(unit_variance),
            total_variance: rounding.round_money(unit_variance * actual.quantity),
            variance_pct,
            status: VarianceReviewStatus::Pending,
            detected_at: Utc::now(),
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered(line_no: u32, unit_cost: Decimal) -> OrderedCost {
        OrderedCost {
            line_no,
            product_id: ProductId::new(),
            unit_cost,
        }
    }

    fn actual(line_no: u32, unit_cost: Decimal, quantity: Decimal) -> ActualCost {
        ActualCost {
            line_no,
            product_id: ProductId::new(),
            unit_cost,
            quantity,
        }
    }

    #[test]
    fn records_only_deviations_beyond_threshold() {
        let rounding = RoundingPolicy::default();
        let lines = vec![ordered(1, dec!(10)), ordered(2, dec!(10))];
        let receipts = vec![
            actual(1, dec!(10.40), dec!(100)), // +4%: noise
            actual(2, dec!(11.00), dec!(50)),  // +10%: recorded
        ];

        let records =
            detect_price_variances(&lines, &receipts, DEFAULT_PRICE_VARIANCE_PCT, &rounding);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.line_no, 2);
        assert_eq!(record.unit_variance, dec!(1.00));
        assert_eq!(record.total_variance, dec!(50.00));
        assert_eq!(record.variance_pct, dec!(10));
        assert_eq!(record.status, VarianceReviewStatus::Pending);
    }

    #[test]
    fn undercharges_count_too() {
        let records = detect_price_variances(
            &[ordered(1, dec!(20))],
            &[actual(1, dec!(17), dec!(10))],
            DEFAULT_PRICE_VARIANCE_PCT,
            &RoundingPolicy::default(),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].unit_variance, dec!(-3.0000));
        assert_eq!(records[0].total_variance, dec!(-30.00));
    }

    #[test]
    fn unmatched_receipt_lines_are_ignored() {
        let records = detect_price_variances(
            &[ordered(1, dec!(20))],
            &[actual(9, dec!(99), dec!(1))],
            DEFAULT_PRICE_VARIANCE_PCT,
            &RoundingPolicy::default(),
        );
        assert!(records.is_empty());
    }

    #[test]
    fn zero_ordered_cost_never_divides() {
        let records = detect_price_variances(
            &[ordered(1, dec!(0))],
            &[actual(1, dec!(5), dec!(1))],
            DEFAULT_PRICE_VARIANCE_PCT,
            &RoundingPolicy::default(),
        );
        // Percentage is defined as zero against a zero ordered cost.
        assert!(records.is_empty());
    }
}
