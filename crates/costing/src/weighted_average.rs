//! Weighted (moving) average cost recomputation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vendora_core::{ProductId, RoundingPolicy};

/// Cost engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    /// Percentage beyond which a cost variance is flagged significant.
    pub significant_variance_pct: Decimal,
    /// Stock at or below this is treated as zero when dividing.
    pub stock_epsilon: Decimal,
    pub rounding: RoundingPolicy,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            significant_variance_pct: dec!(10),
            stock_epsilon: dec!(0.000001),
            rounding: RoundingPolicy::default(),
        }
    }
}

/// Current position plus the incoming receipt for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostInput {
    pub product_id: ProductId,
    pub current_stock: Decimal,
    pub current_cost: Decimal,
    pub incoming_quantity: Decimal,
    pub incoming_cost: Decimal,
}

/// Derived cost figures for one product.
///
/// `new_cost_exact` is unrounded so chained computations do not compound
/// rounding error; `new_cost` and the value fields are the storage-facing
/// rounded figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostResult {
    pub product_id: ProductId,
    pub current_value: Decimal,
    pub incoming_value: Decimal,
    pub new_stock: Decimal,
    pub new_cost: Decimal,
    pub new_cost_exact: Decimal,
    pub new_value: Decimal,
    pub variance_amount: Decimal,
    pub variance_pct: Decimal,
    pub significant_variance: bool,
}

/// Contract violations by the caller. These fail fast; they are never
/// business outcomes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CostError {
    #[error("product {product}: current stock {stock} is negative")]
    NegativeStock { product: ProductId, stock: Decimal },

    #[error("product {product}: incoming quantity {quantity} must be positive")]
    NonPositiveQuantity {
        product: ProductId,
        quantity: Decimal,
    },

    #[error("product {product}: cost {cost} cannot be negative")]
    NegativeCost { product: ProductId, cost: Decimal },
}

/// Recompute the moving average for one receipt.
///
/// `new_cost = (current_value + incoming_value) / new_stock`, falling back to
/// the incoming cost alone when `new_stock` is at or below the configured
/// epsilon. Variance percentage is relative to the prior cost and zero when
/// that prior cost is zero.
pub fn calculate_weighted_average(
    input: &CostInput,
    config: &CostConfig,
) -> Result<CostResult, CostError> {
    if input.current_stock < Decimal::ZERO {
        return Err(CostError::NegativeStock {
            product: input.product_id,
            stock: input.current_stock,
        });
    }
    if input.incoming_quantity <= Decimal::ZERO {
        return Err(CostError::NonPositiveQuantity {
            product: input.product_id,
            quantity: input.incoming_quantity,
        });
    }
    for cost in [input.current_cost, input.incoming_cost] {
        if cost < Decimal::ZERO {
            return Err(CostError::NegativeCost {
                product: input.product_id,
                cost,
            });
        }
    }

    let rounding = &config.rounding;
    let current_value = input.current_stock * input.current_cost;
    let incoming_value = input.incoming_quantity * input.incoming_cost;
    let new_stock = input.current_stock + input.incoming_quantity;

    let new_cost_exact = if new_stock <= config.stock_epsilon {
        input.incoming_cost
    } else {
        (current_value + incoming_value) / new_stock
    };

    let variance_exact = new_cost_exact - input.current_cost;
    let variance_pct = if input.current_cost == Decimal::ZERO {
        Decimal::ZERO
    } else {
        variance_exact / input.current_cost * dec!(100)
    };

    Ok(CostResult {
        product_id: input.product_id,
        current_value: rounding.round_money(current_value),
        incoming_value: rounding.round_money(incoming_value),
        new_stock,
        new_cost: rounding.round_unit_cost(new_cost_exact),
        new_cost_exact,
        new_value: rounding.round_money(new_stock * new_cost_exact),
        variance_amount: rounding.round_unit_cost(variance_exact),
        variance_pct,
        significant_variance: variance_pct.abs() > config.significant_variance_pct,
    })
}

/// Outcome of a batch recomputation.
#[derive(Debug, Clone, Default)]
pub struct BatchCostOutcome {
    pub results: Vec<CostResult>,
    /// Inputs skipped because they violated the engine contract.
    pub skipped: Vec<(ProductId, CostError)>,
}

/// Run the single-item calculation per product, continuing past individual
/// failures so one bad input does not abort the batch.
pub fn calculate_batch(inputs: &[CostInput], config: &CostConfig) -> BatchCostOutcome {
    let mut outcome = BatchCostOutcome::default();
    for input in inputs {
        match calculate_weighted_average(input, config) {
            Ok(result) => outcome.results.push(result),
            Err(err) => {
                tracing::warn!(
                    product = %input.product_id,
                    error = %err,
                    "skipping cost calculation for bad input"
                );
                outcome.skipped.push((input.product_id, err));
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(
        stock: Decimal,
        cost: Decimal,
        incoming_qty: Decimal,
        incoming_cost: Decimal,
    ) -> CostInput {
        CostInput {
            product_id: ProductId::new(),
            current_stock: stock,
            current_cost: cost,
            incoming_quantity: incoming_qty,
            incoming_cost,
        }
    }

    #[test]
    fn zero_prior_stock_takes_the_incoming_cost_exactly() {
        let result = calculate_weighted_average(
            &input(dec!(0), dec!(0), dec!(40), dec!(25)),
            &CostConfig::default(),
        )
        .unwrap();
        assert_eq!(result.new_cost, dec!(25));
        assert_eq!(result.new_stock, dec!(40));
        assert_eq!(result.new_value, dec!(1000.00));
        assert_eq!(result.variance_pct, Decimal::ZERO);
        assert!(!result.significant_variance);
    }

    #[test]
    fn blends_existing_and_incoming_value() {
        // 100 @ 10.00 plus 50 @ 16.00 -> 150 @ 12.00
        let result = calculate_weighted_average(
            &input(dec!(100), dec!(10), dec!(50), dec!(16)),
            &CostConfig::default(),
        )
        .unwrap();
        assert_eq!(result.new_cost, dec!(12.00));
        assert_eq!(result.variance_amount, dec!(2.00));
        assert_eq!(result.variance_pct, dec!(20));
        assert!(result.significant_variance);
    }

    #[test]
    fn variance_below_threshold_is_not_significant() {
        // 100 @ 10.00 plus 10 @ 15.00 -> ~10.4545, +4.5%
        let result = calculate_weighted_average(
            &input(dec!(100), dec!(10), dec!(10), dec!(15)),
            &CostConfig::default(),
        )
        .unwrap();
        assert!(result.variance_pct < dec!(10));
        assert!(!result.significant_variance);
        assert_eq!(result.new_cost, dec!(10.4545));
    }

    #[test]
    fn contract_violations_fail_fast() {
        let config = CostConfig::default();
        assert!(matches!(
            calculate_weighted_average(&input(dec!(-1), dec!(1), dec!(1), dec!(1)), &config),
            Err(CostError::NegativeStock { .. })
        ));
        assert!(matches!(
            calculate_weighted_average(&input(dec!(1), dec!(1), dec!(0), dec!(1)), &config),
            Err(CostError::NonPositiveQuantity { .. })
        ));
        assert!(matches!(
            calculate_weighted_average(&input(dec!(1), dec!(-1), dec!(1), dec!(1)), &config),
            Err(CostError::NegativeCost { .. })
        ));
        assert!(matches!(
            calculate_weighted_average(&input(dec!(1), dec!(1), dec!(1), dec!(-1)), &config),
            Err(CostError::NegativeCost { .. })
        ));
    }

    #[test]
    fn two_identical_receipts_equal_one_double_receipt() {
        let config = CostConfig::default();
        let first = calculate_weighted_average(
            &input(dec!(0), dec!(0), dec!(30), dec!(7.25)),
            &config,
        )
        .unwrap();
        let second = calculate_weighted_average(
            &CostInput {
                product_id: first.product_id,
                current_stock: first.new_stock,
                current_cost: first.new_cost_exact,
                incoming_quantity: dec!(30),
                incoming_cost: dec!(7.25),
            },
            &config,
        )
        .unwrap();
        let combined = calculate_weighted_average(
            &input(dec!(0), dec!(0), dec!(60), dec!(7.25)),
            &config,
        )
        .unwrap();
        assert_eq!(second.new_cost, combined.new_cost);
        assert_eq!(second.new_stock, combined.new_stock);
        assert_eq!(second.new_value, combined.new_value);
    }

    #[test]
    fn batch_skips_bad_inputs_and_keeps_going() {
        let good = input(dec!(10), dec!(2), dec!(5), dec!(3));
        let bad = input(dec!(-4), dec!(2), dec!(5), dec!(3));
        let also_good = input(dec!(0), dec!(0), dec!(1), dec!(9));

        let outcome = calculate_batch(&[good, bad.clone(), also_good], &CostConfig::default());
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].0, bad.product_id);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: receiving at the current cost never moves the average.
        #[test]
        fn same_cost_receipts_leave_the_average_alone(
            stock in 1i64..100_000,
            qty in 1i64..100_000,
            cost_cents in 1i64..1_000_000,
        ) {
            let cost = Decimal::new(cost_cents, 2);
            let result = calculate_weighted_average(
                &input(Decimal::from(stock), cost, Decimal::from(qty), cost),
                &CostConfig::default(),
            ).unwrap();
            prop_assert_eq!(result.new_cost_exact, cost);
            prop_assert_eq!(result.variance_pct, Decimal::ZERO);
            prop_assert!(!result.significant_variance);
        }

        /// Property: splitting a receipt in two and chaining the exact cost
        /// gives the same average as one combined receipt.
        #[test]
        fn split_receipts_blend_like_one(
            stock in 0i64..10_000,
            cost_cents in 0i64..100_000,
            qty_a in 1i64..10_000,
            qty_b in 1i64..10_000,
            incoming_cents in 1i64..100_000,
        ) {
            let config = CostConfig::default();
            let current_cost = Decimal::new(cost_cents, 2);
            let incoming_cost = Decimal::new(incoming_cents, 2);

            let a = calculate_weighted_average(
                &input(Decimal::from(stock), current_cost, Decimal::from(qty_a), incoming_cost),
                &config,
            ).unwrap();
            let chained = calculate_weighted_average(
                &CostInput {
                    product_id: a.product_id,
                    current_stock: a.new_stock,
                    current_cost: a.new_cost_exact,
                    incoming_quantity: Decimal::from(qty_b),
                    incoming_cost,
                },
                &config,
            ).unwrap();
            let combined = calculate_weighted_average(
                &input(
                    Decimal::from(stock),
                    current_cost,
                    Decimal::from(qty_a + qty_b),
                    incoming_cost,
                ),
                &config,
            ).unwrap();

            prop_assert_eq!(chained.new_stock, combined.new_stock);
            // Rounded to storage precision the two paths agree.
            prop_assert!(
                (chained.new_cost - combined.new_cost).abs() <= Decimal::new(1, 4),
                "chained {} vs combined {}", chained.new_cost, combined.new_cost
            );
        }
    }
}
