//! Cost updates triggered by a goods receipt.
//!
//! Loads current positions, recomputes the moving average per product,
//! detects price variances against the order lines, derives the ledger
//! adjustments, and persists the new positions. The whole run is tracked by
//! one [`CostTransaction`] progressing `pending -> completed | failed`.

use rust_decimal::Decimal;

use vendora_costing::{
    ActualCost, CostConfig, CostError, CostInput, CostResult, DEFAULT_PRICE_VARIANCE_PCT,
    GlAccounts, LedgerAdjustment, OrderedCost, PriceVarianceRecord, calculate_batch,
    detect_price_variances, value_adjustments,
};
use vendora_core::{ProductId, UserId};
use vendora_purchasing::PurchaseOrder;

use crate::collaborators::{CostStore, CostTransaction, ProductCost, StoreError};
use crate::error::WorkflowResult;

/// Configuration for receipt-driven cost updates.
#[derive(Debug, Clone)]
pub struct ReceiptCostingConfig {
    pub cost: CostConfig,
    pub accounts: GlAccounts,
    pub variance_threshold_pct: Decimal,
}

impl Default for ReceiptCostingConfig {
    fn default() -> Self {
        Self {
            cost: CostConfig::default(),
            accounts: GlAccounts::default(),
            variance_threshold_pct: DEFAULT_PRICE_VARIANCE_PCT,
        }
    }
}

/// Everything one receipt's cost run produced.
#[derive(Debug, Clone)]
pub struct ReceiptCosting {
    pub transaction: CostTransaction,
    pub results: Vec<CostResult>,
    /// Inputs the engine refused, with the contract violation each hit.
    pub skipped: Vec<(ProductId, CostError)>,
    pub variances: Vec<PriceVarianceRecord>,
    pub adjustments: Vec<LedgerAdjustment>,
}

/// Recompute and persist product costs for a receipt against `order`.
///
/// Bad inputs are skipped, not fatal; a storage failure marks the transaction
/// failed and propagates. Positions are persisted at exact precision so
/// successive receipts blend without compounding rounding error; the rounded
/// figures live on the results.
pub async fn process_receipt_cost_updates<S: CostStore>(
    store: &S,
    order: &PurchaseOrder,
    receipts: &[ActualCost],
    actor: UserId,
    config: &ReceiptCostingConfig,
) -> WorkflowResult<ReceiptCosting> {
    let mut transaction = CostTransaction::begin(order.id(), actor);
    store.record_transaction(&transaction).await?;

    let run = run_cost_updates(store, order, receipts, config).await;

    match run {
        Ok((results, skipped, variances, adjustments)) => {
            transaction.complete();
            store.record_transaction(&transaction).await?;
            tracing::info!(
                order = %order.id(),
                updated = results.len(),
                skipped = skipped.len(),
                variances = variances.len(),
                "receipt cost update completed"
            );
            Ok(ReceiptCosting {
                transaction,
                results,
                skipped,
                variances,
                adjustments,
            })
        }
        Err(err) => {
            transaction.fail(err.to_string());
            if let Err(record_err) = store.record_transaction(&transaction).await {
                tracing::warn!(
                    order = %order.id(),
                    error = %record_err,
                    "could not record failed cost transaction"
                );
            }
            Err(err.into())
        }
    }
}

type CostRun = (
    Vec<CostResult>,
    Vec<(ProductId, CostError)>,
    Vec<PriceVarianceRecord>,
    Vec<LedgerAdjustment>,
);

async fn run_cost_updates<S: CostStore>(
    store: &S,
    order: &PurchaseOrder,
    receipts: &[ActualCost],
    config: &ReceiptCostingConfig,
) -> Result<CostRun, StoreError> {
    let mut inputs = Vec::with_capacity(receipts.len());
    for receipt in receipts {
        // Products never costed before start from an empty position.
        let position = store.product_cost(receipt.product_id).await?;
        let (current_stock, current_cost) = match position {
            Some(p) => (p.stock, p.unit_cost),
            None => (Decimal::ZERO, Decimal::ZERO),
        };
        inputs.push(CostInput {
            product_id: receipt.product_id,
            current_stock,
            current_cost,
            incoming_quantity: receipt.quantity,
            incoming_cost: receipt.unit_cost,
        });
    }

    let outcome = calculate_batch(&inputs, &config.cost);

    let ordered: Vec<OrderedCost> = order
        .lines()
        .iter()
        .map(|line| OrderedCost {
            line_no: line.line_no,
            product_id: line.product_id,
            unit_cost: line.unit_cost,
        })
        .collect();
    let variances = detect_price_variances(
        &ordered,
        receipts,
        config.variance_threshold_pct,
        &config.cost.rounding,
    );
    let adjustments = value_adjustments(&outcome.results, &config.accounts, &config.cost.rounding);

    let positions: Vec<ProductCost> = outcome
        .results
        .iter()
        .map(|result| ProductCost {
            product_id: result.product_id,
            stock: result.new_stock,
            unit_cost: result.new_cost_exact,
        })
        .collect();
    store.save_costs(&positions).await?;

    Ok((outcome.results, outcome.skipped, variances, adjustments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use vendora_core::{RoundingPolicy, SupplierId, UserId};
    use vendora_costing::AdjustmentDirection;
    use vendora_purchasing::OrderLine;

    use crate::collaborators::{CostTransactionStatus, InMemoryCostStore};
    use crate::error::WorkflowError;

    fn order_with(lines: Vec<OrderLine>) -> PurchaseOrder {
        PurchaseOrder::new(
            "PO-3100",
            Some(SupplierId::new()),
            lines,
            Decimal::ZERO,
            UserId::new(),
            &RoundingPolicy::default(),
        )
        .unwrap()
    }

    fn receipt(line_no: u32, product_id: ProductId, unit_cost: Decimal, qty: Decimal) -> ActualCost {
        ActualCost {
            line_no,
            product_id,
            unit_cost,
            quantity: qty,
        }
    }

    #[tokio::test]
    async fn blends_persists_and_completes_the_transaction() {
        let store = InMemoryCostStore::new();
        let product = ProductId::new();
        store.seed(ProductCost {
            product_id: product,
            stock: dec!(100),
            unit_cost: dec!(10),
        });

        let order = order_with(vec![OrderLine {
            line_no: 1,
            product_id: product,
            quantity: dec!(50),
            unit_cost: dec!(16),
        }]);

        let costing = process_receipt_cost_updates(
            &store,
            &order,
            &[receipt(1, product, dec!(16), dec!(50))],
            UserId::new(),
            &ReceiptCostingConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(costing.results.len(), 1);
        assert_eq!(costing.results[0].new_cost, dec!(12.00));
        assert_eq!(costing.transaction.status, CostTransactionStatus::Completed);
        // Received at the ordered price: no variance.
        assert!(costing.variances.is_empty());
        assert_eq!(costing.adjustments.len(), 1);
        assert_eq!(
            costing.adjustments[0].direction,
            AdjustmentDirection::Increase
        );
        assert_eq!(costing.adjustments[0].amount, dec!(800.00));

        let position = store.cost_of(product).unwrap();
        assert_eq!(position.stock, dec!(150));
        assert_eq!(position.unit_cost, dec!(12));

        // Pending and completed collapse onto one upserted record.
        let transactions = store.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].status, CostTransactionStatus::Completed);
    }

    #[tokio::test]
    async fn uncosted_product_starts_from_an_empty_position() {
        let store = InMemoryCostStore::new();
        let product = ProductId::new();
        let order = order_with(vec![OrderLine {
            line_no: 1,
            product_id: product,
            quantity: dec!(40),
            unit_cost: dec!(25),
        }]);

        let costing = process_receipt_cost_updates(
            &store,
            &order,
            &[receipt(1, product, dec!(25), dec!(40))],
            UserId::new(),
            &ReceiptCostingConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(costing.results[0].new_cost, dec!(25));
        assert_eq!(store.cost_of(product).unwrap().stock, dec!(40));
    }

    #[tokio::test]
    async fn paying_off_list_price_records_a_variance() {
        let store = InMemoryCostStore::new();
        let product = ProductId::new();
        let order = order_with(vec![OrderLine {
            line_no: 1,
            product_id: product,
            quantity: dec!(10),
            unit_cost: dec!(10),
        }]);

        // Paid 11.00 against 10.00 ordered: +10%, above the 5% threshold.
        let costing = process_receipt_cost_updates(
            &store,
            &order,
            &[receipt(1, product, dec!(11), dec!(10))],
            UserId::new(),
            &ReceiptCostingConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(costing.variances.len(), 1);
        assert_eq!(costing.variances[0].variance_pct, dec!(10));
        assert_eq!(costing.variances[0].total_variance, dec!(10.00));
    }

    #[tokio::test]
    async fn bad_inputs_are_skipped_without_failing_the_run() {
        let store = InMemoryCostStore::new();
        let good = ProductId::new();
        let bad = ProductId::new();
        let order = order_with(vec![
            OrderLine {
                line_no: 1,
                product_id: good,
                quantity: dec!(10),
                unit_cost: dec!(5),
            },
            OrderLine {
                line_no: 2,
                product_id: bad,
                quantity: dec!(10),
                unit_cost: dec!(5),
            },
        ]);

        let costing = process_receipt_cost_updates(
            &store,
            &order,
            &[
                receipt(1, good, dec!(5), dec!(10)),
                // Zero quantity violates the engine contract.
                receipt(2, bad, dec!(5), dec!(0)),
            ],
            UserId::new(),
            &ReceiptCostingConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(costing.results.len(), 1);
        assert_eq!(costing.skipped.len(), 1);
        assert_eq!(costing.skipped[0].0, bad);
        assert_eq!(costing.transaction.status, CostTransactionStatus::Completed);
        assert!(store.cost_of(bad).is_none());
    }

    #[tokio::test]
    async fn storage_failure_marks_the_transaction_failed() {
        let store = InMemoryCostStore::new();
        store.fail_saves(true);
        let product = ProductId::new();
        let order = order_with(vec![OrderLine {
            line_no: 1,
            product_id: product,
            quantity: dec!(10),
            unit_cost: dec!(5),
        }]);

        let err = process_receipt_cost_updates(
            &store,
            &order,
            &[receipt(1, product, dec!(5), dec!(10))],
            UserId::new(),
            &ReceiptCostingConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Store(_)));

        let transactions = store.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].status, CostTransactionStatus::Failed);
        assert!(transactions[0].failure.is_some());
    }
}
