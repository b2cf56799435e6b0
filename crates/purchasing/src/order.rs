use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{
    DomainError, DomainResult, ProductId, RecordId, RoundingPolicy, SupplierId, UserId,
    ValidationResult,
};

use crate::status::{EnhancedStatus, LegacyStatus};

/// Purchase order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub RecordId);

impl PurchaseOrderId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

/// Persistence-boundary shape of a purchase order.
///
/// Carries the legacy status vocabulary; this is the only place the lossy
/// mapping is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: PurchaseOrderId,
    pub number: String,
    pub supplier_id: Option<SupplierId>,
    pub lines: Vec<OrderLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: LegacyStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    pub received_at: Option<DateTime<Utc>>,
}

/// A purchase order in the canonical status vocabulary.
///
/// Invariant: `total == subtotal + tax` and `subtotal` equals the rounded sum
/// of line totals. Orders in a terminal status are immutable except for audit
/// metadata; the transition table enforces this by giving terminal statuses
/// no outgoing edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    number: String,
    supplier_id: Option<SupplierId>,
    lines: Vec<OrderLine>,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
    status: EnhancedStatus,
    created_at: DateTime<Utc>,
    created_by: UserId,
    received_at: Option<DateTime<Utc>>,
}

impl PurchaseOrder {
    /// Create a new draft order, deriving totals from the lines.
    pub fn new(
        number: impl Into<String>,
        supplier_id: Option<SupplierId>,
        lines: Vec<OrderLine>,
        tax: Decimal,
        created_by: UserId,
        rounding: &RoundingPolicy,
    ) -> DomainResult<Self> {
        for line in &lines {
            if line.quantity <= Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "line {}: quantity must be positive",
                    line.line_no
                )));
            }
            if line.unit_cost < Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "line {}: unit cost cannot be negative",
                    line.line_no
                )));
            }
        }
        if tax < Decimal::ZERO {
            return Err(DomainError::validation("tax cannot be negative"));
        }

        let subtotal = rounding.round_money(lines.iter().map(OrderLine::line_total).sum());
        let total = rounding.round_money(subtotal + tax);

        Ok(Self {
            id: PurchaseOrderId::new(RecordId::new()),
            number: number.into(),
            supplier_id,
            lines,
            subtotal,
            tax,
            total,
            status: EnhancedStatus::Draft,
            created_at: Utc::now(),
            created_by,
            received_at: None,
        })
    }

    /// Rehydrate from the persisted shape, lifting the legacy status to its
    /// canonical representative.
    pub fn from_snapshot(snapshot: OrderSnapshot) -> Self {
        Self {
            id: snapshot.id,
            number: snapshot.number,
            supplier_id: snapshot.supplier_id,
            lines: snapshot.lines,
            subtotal: snapshot.subtotal,
            tax: snapshot.tax,
            total: snapshot.total,
            status: snapshot.status.to_enhanced(),
            created_at: snapshot.created_at,
            created_by: snapshot.created_by,
            received_at: snapshot.received_at,
        }
    }

    /// Collapse to the persisted shape (legacy status vocabulary).
    pub fn to_snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            id: self.id,
            number: self.number.clone(),
            supplier_id: self.supplier_id,
            lines: self.lines.clone(),
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
            status: self.status.to_legacy(),
            created_at: self.created_at,
            created_by: self.created_by,
            received_at: self.received_at,
        }
    }

    pub fn id(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn tax(&self) -> Decimal {
        self.tax
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn status(&self) -> EnhancedStatus {
        self.status
    }

    pub fn legacy_status(&self) -> LegacyStatus {
        self.status.to_legacy()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check the monetary consistency invariant.
    pub fn validate_totals(&self, rounding: &RoundingPolicy) -> ValidationResult {
        let mut result = ValidationResult::new();
        let line_sum = rounding.round_money(self.lines.iter().map(OrderLine::line_total).sum());
        if self.subtotal != line_sum {
            result.block(
                "subtotal",
                "TOTAL_MISMATCH",
                format!(
                    "subtotal {} does not match line total {}",
                    self.subtotal, line_sum
                ),
            );
        }
        if self.total != rounding.round_money(self.subtotal + self.tax) {
            result.block(
                "total",
                "TOTAL_MISMATCH",
                format!(
                    "total {} does not equal subtotal {} + tax {}",
                    self.total, self.subtotal, self.tax
                ),
            );
        }
        result
    }

    pub(crate) fn set_status(&mut self, status: EnhancedStatus) {
        self.status = status;
    }

    /// Stamp the received date the first time the order becomes fully
    /// received. Later transitions never overwrite it.
    pub(crate) fn stamp_received(&mut self, at: DateTime<Utc>) {
        if self.received_at.is_none() {
            self.received_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(line_no: u32, quantity: Decimal, unit_cost: Decimal) -> OrderLine {
        OrderLine {
            line_no,
            product_id: ProductId::new(),
            quantity,
            unit_cost,
        }
    }

    fn test_order() -> PurchaseOrder {
        PurchaseOrder::new(
            "PO-1001",
            Some(SupplierId::new()),
            vec![line(1, dec!(100), dec!(20)), dec_line()],
            dec!(240),
            UserId::new(),
            &RoundingPolicy::default(),
        )
        .unwrap()
    }

    fn dec_line() -> OrderLine {
        line(2, dec!(10), dec!(0.50))
    }

    #[test]
    fn derives_totals_from_lines() {
        let order = test_order();
        assert_eq!(order.subtotal(), dec!(2005.00));
        assert_eq!(order.total(), dec!(2245.00));
        assert!(order.validate_totals(&RoundingPolicy::default()).is_valid());
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let err = PurchaseOrder::new(
            "PO-1002",
            None,
            vec![line(1, dec!(0), dec!(5))],
            Decimal::ZERO,
            UserId::new(),
            &RoundingPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn snapshot_round_trip_preserves_everything_but_lossy_status() {
        let mut order = test_order();
        order.set_status(EnhancedStatus::Approved);

        let snapshot = order.to_snapshot();
        assert_eq!(snapshot.status, LegacyStatus::Sent);

        let restored = PurchaseOrder::from_snapshot(snapshot);
        // Approved collapses to sent, which lifts to sent_to_supplier.
        assert_eq!(restored.status(), EnhancedStatus::SentToSupplier);
        assert_eq!(restored.total(), order.total());
        assert_eq!(restored.lines(), order.lines());
    }

    #[test]
    fn received_stamp_is_write_once() {
        let mut order = test_order();
        let first = Utc::now();
        order.stamp_received(first);
        order.stamp_received(first + chrono::Duration::hours(1));
        assert_eq!(order.received_at(), Some(first));
    }

    #[test]
    fn detects_total_mismatch() {
        let order = test_order();
        let mut snapshot = order.to_snapshot();
        snapshot.total = dec!(1.00);
        let tampered = PurchaseOrder::from_snapshot(snapshot);
        let result = tampered.validate_totals(&RoundingPolicy::default());
        assert!(result.has_error("TOTAL_MISMATCH"));
        assert!(!result.is_valid());
    }
}
