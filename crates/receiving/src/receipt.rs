//! Receipt line models.
//!
//! `ReceiptItem` is constructed per receiving action and never persisted
//! as-is; what (if anything) gets stored is the orchestrator's concern.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{ProductId, UserId};

/// Physical condition of a received line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    Good,
    Damaged,
    Expired,
}

/// Recorded quality outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Passed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSeverity {
    Minor,
    Major,
    Critical,
}

/// Report attached to a damaged line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    /// Category from the configured allow-list.
    pub category: String,
    pub description: String,
    pub severity: DamageSeverity,
    pub affected_quantity: Decimal,
    pub reported_by: UserId,
    pub reported_at: DateTime<Utc>,
    pub supplier_notified: bool,
}

/// One line of a receiving action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptItem {
    /// Order line this receipt refers to.
    pub line_no: u32,
    pub product_id: ProductId,
    pub ordered_quantity: Decimal,
    /// Quantity received in this receipt.
    pub received_quantity: Decimal,
    /// Quantity received across all prior receipts for the line.
    pub previously_received: Decimal,
    pub condition: ItemCondition,
    pub expiry_date: Option<NaiveDate>,
    pub damage_report: Option<DamageReport>,
    pub quality: Option<QualityStatus>,
}

impl ReceiptItem {
    /// Cumulative quantity received once this receipt lands.
    pub fn cumulative_received(&self) -> Decimal {
        self.previously_received + self.received_quantity
    }
}
