//! Receiving rule configuration.
//!
//! Every threshold and policy here is data: deserializable, overridable per
//! site, defaulted to the stock rules. Nothing in the validator hardcodes a
//! number from this file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use vendora_core::Role;

/// How quantity deviation is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceMode {
    /// Thresholds are percentages of the ordered quantity.
    Percentage,
    /// Thresholds are fixed unit counts.
    Units,
}

/// Over-receiving thresholds, in ascending severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverReceiptRules {
    pub mode: ToleranceMode,
    /// Below this: silent. At or below `tolerance`: warning.
    pub warning_threshold: Decimal,
    /// Above this: approval required.
    pub tolerance: Decimal,
    /// At or above this: hard block.
    pub block_threshold: Decimal,
    pub approval_roles: Vec<Role>,
}

impl Default for OverReceiptRules {
    fn default() -> Self {
        Self {
            mode: ToleranceMode::Percentage,
            warning_threshold: dec!(3),
            tolerance: dec!(5),
            block_threshold: dec!(10),
            approval_roles: vec![Role::manager()],
        }
    }
}

/// Under-receiving tolerance. Never blocking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderReceiptRules {
    pub mode: ToleranceMode,
    pub tolerance: Decimal,
}

impl Default for UnderReceiptRules {
    fn default() -> Self {
        Self {
            mode: ToleranceMode::Percentage,
            tolerance: dec!(5),
        }
    }
}

/// Partial receipt policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialPolicy {
    pub enabled: bool,
    /// Receipts flagged partial are blocked once this many partial receipts
    /// already exist for the order.
    pub max_partial_receipts: u32,
}

impl Default for PartialPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_partial_receipts: 3,
        }
    }
}

/// What a rejected quality outcome does to the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamagedItemPolicy {
    /// Accept the rest of the line; the rejection degrades to a warning.
    PartialAccept,
    /// A rejected outcome blocks the receipt.
    RejectOutright,
}

/// Quality check policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityPolicy {
    pub enabled: bool,
    /// Roles allowed to record a quality outcome.
    pub recorder_roles: Vec<Role>,
    pub damaged_item_policy: DamagedItemPolicy,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            recorder_roles: vec![Role::warehouse(), Role::manager()],
            damaged_item_policy: DamagedItemPolicy::PartialAccept,
        }
    }
}

/// Expiry handling windows, both measured in days from the receipt date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryPolicy {
    /// Already-expired items are a blocking error when true.
    pub reject_expired: bool,
    /// Items expiring within this many days require approval.
    pub near_expiry_days: i64,
    /// Items expiring within this (wider) window get an advisory.
    pub warning_days: i64,
    pub approval_roles: Vec<Role>,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            reject_expired: true,
            near_expiry_days: 7,
            warning_days: 30,
            approval_roles: vec![Role::manager()],
        }
    }
}

/// Damage handling policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePolicy {
    /// Recognized damage categories.
    pub categories: Vec<String>,
    /// When true, a damaged line whose report has not yet notified the
    /// supplier produces a pending-notification adjustment entry.
    pub require_supplier_notification: bool,
}

impl Default for DamagePolicy {
    fn default() -> Self {
        Self {
            categories: ["transit", "packaging", "manufacturing", "storage", "other"]
                .map(String::from)
                .to_vec(),
            require_supplier_notification: true,
        }
    }
}

/// The complete receiving rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    pub over: OverReceiptRules,
    pub under: UnderReceiptRules,
    pub partial: PartialPolicy,
    pub quality: QualityPolicy,
    pub expiry: ExpiryPolicy,
    pub damage: DamagePolicy,
    /// Roles allowed to receive at all.
    pub receiving_roles: Vec<Role>,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            over: OverReceiptRules::default(),
            under: UnderReceiptRules::default(),
            partial: PartialPolicy::default(),
            quality: QualityPolicy::default(),
            expiry: ExpiryPolicy::default(),
            damage: DamagePolicy::default(),
            receiving_roles: vec![Role::warehouse(), Role::manager(), Role::admin()],
        }
    }
}
