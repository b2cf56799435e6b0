//! `vendora-receiving` — receiving tolerance validation.
//!
//! Pure validation of a receipt batch against configured tolerance, partial,
//! quality, expiry, and damage rules. All rule groups run; violations
//! accumulate into one result so the warehouse sees the full picture before
//! anything is persisted.

pub mod config;
pub mod receipt;
pub mod validator;

pub use config::{
    DamagePolicy, DamagedItemPolicy, ExpiryPolicy, OverReceiptRules, PartialPolicy,
    QualityPolicy, ToleranceConfig, ToleranceMode, UnderReceiptRules,
};
pub use receipt::{DamageReport, DamageSeverity, ItemCondition, QualityStatus, ReceiptItem};
pub use validator::{
    AdjustmentKind, ReceivingAdjustment, ReceivingContext, ReceivingValidation,
    validate_receiving,
};
