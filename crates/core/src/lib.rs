//! `vendora-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the domain error model, roles, monetary
//! rounding, and the accumulating validation result types shared by the
//! purchasing, costing, and receiving crates.

pub mod error;
pub mod id;
pub mod money;
pub mod role;
pub mod validation;

pub use error::{DomainError, DomainResult};
pub use id::{ProductId, RecordId, SupplierId, UserId};
pub use money::RoundingPolicy;
pub use role::Role;
pub use validation::{ValidationError, ValidationResult, ValidationWarning};
