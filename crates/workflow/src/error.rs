use thiserror::Error;

use vendora_core::ValidationResult;
use vendora_purchasing::PurchaseOrderId;

use crate::collaborators::StoreError;

/// Failures surfaced by workflow operations.
///
/// `Rejected` carries the full accumulated validation result; everything the
/// caller needs to render an itemized rejection is inside it.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("purchase order {0} not found")]
    OrderNotFound(PurchaseOrderId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("operation rejected ({} rule violations)", .0.errors.len())]
    Rejected(ValidationResult),
}

impl WorkflowError {
    /// The validation result behind a rejection, if this is one.
    pub fn rejection(&self) -> Option<&ValidationResult> {
        match self {
            Self::Rejected(result) => Some(result),
            _ => None,
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
