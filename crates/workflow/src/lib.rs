//! `vendora-workflow` — purchase order workflow orchestration.
//!
//! Pulls the domain crates together behind async collaborator seams:
//! approval/rejection flows over the state machine, receipt validation, and
//! receipt-driven cost updates. All persistence, notification, and hand-off
//! happens through the traits in [`collaborators`]; in-memory implementations
//! back tests and development.

pub mod approval;
pub mod collaborators;
pub mod error;
pub mod receipt_costing;

pub use approval::{
    ApprovalConfig, ApprovalOrchestrator, ApprovalOutcome, BulkApprovalOutcome, BulkFailure,
};
pub use collaborators::{
    AuditEntry, AuditTrail, CostStore, CostTransaction, CostTransactionStatus, DeliveryLog,
    HookError, InMemoryCostStore, InMemoryOrderStore, Notification, NotificationKind, Notifier,
    OrderStore, ProductCost, ReceivingQueueHook, RecordingAuditTrail, RecordingHook,
    RecordingNotifier, StoreError,
};
pub use error::{WorkflowError, WorkflowResult};
pub use receipt_costing::{ReceiptCosting, ReceiptCostingConfig, process_receipt_cost_updates};

// Receipt validation is part of the workflow surface; re-export the pieces an
// orchestrating caller needs.
pub use vendora_receiving::{
    ReceivingContext, ReceivingValidation, ToleranceConfig, validate_receiving,
};
