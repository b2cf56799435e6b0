//! Approval workflow orchestration.
//!
//! Composes the pure state machine with the collaborator seams. Within one
//! operation the step order is fixed: persist the order, append the
//! transition, record the audit entry, then notify and hand off to receiving.
//! Persistence and audit failures abort the operation; notification and hook
//! failures are logged and never do.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use vendora_core::{Role, RoundingPolicy, UserId};
use vendora_purchasing::{
    EnhancedStatus, PermissionPolicy, PurchaseOrder, PurchaseOrderId, StatusTransition,
    TransitionContext, TransitionOutcome, execute_transition, validate_user_permissions,
};

use crate::collaborators::{
    AuditEntry, AuditTrail, DeliveryLog, Notification, NotificationKind, Notifier, OrderStore,
    ReceivingQueueHook,
};
use crate::error::{WorkflowError, WorkflowResult};

/// Orchestrator configuration.
#[derive(Debug, Clone, Default)]
pub struct ApprovalConfig {
    pub permissions: PermissionPolicy,
    pub rounding: RoundingPolicy,
    /// Recipients notified of every decision, in addition to the order's
    /// creator.
    pub notification_recipients: Vec<UserId>,
    /// Ceiling on each notification/hook call. `None` waits indefinitely.
    pub side_channel_timeout: Option<Duration>,
}

/// Outcome of a single approve/reject operation.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub order: PurchaseOrder,
    pub transition: StatusTransition,
    /// Per-recipient delivery logs; `None` when the notification call timed
    /// out.
    pub delivery: Option<Vec<DeliveryLog>>,
}

/// One order's failure within a bulk operation.
#[derive(Debug)]
pub struct BulkFailure {
    pub order_id: PurchaseOrderId,
    pub error: WorkflowError,
}

/// Aggregate outcome of [`ApprovalOrchestrator::bulk_approve`].
#[derive(Debug, Default)]
pub struct BulkApprovalOutcome {
    pub approved: Vec<PurchaseOrderId>,
    pub failed: Vec<BulkFailure>,
}

impl BulkApprovalOutcome {
    pub fn approved_count(&self) -> usize {
        self.approved.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

pub struct ApprovalOrchestrator {
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditTrail>,
    receiving_hook: Arc<dyn ReceivingQueueHook>,
    config: ApprovalConfig,
}

impl ApprovalOrchestrator {
    pub fn new(
        store: Arc<dyn OrderStore>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditTrail>,
        receiving_hook: Arc<dyn ReceivingQueueHook>,
        config: ApprovalConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            audit,
            receiving_hook,
            config,
        }
    }

    /// Approve a pending order.
    pub async fn approve(
        &self,
        order_id: PurchaseOrderId,
        approver: UserId,
        role: &Role,
        comment: Option<&str>,
    ) -> WorkflowResult<ApprovalOutcome> {
        let order = self.load(order_id).await?;

        let mut context = TransitionContext::by(approver);
        if let Some(comment) = comment {
            context = context.with_reason(comment);
        }

        let outcome = self.transition(&order, EnhancedStatus::Approved, role, &context)?;
        self.persist(&outcome).await?;

        self.audit
            .record(AuditEntry::new(
                Some(order_id),
                "purchase_order.approved",
                Some(approver),
                json!({
                    "from": outcome.transition.from,
                    "to": outcome.transition.to,
                    "comment": comment,
                }),
            ))
            .await?;

        let delivery = self
            .side_channel("notify", self.notifier.notify(Notification {
                kind: NotificationKind::OrderApproved,
                order_id: Some(order_id),
                recipients: self.decision_recipients(&outcome.order),
                message: format!(
                    "purchase order {} approved by {}",
                    outcome.order.number(),
                    approver
                ),
            }))
            .await;
        self.log_failed_deliveries(order_id, delivery.as_deref());

        match self
            .side_channel("receiving_hook", self.receiving_hook.order_approved(&outcome.order))
            .await
        {
            Some(Err(err)) => {
                tracing::warn!(order = %order_id, error = %err, "receiving hand-off failed");
            }
            Some(Ok(())) | None => {}
        }

        Ok(ApprovalOutcome {
            order: outcome.order,
            transition: outcome.transition,
            delivery,
        })
    }

    /// Reject a pending order, cancelling it. The rejection reason and any
    /// reviewer comment are combined onto the transition record.
    ///
    /// Unlike [`approve`](Self::approve), rejection skips the receiving
    /// hand-off: a never-approved order has nothing queued in receiving.
    pub async fn reject(
        &self,
        order_id: PurchaseOrderId,
        reviewer: UserId,
        role: &Role,
        reason: &str,
        comment: Option<&str>,
    ) -> WorkflowResult<ApprovalOutcome> {
        let order = self.load(order_id).await?;

        let combined = match comment {
            Some(comment) => format!("{reason}; {comment}"),
            None => reason.to_string(),
        };
        let context = TransitionContext::by(reviewer).with_reason(combined);

        let outcome = self.transition(&order, EnhancedStatus::Cancelled, role, &context)?;
        self.persist(&outcome).await?;

        self.audit
            .record(AuditEntry::new(
                Some(order_id),
                "purchase_order.rejected",
                Some(reviewer),
                json!({
                    "from": outcome.transition.from,
                    "reason": reason,
                    "comment": comment,
                }),
            ))
            .await?;

        let delivery = self
            .side_channel("notify", self.notifier.notify(Notification {
                kind: NotificationKind::OrderRejected,
                order_id: Some(order_id),
                recipients: self.decision_recipients(&outcome.order),
                message: format!(
                    "purchase order {} rejected: {}",
                    outcome.order.number(),
                    reason
                ),
            }))
            .await;
        self.log_failed_deliveries(order_id, delivery.as_deref());

        Ok(ApprovalOutcome {
            order: outcome.order,
            transition: outcome.transition,
            delivery,
        })
    }

    /// Approve a batch. Each order is isolated: one rejection or storage
    /// failure never aborts the rest. One consolidated audit entry and one
    /// summary notification carry the aggregate counts.
    pub async fn bulk_approve(
        &self,
        order_ids: &[PurchaseOrderId],
        approver: UserId,
        role: &Role,
    ) -> WorkflowResult<BulkApprovalOutcome> {
        let mut outcome = BulkApprovalOutcome::default();

        for &order_id in order_ids {
            match self.approve(order_id, approver, role, None).await {
                Ok(_) => outcome.approved.push(order_id),
                Err(error) => {
                    tracing::warn!(order = %order_id, error = %error, "bulk approval item failed");
                    outcome.failed.push(BulkFailure { order_id, error });
                }
            }
        }

        self.audit
            .record(AuditEntry::new(
                None,
                "purchase_order.bulk_approved",
                Some(approver),
                json!({
                    "requested": order_ids.len(),
                    "approved": outcome.approved_count(),
                    "failed": outcome.failed_count(),
                }),
            ))
            .await?;

        self.side_channel("notify", self.notifier.notify(Notification {
            kind: NotificationKind::BulkApprovalSummary,
            order_id: None,
            recipients: vec![approver],
            message: format!(
                "bulk approval finished: {} approved, {} failed of {}",
                outcome.approved_count(),
                outcome.failed_count(),
                order_ids.len()
            ),
        }))
        .await;

        Ok(outcome)
    }

    async fn load(&self, order_id: PurchaseOrderId) -> WorkflowResult<PurchaseOrder> {
        self.store
            .load(order_id)
            .await?
            .ok_or(WorkflowError::OrderNotFound(order_id))
    }

    /// Permission gate, then state machine. An unauthorized actor is rejected
    /// before content rules run; an authorized one sees every content
    /// violation at once. Approval additionally re-checks the monetary
    /// consistency of the stored order.
    fn transition(
        &self,
        order: &PurchaseOrder,
        target: EnhancedStatus,
        role: &Role,
        context: &TransitionContext,
    ) -> WorkflowResult<TransitionOutcome> {
        let mut checks = validate_user_permissions(&self.config.permissions, role, target, order);
        if !checks.is_valid() {
            return Err(WorkflowError::Rejected(checks));
        }
        if target == EnhancedStatus::Approved {
            checks.merge(order.validate_totals(&self.config.rounding));
        }
        match execute_transition(order, target, context) {
            Ok(outcome) if checks.is_valid() => Ok(outcome),
            Ok(_) => Err(WorkflowError::Rejected(checks)),
            Err(result) => {
                checks.merge(result);
                Err(WorkflowError::Rejected(checks))
            }
        }
    }

    /// The order's creator plus any configured extra recipients.
    fn decision_recipients(&self, order: &PurchaseOrder) -> Vec<UserId> {
        let mut recipients = vec![order.created_by()];
        for &extra in &self.config.notification_recipients {
            if !recipients.contains(&extra) {
                recipients.push(extra);
            }
        }
        recipients
    }

    fn log_failed_deliveries(&self, order_id: PurchaseOrderId, logs: Option<&[DeliveryLog]>) {
        for log in logs.unwrap_or_default() {
            if !log.delivered {
                tracing::warn!(
                    order = %order_id,
                    recipient = %log.recipient,
                    detail = ?log.detail,
                    "decision notification failed"
                );
            }
        }
    }

    async fn persist(&self, outcome: &TransitionOutcome) -> WorkflowResult<()> {
        self.store.save(&outcome.order).await?;
        self.store.append_transition(&outcome.transition).await?;
        Ok(())
    }

    /// Run a side-channel call under the configured timeout. `None` means the
    /// call timed out; it has already been logged.
    async fn side_channel<F, T>(&self, channel: &str, call: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        match self.config.side_channel_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(channel, "side channel call timed out");
                    None
                }
            },
            None => Some(call.await),
        }
    }
}
