//! Collaborator contracts and their in-memory implementations.
//!
//! The orchestrator talks to the outside world only through these traits.
//! Real deployments supply database/queue/mail implementations; the in-memory
//! doubles here back the tests and development setups.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use vendora_core::{ProductId, RecordId, UserId};
use vendora_purchasing::{PurchaseOrder, PurchaseOrderId, StatusTransition};

/// Failure talking to a backing store. Carries no retry semantics; the
/// orchestrator decides what is fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("store failure: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Persistence seam for orders and their transition history.
///
/// Stores the canonical order: collapsing to the legacy vocabulary is a
/// concern of legacy-facing adapters, never of the workflow store.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn load(&self, id: PurchaseOrderId) -> Result<Option<PurchaseOrder>, StoreError>;
    async fn save(&self, order: &PurchaseOrder) -> Result<(), StoreError>;
    async fn append_transition(&self, transition: &StatusTransition) -> Result<(), StoreError>;
}

/// Current inventory position for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCost {
    pub product_id: ProductId,
    pub stock: Decimal,
    pub unit_cost: Decimal,
}

/// State of a cost-update transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// Record tracking one receipt's cost recomputation end to end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTransaction {
    pub id: RecordId,
    pub order_id: PurchaseOrderId,
    pub initiated_by: UserId,
    pub status: CostTransactionStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failure: Option<String>,
}

impl CostTransaction {
    pub fn begin(order_id: PurchaseOrderId, initiated_by: UserId) -> Self {
        Self {
            id: RecordId::new(),
            order_id,
            initiated_by,
            status: CostTransactionStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            failure: None,
        }
    }

    pub fn complete(&mut self) {
        self.status = CostTransactionStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = CostTransactionStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.failure = Some(reason.into());
    }
}

/// Persistence seam for product costs and cost transactions.
#[async_trait]
pub trait CostStore: Send + Sync {
    async fn product_cost(&self, product: ProductId) -> Result<Option<ProductCost>, StoreError>;
    /// Persist the new positions atomically.
    async fn save_costs(&self, costs: &[ProductCost]) -> Result<(), StoreError>;
    /// Upsert a transaction record (same id, new status).
    async fn record_transaction(&self, transaction: &CostTransaction) -> Result<(), StoreError>;
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderApproved,
    OrderRejected,
    BulkApprovalSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub order_id: Option<PurchaseOrderId>,
    pub recipients: Vec<UserId>,
    pub message: String,
}

/// Outcome of one delivery attempt to one recipient. Notifiers never error;
/// failure is a recorded fact, not an exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLog {
    pub kind: NotificationKind,
    pub recipient: UserId,
    pub delivered: bool,
    pub detail: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver to every recipient, returning one log entry per recipient.
    async fn notify(&self, notification: Notification) -> Vec<DeliveryLog>;
}

/// One immutable audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: RecordId,
    pub order_id: Option<PurchaseOrderId>,
    pub action: String,
    pub actor: Option<UserId>,
    pub detail: JsonValue,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        order_id: Option<PurchaseOrderId>,
        action: impl Into<String>,
        actor: Option<UserId>,
        detail: JsonValue,
    ) -> Self {
        Self {
            id: RecordId::new(),
            order_id,
            action: action.into(),
            actor,
            detail,
            recorded_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Persist the entry, returning its log id.
    async fn record(&self, entry: AuditEntry) -> Result<RecordId, StoreError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("receiving hook failure: {0}")]
pub struct HookError(pub String);

/// Downstream hand-off fired after an order is approved, so receiving can
/// start expecting the goods. Strictly best-effort.
#[async_trait]
pub trait ReceivingQueueHook: Send + Sync {
    async fn order_approved(&self, order: &PurchaseOrder) -> Result<(), HookError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

fn poisoned(_: impl std::fmt::Debug) -> StoreError {
    StoreError::new("lock poisoned")
}

/// In-memory order store for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<PurchaseOrderId, PurchaseOrder>>,
    transitions: RwLock<Vec<StatusTransition>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an order, bypassing the save path.
    pub fn seed(&self, order: PurchaseOrder) {
        self.orders
            .write()
            .expect("lock poisoned")
            .insert(order.id(), order);
    }

    pub fn transitions(&self) -> Vec<StatusTransition> {
        self.transitions.read().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn load(&self, id: PurchaseOrderId) -> Result<Option<PurchaseOrder>, StoreError> {
        let orders = self.orders.read().map_err(poisoned)?;
        Ok(orders.get(&id).cloned())
    }

    async fn save(&self, order: &PurchaseOrder) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn append_transition(&self, transition: &StatusTransition) -> Result<(), StoreError> {
        let mut transitions = self.transitions.write().map_err(poisoned)?;
        transitions.push(transition.clone());
        Ok(())
    }
}

/// In-memory cost store. `fail_saves` makes `save_costs` reject, for
/// exercising the failure path.
#[derive(Debug, Default)]
pub struct InMemoryCostStore {
    costs: RwLock<HashMap<ProductId, ProductCost>>,
    transactions: RwLock<Vec<CostTransaction>>,
    fail_saves: AtomicBool,
}

impl InMemoryCostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, cost: ProductCost) {
        self.costs
            .write()
            .expect("lock poisoned")
            .insert(cost.product_id, cost);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn cost_of(&self, product: ProductId) -> Option<ProductCost> {
        self.costs
            .read()
            .expect("lock poisoned")
            .get(&product)
            .copied()
    }

    pub fn transactions(&self) -> Vec<CostTransaction> {
        self.transactions.read().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl CostStore for InMemoryCostStore {
    async fn product_cost(&self, product: ProductId) -> Result<Option<ProductCost>, StoreError> {
        let costs = self.costs.read().map_err(poisoned)?;
        Ok(costs.get(&product).copied())
    }

    async fn save_costs(&self, costs: &[ProductCost]) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::new("simulated save failure"));
        }
        let mut map = self.costs.write().map_err(poisoned)?;
        for cost in costs {
            map.insert(cost.product_id, *cost);
        }
        Ok(())
    }

    async fn record_transaction(&self, transaction: &CostTransaction) -> Result<(), StoreError> {
        let mut transactions = self.transactions.write().map_err(poisoned)?;
        match transactions.iter_mut().find(|t| t.id == transaction.id) {
            Some(existing) => *existing = transaction.clone(),
            None => transactions.push(transaction.clone()),
        }
        Ok(())
    }
}

/// Notifier that records every attempt. `fail_all` flips every delivery to a
/// failed log entry.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    log: RwLock<Vec<DeliveryLog>>,
    fail_all: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn deliveries(&self) -> Vec<DeliveryLog> {
        self.log.read().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Vec<DeliveryLog> {
        let delivered = !self.fail_all.load(Ordering::SeqCst);
        let entries: Vec<DeliveryLog> = notification
            .recipients
            .iter()
            .map(|&recipient| DeliveryLog {
                kind: notification.kind,
                recipient,
                delivered,
                detail: (!delivered).then(|| "simulated delivery failure".to_string()),
                attempted_at: Utc::now(),
            })
            .collect();
        self.log
            .write()
            .expect("lock poisoned")
            .extend(entries.iter().cloned());
        entries
    }
}

/// Audit trail that appends to a vector.
#[derive(Debug, Default)]
pub struct RecordingAuditTrail {
    entries: RwLock<Vec<AuditEntry>>,
}

impl RecordingAuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl AuditTrail for RecordingAuditTrail {
    async fn record(&self, entry: AuditEntry) -> Result<RecordId, StoreError> {
        let id = entry.id;
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.push(entry);
        Ok(id)
    }
}

/// Hook that records the orders it was handed. `fail_all` makes every call
/// error, for verifying the orchestrator's best-effort handling.
#[derive(Debug, Default)]
pub struct RecordingHook {
    seen: RwLock<Vec<PurchaseOrderId>>,
    fail_all: AtomicBool,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn seen(&self) -> Vec<PurchaseOrderId> {
        self.seen.read().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ReceivingQueueHook for RecordingHook {
    async fn order_approved(&self, order: &PurchaseOrder) -> Result<(), HookError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(HookError("simulated hook failure".to_string()));
        }
        self.seen.write().expect("lock poisoned").push(order.id());
        Ok(())
    }
}
