use crate::errors::StoreError;
use crate::models::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// Transaction record storage. Idempotency-key uniqueness is enforced here,
/// under the store's own lock, not as an application-level check-then-act:
/// that is the only race-safe way to deduplicate concurrent identical
/// submissions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a new PENDING row. Fails with
    /// `StoreError::DuplicateIdempotencyKey` if the key is already taken.
    async fn create(&self, new: NewTransaction) -> Result<Transaction, StoreError>;

    /// Apply one status transition, validated against the state machine.
    async fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, StoreError>;

    async fn find_by_idempotency_key(&self, key: &str) -> Option<Transaction>;

    async fn get(&self, id: TransactionId) -> Option<Transaction>;
}

#[derive(Default)]
struct TxInner {
    rows: HashMap<TransactionId, Transaction>,
    by_key: HashMap<String, TransactionId>,
    next_id: u64,
}

pub struct InMemoryTransactionStore {
    inner: RwLock<TxInner>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TxInner::default()),
        }
    }
}

impl Default for InMemoryTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.by_key.contains_key(&new.idempotency_key) {
            return Err(StoreError::DuplicateIdempotencyKey);
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let now = SystemTime::now();
        let row = Transaction {
            id,
            from_account: new.from_account,
            to_account: new.to_account,
            amount: new.amount,
            idempotency_key: new.idempotency_key.clone(),
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        inner.by_key.insert(new.idempotency_key, id);
        inner.rows.insert(id, row.clone());

        Ok(row)
    }

    async fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .rows
            .get_mut(&id)
            .ok_or(StoreError::UnknownTransaction(id))?;

        if !row.status.can_transition_to(status) {
            return Err(StoreError::IllegalTransition {
                from: row.status,
                to: status,
            });
        }

        row.status = status;
        row.updated_at = SystemTime::now();

        Ok(row.clone())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Option<Transaction> {
        let inner = self.inner.read().await;
        let id = inner.by_key.get(key)?;
        inner.rows.get(id).cloned()
    }

    async fn get(&self, id: TransactionId) -> Option<Transaction> {
        self.inner.read().await.rows.get(&id).cloned()
    }
}
