use crate::models::{Transaction, TransactionStatus};
use crate::transaction_store::TransactionStore;
use std::sync::Arc;

/// What a prior submission with the same idempotency key amounts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No record; the caller may create a new transaction.
    NotFound,
    /// Already done; hand the prior result back, never reprocess.
    Completed(Transaction),
    /// Still being committed; report "in progress", never run a second
    /// commit concurrently.
    InFlight(Transaction),
    /// Terminal failure; the key is burned and is not silently retried.
    Failed(Transaction),
    /// Terminal reversal; same policy as `Failed`.
    Reversed(Transaction),
}

/// Duplicate-submission detector over the transaction store. The store's
/// uniqueness constraint is what makes concurrent same-key creates race
/// safely; this guard just interprets whatever row won.
#[derive(Clone)]
pub struct IdempotencyGuard {
    transactions: Arc<dyn TransactionStore>,
}

impl IdempotencyGuard {
    pub fn new(transactions: Arc<dyn TransactionStore>) -> Self {
        Self { transactions }
    }

    pub async fn resolve(&self, key: &str) -> Resolution {
        match self.transactions.find_by_idempotency_key(key).await {
            None => Resolution::NotFound,
            Some(tx) => match tx.status {
                TransactionStatus::Completed => Resolution::Completed(tx),
                TransactionStatus::Pending => Resolution::InFlight(tx),
                TransactionStatus::Failed => Resolution::Failed(tx),
                TransactionStatus::Reversed => Resolution::Reversed(tx),
            },
        }
    }
}
