use crate::errors::StoreError;
use crate::models::{AccountId, EntryKind, LedgerEntry, NewEntry, TransactionId};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// Append-only entry storage. The interface deliberately has no update or
/// delete: ledger history is immutable, and every balance is a fold over
/// it rather than a stored field that could drift.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append a batch atomically. Either every entry becomes visible or
    /// none do; a concurrent balance read never observes half a pair.
    /// The batch must be non-empty, all-positive and balanced (debits
    /// equal credits).
    async fn append(&self, entries: Vec<NewEntry>) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Derived balance: sum of credits minus sum of debits for the account.
    async fn balance(&self, account: AccountId) -> Decimal;

    async fn entries_for_transaction(&self, transaction: TransactionId) -> Vec<LedgerEntry>;
}

fn validate_batch(entries: &[NewEntry]) -> Result<(), StoreError> {
    if entries.is_empty() {
        return Err(StoreError::EmptyBatch);
    }

    let mut debit_total = Decimal::ZERO;
    let mut credit_total = Decimal::ZERO;

    for entry in entries {
        if entry.amount <= Decimal::ZERO {
            return Err(StoreError::NonPositiveAmount);
        }
        match entry.kind {
            EntryKind::Debit => debit_total += entry.amount,
            EntryKind::Credit => credit_total += entry.amount,
        }
    }

    if debit_total != credit_total {
        return Err(StoreError::UnbalancedBatch);
    }

    Ok(())
}

#[derive(Default)]
struct LedgerInner {
    entries: Vec<LedgerEntry>,
    // entries index: account -> positions, transaction -> positions
    by_account: HashMap<AccountId, Vec<usize>>,
    by_transaction: HashMap<TransactionId, Vec<usize>>,
    next_id: u64,
}

pub struct InMemoryLedgerStore {
    inner: RwLock<LedgerInner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerInner::default()),
        }
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entries: Vec<NewEntry>) -> Result<Vec<LedgerEntry>, StoreError> {
        validate_batch(&entries)?;

        // Single write critical section: the whole batch lands before any
        // reader takes the lock again.
        let mut inner = self.inner.write().await;
        let now = SystemTime::now();
        let mut appended = Vec::with_capacity(entries.len());

        for entry in entries {
            inner.next_id += 1;
            let id = inner.next_id;
            let row = LedgerEntry {
                id,
                account: entry.account,
                transaction: entry.transaction,
                kind: entry.kind,
                amount: entry.amount,
                created_at: now,
            };

            let position = inner.entries.len();
            inner.by_account.entry(row.account).or_default().push(position);
            inner
                .by_transaction
                .entry(row.transaction)
                .or_default()
                .push(position);
            inner.entries.push(row.clone());
            appended.push(row);
        }

        Ok(appended)
    }

    async fn balance(&self, account: AccountId) -> Decimal {
        let inner = self.inner.read().await;
        let Some(positions) = inner.by_account.get(&account) else {
            return Decimal::ZERO;
        };

        positions
            .iter()
            .map(|&pos| inner.entries[pos].signed_amount())
            .sum()
    }

    async fn entries_for_transaction(&self, transaction: TransactionId) -> Vec<LedgerEntry> {
        let inner = self.inner.read().await;
        inner
            .by_transaction
            .get(&transaction)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&pos| inner.entries[pos].clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
