use crate::errors::TransferError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub type AccountId = u64;
pub type TransactionId = u64;
pub type EntryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

/// Account record as supplied by the gateway. The engine only ever reads
/// these; account creation and status changes live outside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub owner_id: u64,
    pub status: AccountStatus,
}

impl Account {
    pub fn new(id: AccountId, owner_id: u64) -> Self {
        Self {
            id,
            owner_id,
            status: AccountStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

impl TransactionStatus {
    /// Legal status moves. Everything not listed here is rejected by the
    /// store, so a terminal row can never be resurrected.
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Pending, TransactionStatus::Completed)
                | (TransactionStatus::Pending, TransactionStatus::Failed)
                | (TransactionStatus::Completed, TransactionStatus::Reversed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Failed | TransactionStatus::Reversed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Decimal,
    pub idempotency_key: String,
    pub status: TransactionStatus,
    #[serde(with = "systemtime_serde")]
    pub created_at: SystemTime,
    #[serde(with = "systemtime_serde")]
    pub updated_at: SystemTime,
}

/// Creation payload; the store assigns id, status and timestamps.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Decimal,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Debit,
    Credit,
}

/// One side of a double-entry pair. Entries are append-only: once written
/// they are never updated or deleted, and balances are always derived by
/// folding over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub account: AccountId,
    pub transaction: TransactionId,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub amount: Decimal,
    #[serde(with = "systemtime_serde")]
    pub created_at: SystemTime,
}

impl LedgerEntry {
    /// Contribution of this entry to its account's balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            EntryKind::Debit => -self.amount,
            EntryKind::Credit => self.amount,
        }
    }
}

/// Append payload; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub account: AccountId,
    pub transaction: TransactionId,
    pub kind: EntryKind,
    pub amount: Decimal,
}

/// Result of a submission, mirroring the transaction state machine:
/// `Completed` covers both a fresh commit and an idempotent replay,
/// `Pending` means an earlier submission with the same key is still in
/// flight, `Failed` means a record exists but did not (or will not)
/// complete, `Rejected` means validation failed before any record was
/// written.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Completed(Transaction),
    Pending(Transaction),
    Failed {
        transaction: Option<Transaction>,
        reason: TransferError,
    },
    Rejected(TransferError),
}

impl TransferOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TransferOutcome::Completed(_))
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            TransferOutcome::Completed(tx) | TransferOutcome::Pending(tx) => Some(tx),
            TransferOutcome::Failed { transaction, .. } => transaction.as_ref(),
            TransferOutcome::Rejected(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&TransferError> {
        match self {
            TransferOutcome::Failed { reason, .. } | TransferOutcome::Rejected(reason) => {
                Some(reason)
            }
            _ => None,
        }
    }
}

mod systemtime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time
            .duration_since(UNIX_EPOCH)
            .map_err(|_| serde::ser::Error::custom("SystemTime before Unix epoch"))?;
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}
