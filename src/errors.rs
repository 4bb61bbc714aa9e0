use crate::models::{AccountId, AccountStatus, TransactionId, TransactionStatus};
use rust_decimal::Decimal;
use thiserror::Error;

/// Storage-layer failures. `DuplicateIdempotencyKey` is the uniqueness
/// constraint doing its job: under a concurrent race exactly one create
/// succeeds and every loser observes this error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("idempotency key already exists")]
    DuplicateIdempotencyKey,
    #[error("transaction {0} not found")]
    UnknownTransaction(TransactionId),
    #[error("illegal status transition {from:?} -> {to:?}")]
    IllegalTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },
    #[error("ledger batch must not be empty")]
    EmptyBatch,
    #[error("entry amount must be positive")]
    NonPositiveAmount,
    #[error("ledger batch debits must equal credits")]
    UnbalancedBatch,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("missing idempotency key")]
    MissingIdempotencyKey,
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("account {0} is {1:?}, must be active")]
    AccountNotActive(AccountId, AccountStatus),
    #[error("account {0} is closed and immutable")]
    AccountClosed(AccountId),
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        balance: Decimal,
        requested: Decimal,
    },
    #[error("a prior submission with this idempotency key failed")]
    PriorAttemptFailed,
    #[error("a prior submission with this idempotency key was reversed")]
    PriorAttemptReversed,
    #[error("account {0} is not the configured system account")]
    NotSystemAccount(AccountId),
    #[error("commit did not complete: {0}")]
    CommitFailed(String),
    #[error("committer unavailable")]
    CommitterUnavailable,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TransferError {
    /// Whether the client should retry with the same idempotency key.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::CommitFailed(_) | TransferError::CommitterUnavailable
        )
    }
}
