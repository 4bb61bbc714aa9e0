use crate::account_gateway::AccountGateway;
use crate::committer::CommitPlan;
use crate::committer_pool::CommitterPool;
use crate::config::EngineConfig;
use crate::errors::{StoreError, TransferError};
use crate::idempotency::{IdempotencyGuard, Resolution};
use crate::ledger_store::LedgerStore;
use crate::models::{
    Account, AccountId, Transaction, TransactionId, TransferOutcome,
};
use crate::notifier::{Notifier, TransferNotice};
use crate::transaction_store::TransactionStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::warn;

/// Orchestrates a transfer: validation, idempotency short-circuit, advisory
/// balance check, then the atomic commit via the committer pool. The engine
/// is cheap to clone and safe to share across request handlers.
#[derive(Clone)]
pub struct TransferEngine {
    gateway: Arc<dyn AccountGateway>,
    transactions: Arc<dyn TransactionStore>,
    ledger: Arc<dyn LedgerStore>,
    guard: IdempotencyGuard,
    committers: CommitterPool,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

impl TransferEngine {
    pub fn new(
        config: EngineConfig,
        gateway: Arc<dyn AccountGateway>,
        transactions: Arc<dyn TransactionStore>,
        ledger: Arc<dyn LedgerStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let guard = IdempotencyGuard::new(transactions.clone());
        let committers = CommitterPool::new(
            config.committers,
            config.mailbox_capacity,
            transactions.clone(),
            ledger.clone(),
        );

        Self {
            gateway,
            transactions,
            ledger,
            guard,
            committers,
            notifier,
            config,
        }
    }

    pub fn system_account(&self) -> AccountId {
        self.config.system_account
    }

    /// Submit a transfer. Validation failures reject with no record
    /// written; only failures inside the commit scope leave a FAILED row
    /// behind, observable through the same idempotency key on retry.
    pub async fn submit(
        &self,
        from_account: AccountId,
        to_account: AccountId,
        amount: Decimal,
        idempotency_key: &str,
    ) -> TransferOutcome {
        if let Err(e) = validate_request(amount, idempotency_key) {
            return TransferOutcome::Rejected(e);
        }

        if let Err(e) = self.active_account(from_account).await {
            return TransferOutcome::Rejected(e);
        }
        if let Err(e) = self.active_account(to_account).await {
            return TransferOutcome::Rejected(e);
        }

        if let Some(prior) = self.resolve_prior(idempotency_key).await {
            return prior;
        }

        // Advisory only. The committer repeats this check inside the
        // commit scope, where no concurrent debit can slip between the
        // read and the append.
        let balance = self.ledger.balance(from_account).await;
        if balance < amount {
            return TransferOutcome::Rejected(TransferError::InsufficientFunds {
                balance,
                requested: amount,
            });
        }

        self.commit(CommitPlan {
            from_account,
            to_account,
            amount,
            idempotency_key: idempotency_key.to_string(),
            enforce_sender_balance: true,
        })
        .await
    }

    /// Privileged variant: inject funds from the configured system account.
    /// Skips the sender balance check, so the system account's ledger
    /// position may go negative. Callers must name the system account
    /// explicitly; anything else is rejected.
    pub async fn seed_initial_funds(
        &self,
        system_account: AccountId,
        to_account: AccountId,
        amount: Decimal,
        idempotency_key: &str,
    ) -> TransferOutcome {
        if let Err(e) = validate_request(amount, idempotency_key) {
            return TransferOutcome::Rejected(e);
        }

        if system_account != self.config.system_account {
            return TransferOutcome::Rejected(TransferError::NotSystemAccount(system_account));
        }

        if let Err(e) = self.active_account(system_account).await {
            return TransferOutcome::Rejected(e);
        }
        if let Err(e) = self.active_account(to_account).await {
            return TransferOutcome::Rejected(e);
        }

        if let Some(prior) = self.resolve_prior(idempotency_key).await {
            return prior;
        }

        self.commit(CommitPlan {
            from_account: system_account,
            to_account,
            amount,
            idempotency_key: idempotency_key.to_string(),
            enforce_sender_balance: false,
        })
        .await
    }

    /// Derived balance for an account known to the gateway.
    pub async fn balance(&self, account: AccountId) -> Result<Decimal, TransferError> {
        if self.gateway.lookup(account).await.is_none() {
            return Err(TransferError::AccountNotFound(account));
        }
        Ok(self.ledger.balance(account).await)
    }

    pub async fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.transactions.get(id).await
    }

    async fn active_account(&self, id: AccountId) -> Result<Account, TransferError> {
        let account = self
            .gateway
            .lookup(id)
            .await
            .ok_or(TransferError::AccountNotFound(id))?;

        if !account.is_active() {
            return Err(TransferError::AccountNotActive(id, account.status));
        }

        Ok(account)
    }

    /// Map a prior submission with the same key to its outcome, per the
    /// idempotency contract. `None` means the key is fresh.
    async fn resolve_prior(&self, key: &str) -> Option<TransferOutcome> {
        match self.guard.resolve(key).await {
            Resolution::NotFound => None,
            Resolution::Completed(tx) => Some(TransferOutcome::Completed(tx)),
            Resolution::InFlight(tx) => Some(TransferOutcome::Pending(tx)),
            Resolution::Failed(tx) => Some(TransferOutcome::Failed {
                transaction: Some(tx),
                reason: TransferError::PriorAttemptFailed,
            }),
            Resolution::Reversed(tx) => Some(TransferOutcome::Failed {
                transaction: Some(tx),
                reason: TransferError::PriorAttemptReversed,
            }),
        }
    }

    async fn commit(&self, plan: CommitPlan) -> TransferOutcome {
        let key = plan.idempotency_key.clone();

        let result = match timeout(self.config.commit_timeout, self.committers.commit(plan)).await
        {
            Ok(result) => result,
            Err(_) => {
                // The committer may still finish after we stopped waiting;
                // whatever state the row lands in is what a retry with the
                // same key will see.
                warn!(idempotency_key = %key, "commit timed out");
                return TransferOutcome::Failed {
                    transaction: self.transactions.find_by_idempotency_key(&key).await,
                    reason: TransferError::CommitFailed("commit timed out".to_string()),
                };
            }
        };

        match result {
            Ok(tx) => {
                self.spawn_notification(&tx);
                TransferOutcome::Completed(tx)
            }
            Err(TransferError::Store(StoreError::DuplicateIdempotencyKey)) => {
                // Lost the create race to a concurrent submission with the
                // same key; the winner's row is authoritative.
                match self.resolve_prior(&key).await {
                    Some(outcome) => outcome,
                    None => TransferOutcome::Failed {
                        transaction: None,
                        reason: TransferError::CommitFailed(
                            "duplicate key with no visible row".to_string(),
                        ),
                    },
                }
            }
            Err(reason) => TransferOutcome::Failed {
                transaction: self.transactions.find_by_idempotency_key(&key).await,
                reason,
            },
        }
    }

    /// Notification runs on its own task, after the commit scope closed.
    /// Delivery failure is logged and never rolls anything back.
    fn spawn_notification(&self, tx: &Transaction) {
        let notifier = self.notifier.clone();
        let notice = TransferNotice {
            transaction: tx.id,
            sender: tx.from_account,
            recipient: tx.to_account,
            amount: tx.amount,
        };

        tokio::spawn(async move {
            if let Err(e) = notifier.transfer_completed(notice).await {
                warn!(error = ?e, "failed to deliver transfer notification");
            }
        });
    }
}

fn validate_request(amount: Decimal, idempotency_key: &str) -> Result<(), TransferError> {
    if idempotency_key.trim().is_empty() {
        return Err(TransferError::MissingIdempotencyKey);
    }
    if amount <= Decimal::ZERO {
        return Err(TransferError::InvalidAmount);
    }
    Ok(())
}
