use crate::errors::TransferError;
use crate::ledger_store::LedgerStore;
use crate::models::{
    AccountId, EntryKind, NewEntry, NewTransaction, Transaction, TransactionId,
    TransactionStatus,
};
use crate::transaction_store::TransactionStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::error;

/// Everything a committer needs to run one atomic transfer commit.
#[derive(Debug, Clone)]
pub struct CommitPlan {
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Decimal,
    pub idempotency_key: String,
    /// false only for privileged seeds; the system account may go negative.
    pub enforce_sender_balance: bool,
}

pub enum CommitterMessage {
    Commit {
        plan: CommitPlan,
        reply: oneshot::Sender<Result<Transaction, TransferError>>,
    },
    Shutdown,
}

/// The atomic commit scope, realized as an actor. All transfers debiting a
/// given account are routed to the same committer, so within `commit` the
/// balance re-check reads a value no concurrent debit can invalidate: that
/// re-check is the authoritative one, the engine's earlier check is only
/// advisory. The actor does nothing slow in here; notification and any
/// other I/O happen after the reply is sent, outside the scope.
pub struct Committer {
    transactions: Arc<dyn TransactionStore>,
    ledger: Arc<dyn LedgerStore>,
    receiver: mpsc::Receiver<CommitterMessage>,
}

impl Committer {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        ledger: Arc<dyn LedgerStore>,
        receiver: mpsc::Receiver<CommitterMessage>,
    ) -> Self {
        Self {
            transactions,
            ledger,
            receiver,
        }
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CommitterMessage::Commit { plan, reply } => {
                    let result = self.commit(plan).await;
                    let _ = reply.send(result);
                }
                CommitterMessage::Shutdown => break,
            }
        }

        tracing::debug!("committer terminated");
    }

    /// One commit: create the PENDING row, re-check the sender balance,
    /// append the balanced pair, flip the row to COMPLETED. The append is
    /// the last fallible step, so an abort anywhere leaves zero entries
    /// visible and the row FAILED (or absent, if the create itself lost
    /// the uniqueness race).
    async fn commit(&self, plan: CommitPlan) -> Result<Transaction, TransferError> {
        let tx = self
            .transactions
            .create(NewTransaction {
                from_account: plan.from_account,
                to_account: plan.to_account,
                amount: plan.amount,
                idempotency_key: plan.idempotency_key,
            })
            .await?;

        if plan.enforce_sender_balance {
            let balance = self.ledger.balance(plan.from_account).await;
            if balance < plan.amount {
                self.mark_failed(tx.id).await;
                return Err(TransferError::InsufficientFunds {
                    balance,
                    requested: plan.amount,
                });
            }
        }

        let pair = vec![
            NewEntry {
                account: plan.from_account,
                transaction: tx.id,
                kind: EntryKind::Debit,
                amount: plan.amount,
            },
            NewEntry {
                account: plan.to_account,
                transaction: tx.id,
                kind: EntryKind::Credit,
                amount: plan.amount,
            },
        ];

        if let Err(e) = self.ledger.append(pair).await {
            self.mark_failed(tx.id).await;
            return Err(TransferError::CommitFailed(e.to_string()));
        }

        // The single authoritative transition for this commit. Failing here
        // after the pair landed would break the entries-imply-completed
        // invariant, so it is surfaced loudly rather than folded into a
        // FAILED row.
        match self
            .transactions
            .update_status(tx.id, TransactionStatus::Completed)
            .await
        {
            Ok(tx) => Ok(tx),
            Err(e) => {
                error!(
                    transaction = tx.id,
                    error = %e,
                    "entries appended but completion transition failed"
                );
                Err(TransferError::CommitFailed(e.to_string()))
            }
        }
    }

    async fn mark_failed(&self, id: TransactionId) {
        if let Err(e) = self
            .transactions
            .update_status(id, TransactionStatus::Failed)
            .await
        {
            error!(transaction = id, error = %e, "failed to mark transaction FAILED");
        }
    }
}

#[derive(Clone)]
pub struct CommitterHandle {
    sender: mpsc::Sender<CommitterMessage>,
}

impl CommitterHandle {
    pub fn new(sender: mpsc::Sender<CommitterMessage>) -> Self {
        Self { sender }
    }

    pub async fn commit(&self, plan: CommitPlan) -> Result<Transaction, TransferError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.sender
            .send(CommitterMessage::Commit {
                plan,
                reply: reply_tx,
            })
            .await
            .map_err(|_| TransferError::CommitterUnavailable)?;

        reply_rx
            .await
            .map_err(|_| TransferError::CommitterUnavailable)?
    }
}
