use crate::committer::{CommitPlan, Committer, CommitterHandle};
use crate::errors::TransferError;
use crate::ledger_store::LedgerStore;
use crate::models::Transaction;
use crate::transaction_store::TransactionStore;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Pool of committer actors sharded by sending account. Debits of one
/// account always serialize through one actor; transfers from different
/// senders commit in parallel. Credits need no routing of their own: the
/// ledger is append-only, and a concurrent credit can only raise a balance
/// the re-check is about to read.
#[derive(Clone)]
pub struct CommitterPool {
    shards: Vec<CommitterHandle>,
}

impl CommitterPool {
    pub fn new(
        num_shards: usize,
        mailbox_capacity: usize,
        transactions: Arc<dyn TransactionStore>,
        ledger: Arc<dyn LedgerStore>,
    ) -> Self {
        let mut shards = Vec::with_capacity(num_shards);

        for _ in 0..num_shards {
            let (tx, rx) = mpsc::channel(mailbox_capacity);
            let handle = CommitterHandle::new(tx);
            let actor = Committer::new(transactions.clone(), ledger.clone(), rx);

            tokio::spawn(async move {
                actor.run().await;
            });

            shards.push(handle);
        }

        Self { shards }
    }

    pub async fn commit(&self, plan: CommitPlan) -> Result<Transaction, TransferError> {
        let shard_id = (plan.from_account as usize) % self.shards.len();
        self.shards[shard_id].commit(plan).await
    }
}
