use crate::models::{AccountId, TransactionId};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct TransferNotice {
    pub transaction: TransactionId,
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: Decimal,
}

/// Fire-and-forget delivery of "your transfer completed" to the sender.
/// Never on the commit path: the engine spawns the call after the commit
/// scope has closed, and a delivery failure is logged, not propagated.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn transfer_completed(&self, notice: TransferNotice) -> Result<()>;
}

/// Default notifier: a structured log line stands in for the real channel.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn transfer_completed(&self, notice: TransferNotice) -> Result<()> {
        tracing::info!(
            transaction = notice.transaction,
            sender = notice.sender,
            recipient = notice.recipient,
            amount = %notice.amount,
            "transfer completed"
        );
        Ok(())
    }
}
