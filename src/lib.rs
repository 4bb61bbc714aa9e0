pub mod account_gateway;
pub mod cli;
pub mod commands;
pub mod committer;
pub mod committer_pool;
pub mod config;
pub mod csv_io;
pub mod errors;
pub mod idempotency;
pub mod journal;
pub mod ledger_store;
pub mod models;
pub mod notifier;
pub mod server;
pub mod transaction_store;
pub mod transfer_engine;

pub use account_gateway::{AccountGateway, InMemoryAccountGateway};
pub use config::EngineConfig;
pub use errors::{StoreError, TransferError};
pub use idempotency::{IdempotencyGuard, Resolution};
pub use ledger_store::{InMemoryLedgerStore, LedgerStore};
pub use models::{
    Account, AccountId, AccountStatus, EntryKind, LedgerEntry, Transaction, TransactionId,
    TransactionStatus, TransferOutcome,
};
pub use notifier::{Notifier, TracingNotifier, TransferNotice};
pub use transaction_store::{InMemoryTransactionStore, TransactionStore};
pub use transfer_engine::TransferEngine;
