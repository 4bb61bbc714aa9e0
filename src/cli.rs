use crate::account_gateway::InMemoryAccountGateway;
use crate::commands;
use crate::config::EngineConfig;
use crate::csv_io::{stream_commands, write_balances};
use crate::ledger_store::InMemoryLedgerStore;
use crate::models::Account;
use crate::notifier::TracingNotifier;
use crate::transaction_store::InMemoryTransactionStore;
use crate::transfer_engine::TransferEngine;
use anyhow::Result;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::BufReader;

/// One-shot mode: apply a command file, print final balances to stdout.
pub async fn run(input_path: PathBuf) -> Result<()> {
    let config = EngineConfig::default();
    let gateway = Arc::new(InMemoryAccountGateway::new());
    let engine = TransferEngine::new(
        config.clone(),
        gateway.clone(),
        Arc::new(InMemoryTransactionStore::new()),
        Arc::new(InMemoryLedgerStore::new()),
        Arc::new(TracingNotifier),
    );

    // The system account backs seed rows.
    gateway
        .register(Account::new(config.system_account, 0))
        .await;

    let file = File::open(&input_path).await?;
    let reader = BufReader::new(file);
    let mut stream = stream_commands(reader);

    while let Some(result) = stream.next().await {
        match result {
            Ok(row) => {
                // Rejected commands still leave the run usable
                let _ = commands::apply(&engine, &gateway, row).await;
            }
            Err(_) => {
                // Ignore parse errors
            }
        }
    }

    let balances = commands::collect_balances(&engine, &gateway).await;
    write_balances(tokio::io::stdout(), balances).await?;

    Ok(())
}
