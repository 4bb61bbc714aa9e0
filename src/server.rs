use crate::account_gateway::InMemoryAccountGateway;
use crate::commands;
use crate::config::EngineConfig;
use crate::csv_io::{stream_commands, write_balances};
use crate::journal::Journal;
use crate::ledger_store::InMemoryLedgerStore;
use crate::models::Account;
use crate::notifier::TracingNotifier;
use crate::transaction_store::InMemoryTransactionStore;
use crate::transfer_engine::TransferEngine;
use anyhow::Result;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

pub async fn run(bind: String, max_connections: usize, journal_path: PathBuf) -> Result<()> {
    tracing::info!("Server mode: binding to {}", bind);

    let config = EngineConfig::default();
    let gateway = Arc::new(InMemoryAccountGateway::new());
    let engine = TransferEngine::new(
        config.clone(),
        gateway.clone(),
        Arc::new(InMemoryTransactionStore::new()),
        Arc::new(InMemoryLedgerStore::new()),
        Arc::new(TracingNotifier),
    );

    gateway
        .register(Account::new(config.system_account, 0))
        .await;

    let journal = Arc::new(Journal::new(journal_path).await?);

    // Rebuild state from previous runs
    for row in journal.replay().await? {
        if let Err(e) = commands::apply(&engine, &gateway, row).await {
            tracing::warn!("journal replay: {}", e);
        }
    }

    let listener = TcpListener::bind(&bind).await?;
    let semaphore = Arc::new(Semaphore::new(max_connections));

    tracing::info!("Listening on {}, max {} connections", bind, max_connections);

    loop {
        let permit = semaphore.clone().acquire_owned().await?;
        let (socket, addr) = listener.accept().await?;
        tracing::info!("Accepted connection from {}", addr);

        let engine = engine.clone();
        let gateway = gateway.clone();
        let journal = journal.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, engine, gateway, journal).await {
                tracing::error!("Connection {} error: {}", addr, e);
            }
            drop(permit);
        });
    }
}

async fn handle_connection(
    socket: TcpStream,
    engine: TransferEngine,
    gateway: Arc<InMemoryAccountGateway>,
    journal: Arc<Journal>,
) -> Result<()> {
    let (reader, writer) = socket.into_split();
    let reader = BufReader::new(reader);

    let mut stream = stream_commands(reader);

    while let Some(result) = stream.next().await {
        match result {
            Ok(row) => match commands::apply(&engine, &gateway, row.clone()).await {
                Ok(true) => {
                    if let Err(e) = journal.append(&row).await {
                        tracing::error!("journal append failed: {}", e);
                    }
                }
                Ok(false) => {}
                Err(e) => tracing::warn!("command rejected: {}", e),
            },
            Err(e) => {
                tracing::warn!("CSV parse error: {}", e);
            }
        }
    }

    // Read final state and return to client
    let balances = commands::collect_balances(&engine, &gateway).await;
    let writer = BufWriter::new(writer);
    write_balances(writer, balances).await?;

    Ok(())
}
