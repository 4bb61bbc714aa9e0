use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_engine::{
    Account, EngineConfig, InMemoryAccountGateway, InMemoryLedgerStore,
    InMemoryTransactionStore, TracingNotifier, TransferEngine,
};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::runtime::Runtime;

async fn build_engine(accounts: u64) -> (TransferEngine, Arc<InMemoryAccountGateway>) {
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

    for id in 1..=accounts {
        gateway.register(Account::new(id, id)).await;
        engine
            .seed_initial_funds(config.system_account, id, dec!(1000.0), &format!("seed-{}", id))
            .await;
    }

    (engine, gateway)
}

fn benchmark_parallel_senders(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("parallel_senders");

    for num_senders in [10u64, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_senders),
            num_senders,
            |b, &num_senders| {
                b.to_async(&rt).iter(|| async move {
                    let (engine, _gateway) = build_engine(num_senders).await;

                    for sender in 1..=num_senders {
                        let _ = engine
                            .submit(
                                sender,
                                (sender % num_senders) + 1,
                                dec!(1.0),
                                &format!("bench-{}", sender),
                            )
                            .await;
                    }

                    black_box(engine.balance(1).await)
                });
            },
        );
    }

    group.finish();
}

fn benchmark_transfer_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("transfer_1000", |b| {
        b.to_async(&rt).iter(|| async {
            let (engine, _gateway) = build_engine(100).await;

            for i in 1..=1000u64 {
                let sender = (i % 100) + 1;
                let recipient = (sender % 100) + 1;
                let _ = engine
                    .submit(sender, recipient, dec!(1.0), &format!("t-{}", i))
                    .await;
            }

            black_box(engine.balance(1).await)
        });
    });
}

criterion_group!(benches, benchmark_parallel_senders, benchmark_transfer_throughput);
criterion_main!(benches);
