use ledger_engine::{
    Account, EngineConfig, InMemoryAccountGateway, InMemoryLedgerStore,
    InMemoryTransactionStore, LedgerStore, TracingNotifier, TransactionStore, TransferEngine,
    TransferOutcome,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

const SYSTEM: u64 = 0;

struct Harness {
    engine: TransferEngine,
    gateway: Arc<InMemoryAccountGateway>,
    transactions: Arc<InMemoryTransactionStore>,
    ledger: Arc<InMemoryLedgerStore>,
}

async fn harness() -> Harness {
    let config = EngineConfig {
        committers: 8,
        ..Default::default()
    };
    let gateway = Arc::new(InMemoryAccountGateway::new());
    let transactions = Arc::new(InMemoryTransactionStore::new());
    let ledger = Arc::new(InMemoryLedgerStore::new());
    let engine = TransferEngine::new(
        config.clone(),
        gateway.clone(),
        transactions.clone(),
        ledger.clone(),
        Arc::new(TracingNotifier),
    );

    gateway
        .register(Account::new(config.system_account, 0))
        .await;

    Harness {
        engine,
        gateway,
        transactions,
        ledger,
    }
}

async fn seeded_account(h: &Harness, id: u64, amount: Decimal, key: &str) {
    assert!(h.gateway.register(Account::new(id, id)).await);
    let outcome = h.engine.seed_initial_funds(SYSTEM, id, amount, key).await;
    assert!(outcome.is_completed(), "seed failed: {:?}", outcome);
}

// ============================================================================
// DUPLICATE SUBMISSION RACES
// ============================================================================

#[tokio::test]
async fn test_concurrent_same_key_creates_one_transaction() {
    let h = harness().await;
    seeded_account(&h, 1, dec!(100), "seed-1").await;
    assert!(h.gateway.register(Account::new(2, 2)).await);

    let mut handles = vec![];
    for _ in 0..10 {
        let engine = h.engine.clone();
        handles.push(tokio::spawn(async move {
            engine.submit(1, 2, dec!(40), "dup-key").await
        }));
    }

    let mut outcomes = vec![];
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    // Every submitter converges on the same row: completed or (briefly)
    // observed in flight, never a second debit/credit pair.
    let winner = h
        .transactions
        .find_by_idempotency_key("dup-key")
        .await
        .expect("exactly one row must exist");
    for outcome in &outcomes {
        match outcome {
            TransferOutcome::Completed(tx) | TransferOutcome::Pending(tx) => {
                assert_eq!(tx.id, winner.id);
            }
            other => panic!("unexpected outcome under same-key race: {:?}", other),
        }
    }
    assert!(outcomes.iter().any(|o| o.is_completed()));

    // The debit happened exactly once.
    assert_eq!(h.engine.balance(1).await.unwrap(), dec!(60));
    assert_eq!(h.engine.balance(2).await.unwrap(), dec!(40));
    assert_eq!(h.ledger.entries_for_transaction(winner.id).await.len(), 2);
}

// ============================================================================
// OVERDRAW RACES
// ============================================================================

#[tokio::test]
async fn test_concurrent_overdraw_completes_at_most_one() {
    let h = harness().await;
    seeded_account(&h, 1, dec!(100), "seed-1").await;
    assert!(h.gateway.register(Account::new(2, 2)).await);

    // Both fit the starting balance alone; together they overdraw.
    let e1 = h.engine.clone();
    let e2 = h.engine.clone();
    let t1 = tokio::spawn(async move { e1.submit(1, 2, dec!(60), "race-a").await });
    let t2 = tokio::spawn(async move { e2.submit(1, 2, dec!(60), "race-b").await });

    let outcomes = [t1.await.unwrap(), t2.await.unwrap()];
    let completed = outcomes.iter().filter(|o| o.is_completed()).count();

    assert_eq!(completed, 1, "outcomes: {:?}", outcomes);

    // The loser was stopped by the in-scope re-check (Failed) or by the
    // advisory check (Rejected); either way the balance never went
    // negative.
    assert_eq!(h.engine.balance(1).await.unwrap(), dec!(40));
    assert_eq!(h.engine.balance(2).await.unwrap(), dec!(60));
    assert!(h.engine.balance(1).await.unwrap() >= Decimal::ZERO);
}

#[tokio::test]
async fn test_many_concurrent_debits_never_overdraw() {
    let h = harness().await;
    seeded_account(&h, 1, dec!(50), "seed-1").await;
    assert!(h.gateway.register(Account::new(2, 2)).await);

    // 20 transfers of 10 against a balance of 50: at most 5 can land.
    let mut handles = vec![];
    for i in 0..20 {
        let engine = h.engine.clone();
        handles.push(tokio::spawn(async move {
            engine.submit(1, 2, dec!(10), &format!("burst-{}", i)).await
        }));
    }

    let mut completed = 0;
    for handle in handles {
        if handle.await.unwrap().is_completed() {
            completed += 1;
        }
    }

    assert_eq!(completed, 5);
    assert_eq!(h.engine.balance(1).await.unwrap(), Decimal::ZERO);
    assert_eq!(h.engine.balance(2).await.unwrap(), dec!(50));
}

// ============================================================================
// PARALLELISM ACROSS SENDERS
// ============================================================================

#[tokio::test]
async fn test_disjoint_senders_proceed_in_parallel() {
    let h = harness().await;
    for id in 1..=10 {
        seeded_account(&h, id, dec!(100), &format!("seed-{}", id)).await;
    }
    assert!(h.gateway.register(Account::new(99, 99)).await);

    let mut handles = vec![];
    for sender in 1..=10u64 {
        let engine = h.engine.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..10 {
                let outcome = engine
                    .submit(sender, 99, dec!(10), &format!("t-{}-{}", sender, i))
                    .await;
                assert!(outcome.is_completed(), "transfer lost: {:?}", outcome);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    for sender in 1..=10u64 {
        assert_eq!(h.engine.balance(sender).await.unwrap(), Decimal::ZERO);
    }
    assert_eq!(h.engine.balance(99).await.unwrap(), dec!(1000));

    // Double entry holds globally: everything nets to zero.
    let mut total = h.engine.balance(SYSTEM).await.unwrap();
    for id in 1..=10u64 {
        total += h.engine.balance(id).await.unwrap();
    }
    total += h.engine.balance(99).await.unwrap();
    assert_eq!(total, Decimal::ZERO);
}
