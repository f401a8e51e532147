use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Runtime;
use wallet_ledger::db::MemoryStore;
use wallet_ledger::wallet::{WalletConfig, WalletManager, WithdrawRequest};

/// Helper to create a manager over a wallet that will not run dry during a run
fn setup_manager(rt: &Runtime, owners: i64) -> WalletManager<MemoryStore> {
    let store = MemoryStore::new();
    rt.block_on(async {
        for owner in 1..=owners {
            store.seed_wallet(owner, i64::MAX / 2).await;
        }
    });
    WalletManager::new(store, WalletConfig::default())
}

/// Benchmark a first-time withdrawal (insert, decrement, resolve)
fn bench_fresh_withdrawal(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let wallets = setup_manager(&rt, 1);
    let counter = AtomicU64::new(0);

    c.bench_function("withdraw_fresh_key", |b| {
        b.iter(|| {
            let key = format!("fresh-{}", counter.fetch_add(1, Ordering::Relaxed));
            rt.block_on(wallets.withdraw(black_box(WithdrawRequest::new(1, key, 10))))
                .unwrap()
        });
    });
}

/// Benchmark a retry that resolves from the ledger
fn bench_replayed_withdrawal(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let wallets = setup_manager(&rt, 1);
    rt.block_on(wallets.withdraw(WithdrawRequest::new(1, "replayed", 10)))
        .unwrap();

    c.bench_function("withdraw_replay", |b| {
        b.iter(|| {
            rt.block_on(wallets.withdraw(black_box(WithdrawRequest::new(1, "replayed", 10))))
                .unwrap()
        });
    });
}

/// Benchmark concurrent withdrawals spread over several wallets
fn bench_concurrent_withdrawals(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("withdraw_concurrent");
    let counter = AtomicU64::new(0);

    for tasks in [4i64, 16, 64] {
        let wallets = setup_manager(&rt, tasks);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{tasks}_tasks")),
            &tasks,
            |b, &tasks| {
                b.iter(|| {
                    rt.block_on(async {
                        let handles: Vec<_> = (1..=tasks)
                            .map(|owner| {
                                let wallets = wallets.clone();
                                let key =
                                    format!("c-{}", counter.fetch_add(1, Ordering::Relaxed));
                                tokio::spawn(async move {
                                    wallets.withdraw(WithdrawRequest::new(owner, key, 1)).await
                                })
                            })
                            .collect();
                        for handle in handles {
                            handle.await.unwrap().unwrap();
                        }
                    });
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    withdrawals,
    bench_fresh_withdrawal,
    bench_replayed_withdrawal,
    bench_concurrent_withdrawals,
);

criterion_main!(withdrawals);
