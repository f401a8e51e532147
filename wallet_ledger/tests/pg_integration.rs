//! Integration tests against PostgreSQL.
//!
//! Require `DATABASE_URL`; every test returns early when it is unset. Tests
//! share tables and run serially.

use std::sync::Arc;

use serial_test::serial;
use wallet_ledger::db::{Database, DatabaseConfig, PgStore};
use wallet_ledger::user::{CreateUserRequest, UserManager};
use wallet_ledger::wallet::{WalletConfig, WalletError, WalletManager, WithdrawRequest};

/// Helper to create a migrated, empty test database
async fn setup_test_db() -> Option<Database> {
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let config = DatabaseConfig {
        database_url,
        max_connections: 10,
        min_connections: 1,
        connection_timeout_secs: 5,
        idle_timeout_secs: 300,
        max_lifetime_secs: 1800,
    };

    let db = Database::new(&config)
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to run migrations");

    sqlx::query("TRUNCATE ledger_entries, wallets, users RESTART IDENTITY CASCADE")
        .execute(db.pool())
        .await
        .expect("Failed to reset tables");

    Some(db)
}

/// Helper to create a user with an opening balance
async fn create_account(db: &Database, balance: i64) -> i64 {
    UserManager::new(db.store())
        .create_user(CreateUserRequest {
            name: "pg-test".to_string(),
            balance,
        })
        .await
        .expect("Failed to create user")
        .user
        .id
}

async fn count_entries(db: &Database, key: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entries WHERE idempotency_key = $1")
        .bind(key)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn test_pg_health_check() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    db.health_check().await.expect("Health check failed");
    db.close().await;
}

#[tokio::test]
#[serial]
async fn test_pg_withdraw_and_replay() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let user_id = create_account(&db, 100_000).await;
    let wallets = WalletManager::new(db.store(), WalletConfig::default());

    let first = wallets
        .withdraw(WithdrawRequest::new(user_id, "pg-k1", 30_000))
        .await
        .unwrap();
    let second = wallets
        .withdraw(WithdrawRequest::new(user_id, "pg-k1", 30_000))
        .await
        .unwrap();

    assert_eq!(first.balance, 70_000);
    assert_eq!(second.balance, 70_000);
    assert!(second.replayed);
    assert_eq!(wallets.get_balance(user_id).await.unwrap(), 70_000);
    assert_eq!(count_entries(&db, "pg-k1").await, 1);

    let err = wallets
        .withdraw(WithdrawRequest::new(user_id, "pg-k1", 10_000))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::IdempotencyKeyReused(_)));
}

#[tokio::test]
#[serial]
async fn test_pg_insufficient_funds_is_recorded() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let user_id = create_account(&db, 50_000).await;
    let wallets = WalletManager::new(db.store(), WalletConfig::default());

    let err = wallets
        .withdraw(WithdrawRequest::new(user_id, "pg-big", 60_000))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientFunds { .. }));

    let (status, code, balance): (String, Option<String>, Option<i64>) = sqlx::query_as(
        "SELECT status, error_code, result_balance FROM ledger_entries WHERE idempotency_key = $1",
    )
    .bind("pg-big")
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(status, "FAILED");
    assert_eq!(code.as_deref(), Some("INSUFFICIENT_FUND"));
    assert_eq!(balance, Some(50_000));
    assert_eq!(wallets.get_balance(user_id).await.unwrap(), 50_000);
}

#[tokio::test]
#[serial]
async fn test_pg_concurrent_withdrawals() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let user_id = create_account(&db, 100_000).await;
    let wallets: Arc<WalletManager<PgStore>> =
        Arc::new(WalletManager::new(db.store(), WalletConfig::default()));

    let a = {
        let wallets = wallets.clone();
        tokio::spawn(async move {
            wallets
                .withdraw(WithdrawRequest::new(user_id, "pg-c1", 80_000))
                .await
        })
    };
    let b = {
        let wallets = wallets.clone();
        tokio::spawn(async move {
            wallets
                .withdraw(WithdrawRequest::new(user_id, "pg-c2", 80_000))
                .await
        })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let insufficient = results
        .iter()
        .filter(|r| matches!(r, Err(WalletError::InsufficientFunds { .. })))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(insufficient, 1);
    assert_eq!(wallets.get_balance(user_id).await.unwrap(), 20_000);
}

#[tokio::test]
#[serial]
async fn test_pg_concurrent_same_key() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let user_id = create_account(&db, 10_000).await;
    let wallets = Arc::new(WalletManager::new(db.store(), WalletConfig::default()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let wallets = wallets.clone();
            tokio::spawn(async move {
                wallets
                    .withdraw(WithdrawRequest::new(user_id, "pg-same", 1_000))
                    .await
            })
        })
        .collect();

    for handle in handles {
        match handle.await.unwrap() {
            Ok(withdrawal) => assert_eq!(withdrawal.balance, 9_000),
            // A racing retry may observe the first attempt before it resolves.
            Err(err) => assert!(err.is_retryable(), "unexpected error: {err}"),
        }
    }

    assert_eq!(wallets.get_balance(user_id).await.unwrap(), 9_000);
    assert_eq!(count_entries(&db, "pg-same").await, 1);
}

#[tokio::test]
#[serial]
async fn test_pg_missing_wallet() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let wallets = WalletManager::new(db.store(), WalletConfig::default());

    let err = wallets
        .withdraw(WithdrawRequest::new(999_999, "pg-ghost", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::WalletNotFound(999_999)));
    assert_eq!(count_entries(&db, "pg-ghost").await, 0);
}

#[tokio::test]
#[serial]
async fn test_pg_zero_balance_account_has_no_entries() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let user_id = create_account(&db, 0).await;

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM ledger_entries l JOIN wallets w ON w.id = l.wallet_id WHERE w.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(count, 0);
}
