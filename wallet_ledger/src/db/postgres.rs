//! PostgreSQL implementation of the store contracts.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::repository::{LedgerStore, Store, StoreTx, UserStore, WalletStore};
use crate::user::User;
use crate::wallet::{
    Insertion, LedgerEntry, NewLedgerEntry, OwnerId, Wallet, WalletError, WalletResult,
};

const LEDGER_COLUMNS: &str = "id, idempotency_key, entry_type, status, wallet_id, amount, \
     result_balance, error_code, created_at, updated_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store on top of an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> WalletResult<PgTx> {
        let inner = self.pool.begin().await?;
        Ok(PgTx { inner })
    }

    async fn health_check(&self) -> WalletResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// An open PostgreSQL transaction
///
/// Rolled back by sqlx when dropped before [`StoreTx::commit`].
pub struct PgTx {
    inner: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self) -> WalletResult<()> {
        self.inner.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> WalletResult<()> {
        self.inner.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl WalletStore for PgTx {
    async fn get_by_owner(&mut self, owner_id: OwnerId) -> WalletResult<Wallet> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, balance, created_at, updated_at
            FROM wallets
            WHERE user_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&mut *self.inner)
        .await?
        .ok_or(WalletError::WalletNotFound(owner_id))?;

        Ok(wallet_from_row(&row))
    }

    async fn conditional_decrement(&mut self, owner_id: OwnerId, amount: i64) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        // Guard and mutation in one statement; the row lock taken here
        // serializes concurrent decrements of the same wallet.
        let row = sqlx::query(
            "UPDATE wallets
             SET balance = balance - $1, updated_at = NOW()
             WHERE user_id = $2 AND balance >= $1
             RETURNING balance",
        )
        .bind(amount)
        .bind(owner_id)
        .fetch_optional(&mut *self.inner)
        .await?;

        match row {
            Some(row) => Ok(row.get("balance")),
            None => Err(WalletError::InsufficientFunds {
                owner_id,
                required: amount,
            }),
        }
    }

    async fn create_wallet(&mut self, owner_id: OwnerId, balance: i64) -> WalletResult<Wallet> {
        let row = sqlx::query(
            r#"
            INSERT INTO wallets (user_id, balance)
            VALUES ($1, $2)
            RETURNING id, user_id, balance, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(balance)
        .fetch_one(&mut *self.inner)
        .await?;

        Ok(wallet_from_row(&row))
    }
}

#[async_trait]
impl LedgerStore for PgTx {
    async fn insert_if_absent(&mut self, entry: NewLedgerEntry) -> WalletResult<Insertion> {
        // ON CONFLICT DO NOTHING keeps the transaction usable on a duplicate key
        // and waits for an in-flight insert of the same key to resolve first.
        let query = format!(
            "INSERT INTO ledger_entries (idempotency_key, entry_type, status, wallet_id, amount, result_balance)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (idempotency_key) DO NOTHING
             RETURNING {LEDGER_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(&entry.idempotency_key)
            .bind(entry.entry_type.as_str())
            .bind(entry.status.as_str())
            .bind(entry.wallet_id)
            .bind(entry.amount)
            .bind(entry.result_balance)
            .fetch_optional(&mut *self.inner)
            .await?;

        match row {
            Some(row) => Ok(Insertion::Created(ledger_from_row(&row)?)),
            None => Ok(Insertion::Conflict),
        }
    }

    async fn get_by_idempotency_key(&mut self, key: &str) -> WalletResult<LedgerEntry> {
        let query = format!("SELECT {LEDGER_COLUMNS} FROM ledger_entries WHERE idempotency_key = $1");

        let row = sqlx::query(&query)
            .bind(key)
            .fetch_optional(&mut *self.inner)
            .await?
            .ok_or_else(|| WalletError::LedgerNotFound(key.to_string()))?;

        ledger_from_row(&row)
    }

    async fn update_terminal(&mut self, entry: &LedgerEntry) -> WalletResult<()> {
        let result = sqlx::query(
            "UPDATE ledger_entries
             SET status = $1, error_code = $2, result_balance = $3, updated_at = NOW()
             WHERE id = $4 AND status = 'PROCESSING'",
        )
        .bind(entry.status.as_str())
        .bind(entry.error_code.as_deref())
        .bind(entry.result_balance)
        .bind(entry.id)
        .execute(&mut *self.inner)
        .await?;

        if result.rows_affected() != 1 {
            return Err(WalletError::Storage(format!(
                "ledger entry {} is not awaiting a terminal update",
                entry.id
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl UserStore for PgTx {
    async fn create_user(&mut self, name: &str) -> WalletResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (name) VALUES ($1) RETURNING id, name, created_at, updated_at",
        )
        .bind(name)
        .fetch_one(&mut *self.inner)
        .await?;

        Ok(User {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
        })
    }
}

fn wallet_from_row(row: &PgRow) -> Wallet {
    Wallet {
        id: row.get("id"),
        owner_id: row.get("user_id"),
        balance: row.get("balance"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
    }
}

fn ledger_from_row(row: &PgRow) -> WalletResult<LedgerEntry> {
    Ok(LedgerEntry {
        id: row.get("id"),
        idempotency_key: row.get("idempotency_key"),
        entry_type: row.get::<String, _>("entry_type").parse()?,
        status: row.get::<String, _>("status").parse()?,
        wallet_id: row.get("wallet_id"),
        amount: row.get("amount"),
        result_balance: row.get("result_balance"),
        error_code: row.get("error_code"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
    })
}
