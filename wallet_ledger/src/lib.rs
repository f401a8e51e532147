//! # Wallet Ledger
//!
//! Idempotent wallet withdrawals backed by an append-only ledger.
//!
//! Every withdrawal carries a client-supplied idempotency key. The first
//! attempt under a key records a ledger entry, applies a guarded balance
//! decrement and resolves the entry in one transaction; every later attempt
//! with the same key replays the recorded outcome instead of executing again.
//! A balance never goes below zero, and concurrent withdrawals against the
//! same wallet are serialized by the store.
//!
//! ## Core Modules
//!
//! - [`wallet`]: Withdrawal engine, ledger models and errors
//! - [`user`]: Account creation (user, wallet and opening entry)
//! - [`db`]: Connection pool, store traits, PostgreSQL and in-memory stores
//!
//! ## Example
//!
//! ```
//! use wallet_ledger::db::MemoryStore;
//! use wallet_ledger::wallet::{WalletConfig, WalletManager, WithdrawRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = MemoryStore::new();
//! store.seed_wallet(1, 1_000).await;
//!
//! let wallets = WalletManager::new(store, WalletConfig::default());
//! let first = wallets.withdraw(WithdrawRequest::new(1, "k1", 300)).await.unwrap();
//! let retry = wallets.withdraw(WithdrawRequest::new(1, "k1", 300)).await.unwrap();
//! assert_eq!(first.balance, 700);
//! assert_eq!(retry.balance, 700);
//! # }
//! ```

/// Connection pool, store contracts and store implementations.
pub mod db;

/// Account creation.
pub mod user;

/// Withdrawal engine and ledger.
pub mod wallet;

pub use db::{Database, DatabaseConfig, MemoryStore, PgStore, Store};
pub use user::{UserError, UserManager};
pub use wallet::{WalletConfig, WalletError, WalletManager, WithdrawRequest, Withdrawal};
