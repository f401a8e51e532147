//! Wallet module providing idempotent withdrawals backed by an append-only ledger.
//!
//! This module implements:
//! - Guarded balance decrements that never drive a balance below zero
//! - Ledger entries keyed by a client-supplied idempotency key
//! - Replay of a previously recorded outcome when a key is retried
//! - Per-attempt timeouts with rollback on cancellation
//!
//! ## Example
//!
//! ```no_run
//! use wallet_ledger::db::{Database, DatabaseConfig};
//! use wallet_ledger::wallet::{WalletConfig, WalletManager, WithdrawRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::development()).await?;
//!     let wallets = WalletManager::new(db.store(), WalletConfig::default());
//!
//!     let withdrawal = wallets
//!         .withdraw(WithdrawRequest::new(1, "order-1234", 5000))
//!         .await?;
//!     println!("New balance after withdrawal: {}", withdrawal.balance);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod manager;
pub mod models;

pub use config::WalletConfig;
pub use errors::{WalletError, WalletResult};
pub use manager::WalletManager;
pub use models::{
    INSUFFICIENT_FUND_CODE, Insertion, LedgerEntry, LedgerStatus, LedgerType, NewLedgerEntry,
    OwnerId, Wallet, WithdrawRequest, Withdrawal,
};
