//! Store trait definitions for testability and dependency injection.
//!
//! Every balance or ledger operation runs against a transaction handle
//! obtained from a [`Store`]. The wallet, ledger and user contracts are
//! implemented by that handle, so a single transaction spans all of them and
//! commits or rolls back as one unit.

use async_trait::async_trait;

use crate::user::User;
use crate::wallet::{Insertion, LedgerEntry, NewLedgerEntry, OwnerId, Wallet, WalletResult};

/// Wallet rows, scoped to the enclosing transaction
#[async_trait]
pub trait WalletStore: Send {
    /// Point lookup by owner
    ///
    /// # Errors
    ///
    /// * `WalletError::WalletNotFound` - Owner has no wallet
    async fn get_by_owner(&mut self, owner_id: OwnerId) -> WalletResult<Wallet>;

    /// Decrement the balance by `amount` only if the balance covers it
    ///
    /// Check and mutation are a single atomic statement, so concurrent callers
    /// can never drive the balance below zero.
    ///
    /// # Returns
    ///
    /// * `WalletResult<i64>` - Balance after the decrement
    ///
    /// # Errors
    ///
    /// * `WalletError::InvalidAmount` - `amount <= 0`, rejected before any I/O
    /// * `WalletError::InsufficientFunds` - Guard did not hold (no row matched)
    async fn conditional_decrement(&mut self, owner_id: OwnerId, amount: i64) -> WalletResult<i64>;

    /// Create the owner's wallet with an opening balance
    async fn create_wallet(&mut self, owner_id: OwnerId, balance: i64) -> WalletResult<Wallet>;
}

/// Ledger entry rows, scoped to the enclosing transaction
#[async_trait]
pub trait LedgerStore: Send {
    /// Insert a new entry unless its idempotency key already exists
    ///
    /// A duplicate key yields [`Insertion::Conflict`] without writing anything.
    async fn insert_if_absent(&mut self, entry: NewLedgerEntry) -> WalletResult<Insertion>;

    /// Point lookup by idempotency key
    ///
    /// # Errors
    ///
    /// * `WalletError::LedgerNotFound` - No entry with that key
    async fn get_by_idempotency_key(&mut self, key: &str) -> WalletResult<LedgerEntry>;

    /// Persist the terminal state (status, error code, result balance) of an entry
    ///
    /// Must be called at most once per entry, moving it out of `PROCESSING`.
    async fn update_terminal(&mut self, entry: &LedgerEntry) -> WalletResult<()>;
}

/// User rows, scoped to the enclosing transaction
#[async_trait]
pub trait UserStore: Send {
    /// Create a new user
    async fn create_user(&mut self, name: &str) -> WalletResult<User>;
}

/// An open store transaction
#[async_trait]
pub trait StoreTx: WalletStore + LedgerStore + UserStore + Send + Sized + 'static {
    /// Make every write of this transaction visible
    async fn commit(self) -> WalletResult<()>;

    /// Discard every write of this transaction
    async fn rollback(self) -> WalletResult<()>;
}

/// Transactional backing store
///
/// Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: StoreTx;

    /// Begin a new transaction
    async fn begin(&self) -> WalletResult<Self::Tx>;

    /// Check that the store is reachable
    async fn health_check(&self) -> WalletResult<()>;
}
