//! In-memory store for tests, benchmarks and local demos.
//!
//! Transactions are serializable: `begin` takes an exclusive lock on the
//! whole state and keeps a snapshot, which is restored on rollback or when the
//! transaction is dropped without committing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::repository::{LedgerStore, Store, StoreTx, UserStore, WalletStore};
use crate::user::User;
use crate::wallet::{
    Insertion, LedgerEntry, LedgerStatus, NewLedgerEntry, OwnerId, Wallet, WalletError,
    WalletResult,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    wallets: BTreeMap<OwnerId, Wallet>,
    entries: Vec<LedgerEntry>,
    keys: HashMap<String, usize>,
    next_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Failure switches, shared by every transaction and never rolled back
#[derive(Debug, Default)]
struct Faults {
    fail_next_terminal_update: AtomicBool,
}

/// In-memory transactional store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an owner and wallet directly, bypassing the ledger
    pub async fn seed_wallet(&self, owner_id: OwnerId, balance: i64) -> Wallet {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let id = state.next_id();
        let wallet = Wallet {
            id,
            owner_id,
            balance,
            created_at: now,
            updated_at: now,
        };
        state.wallets.insert(owner_id, wallet.clone());
        wallet
    }

    /// Insert a ledger entry in any state, e.g. to simulate an in-flight attempt
    pub async fn seed_entry(&self, entry: NewLedgerEntry, error_code: Option<&str>) -> LedgerEntry {
        let mut state = self.state.lock().await;
        let mut created = insert_entry(&mut state, entry);
        if let Some(code) = error_code {
            created.error_code = Some(code.to_string());
            let index = state.entries.len() - 1;
            state.entries[index].error_code = created.error_code.clone();
        }
        created
    }

    /// Overwrite a wallet's balance outside the ledger, e.g. to simulate a top-up
    pub async fn set_balance(&self, owner_id: OwnerId, balance: i64) -> Option<Wallet> {
        let mut state = self.state.lock().await;
        let wallet = state.wallets.get_mut(&owner_id)?;
        wallet.balance = balance;
        wallet.updated_at = Utc::now();
        Some(wallet.clone())
    }

    /// Current committed wallet of an owner
    pub async fn wallet(&self, owner_id: OwnerId) -> Option<Wallet> {
        self.state.lock().await.wallets.get(&owner_id).cloned()
    }

    /// All committed entries carrying the given idempotency key
    pub async fn entries_for_key(&self, key: &str) -> Vec<LedgerEntry> {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .filter(|e| e.idempotency_key == key)
            .cloned()
            .collect()
    }

    /// All committed entries of a wallet, oldest first
    pub async fn entries_for_wallet(&self, wallet_id: i64) -> Vec<LedgerEntry> {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .filter(|e| e.wallet_id == wallet_id)
            .cloned()
            .collect()
    }

    /// Make the next `update_terminal` call fail with a storage error
    pub fn fail_next_terminal_update(&self) {
        self.faults
            .fail_next_terminal_update
            .store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> WalletResult<MemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = Some((*guard).clone());
        Ok(MemoryTx {
            state: guard,
            snapshot,
            faults: self.faults.clone(),
        })
    }

    async fn health_check(&self) -> WalletResult<()> {
        Ok(())
    }
}

/// An open in-memory transaction
pub struct MemoryTx {
    state: OwnedMutexGuard<MemoryState>,
    snapshot: Option<MemoryState>,
    faults: Arc<Faults>,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.state = snapshot;
        }
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(mut self) -> WalletResult<()> {
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(self) -> WalletResult<()> {
        // Drop restores the snapshot.
        Ok(())
    }
}

#[async_trait]
impl WalletStore for MemoryTx {
    async fn get_by_owner(&mut self, owner_id: OwnerId) -> WalletResult<Wallet> {
        self.state
            .wallets
            .get(&owner_id)
            .cloned()
            .ok_or(WalletError::WalletNotFound(owner_id))
    }

    async fn conditional_decrement(&mut self, owner_id: OwnerId, amount: i64) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        match self.state.wallets.get_mut(&owner_id) {
            Some(wallet) if wallet.balance >= amount => {
                wallet.balance -= amount;
                wallet.updated_at = Utc::now();
                Ok(wallet.balance)
            }
            _ => Err(WalletError::InsufficientFunds {
                owner_id,
                required: amount,
            }),
        }
    }

    async fn create_wallet(&mut self, owner_id: OwnerId, balance: i64) -> WalletResult<Wallet> {
        if self.state.wallets.contains_key(&owner_id) {
            return Err(WalletError::Storage(format!(
                "wallet already exists for user {owner_id}"
            )));
        }

        let now = Utc::now();
        let id = self.state.next_id();
        let wallet = Wallet {
            id,
            owner_id,
            balance,
            created_at: now,
            updated_at: now,
        };
        self.state.wallets.insert(owner_id, wallet.clone());
        Ok(wallet)
    }
}

#[async_trait]
impl LedgerStore for MemoryTx {
    async fn insert_if_absent(&mut self, entry: NewLedgerEntry) -> WalletResult<Insertion> {
        if self.state.keys.contains_key(&entry.idempotency_key) {
            return Ok(Insertion::Conflict);
        }
        Ok(Insertion::Created(insert_entry(&mut self.state, entry)))
    }

    async fn get_by_idempotency_key(&mut self, key: &str) -> WalletResult<LedgerEntry> {
        self.state
            .keys
            .get(key)
            .map(|&index| self.state.entries[index].clone())
            .ok_or_else(|| WalletError::LedgerNotFound(key.to_string()))
    }

    async fn update_terminal(&mut self, entry: &LedgerEntry) -> WalletResult<()> {
        if self
            .faults
            .fail_next_terminal_update
            .swap(false, Ordering::SeqCst)
        {
            return Err(WalletError::Storage("injected terminal update failure".into()));
        }

        let stored = self
            .state
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id && e.status == LedgerStatus::Processing)
            .ok_or_else(|| {
                WalletError::Storage(format!(
                    "ledger entry {} is not awaiting a terminal update",
                    entry.id
                ))
            })?;

        stored.status = entry.status;
        stored.error_code = entry.error_code.clone();
        stored.result_balance = entry.result_balance;
        stored.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryTx {
    async fn create_user(&mut self, name: &str) -> WalletResult<User> {
        let now = Utc::now();
        let id = self.state.next_id();
        let user = User {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.state.users.insert(id, user.clone());
        Ok(user)
    }
}

fn insert_entry(state: &mut MemoryState, entry: NewLedgerEntry) -> LedgerEntry {
    let now = Utc::now();
    let created = LedgerEntry {
        id: state.next_id(),
        idempotency_key: entry.idempotency_key,
        entry_type: entry.entry_type,
        status: entry.status,
        wallet_id: entry.wallet_id,
        amount: entry.amount,
        result_balance: entry.result_balance,
        error_code: None,
        created_at: now,
        updated_at: now,
    };
    state
        .keys
        .insert(created.idempotency_key.clone(), state.entries.len());
    state.entries.push(created.clone());
    created
}
