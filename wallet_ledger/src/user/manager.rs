//! User manager implementation.

use log::info;
use uuid::Uuid;

use super::{
    errors::{UserError, UserResult},
    models::{CreateUserRequest, MAX_NAME_LENGTH, UserAccount},
};
use crate::db::{LedgerStore, PgStore, Store, StoreTx, UserStore, WalletStore};
use crate::wallet::{Insertion, NewLedgerEntry, WalletError};

/// User manager
#[derive(Clone)]
pub struct UserManager<S: Store = PgStore> {
    store: S,
}

impl<S: Store> UserManager<S> {
    /// Create a new user manager
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a user with a funded wallet
    ///
    /// The user row, the wallet and the `INIT` ledger entry for the opening
    /// balance are written in one transaction. A zero opening balance writes
    /// no ledger entry.
    ///
    /// # Errors
    ///
    /// * `UserError::InvalidName` - Name is blank or longer than 255 characters
    /// * `UserError::InvalidBalance` - Opening balance is negative
    /// * `UserError::Store` - Any store failure; nothing is committed
    pub async fn create_user(&self, request: CreateUserRequest) -> UserResult<UserAccount> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(UserError::InvalidName("name must not be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(UserError::InvalidName(format!(
                "name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }
        if request.balance < 0 {
            return Err(UserError::InvalidBalance(request.balance));
        }

        let mut tx = self.store.begin().await?;
        let user = tx.create_user(name).await?;
        let wallet = tx.create_wallet(user.id, request.balance).await?;

        if request.balance > 0 {
            let key = format!("init-{}", Uuid::new_v4());
            let entry = NewLedgerEntry::initial_deposit(key, wallet.id, request.balance);
            if let Insertion::Conflict = tx.insert_if_absent(entry).await? {
                return Err(WalletError::Storage(
                    "generated opening entry key already exists".to_string(),
                )
                .into());
            }
        }

        tx.commit().await?;

        info!(
            "Created user {} with wallet {} and balance {}",
            user.id, wallet.id, wallet.balance
        );

        Ok(UserAccount { user, wallet })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::wallet::{LedgerStatus, LedgerType};

    fn request(name: &str, balance: i64) -> CreateUserRequest {
        CreateUserRequest {
            name: name.to_string(),
            balance,
        }
    }

    #[tokio::test]
    async fn test_create_user_with_opening_balance() {
        let store = MemoryStore::new();
        let users = UserManager::new(store.clone());

        let account = users.create_user(request("alice", 100_000)).await.unwrap();
        assert_eq!(account.user.name, "alice");
        assert_eq!(account.wallet.owner_id, account.user.id);
        assert_eq!(account.wallet.balance, 100_000);

        let entries = store.entries_for_wallet(account.wallet.id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, LedgerType::Init);
        assert_eq!(entries[0].status, LedgerStatus::Succeed);
        assert_eq!(entries[0].result_balance, Some(100_000));
        assert!(entries[0].idempotency_key.starts_with("init-"));
    }

    #[tokio::test]
    async fn test_zero_balance_writes_no_entry() {
        let store = MemoryStore::new();
        let users = UserManager::new(store.clone());

        let account = users.create_user(request("bob", 0)).await.unwrap();
        assert_eq!(account.wallet.balance, 0);
        assert!(store.entries_for_wallet(account.wallet.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_name_is_trimmed() {
        let users = UserManager::new(MemoryStore::new());
        let account = users.create_user(request("  carol ", 10)).await.unwrap();
        assert_eq!(account.user.name, "carol");
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let store = MemoryStore::new();
        let users = UserManager::new(store.clone());

        assert!(matches!(
            users.create_user(request("   ", 10)).await,
            Err(UserError::InvalidName(_))
        ));
        assert!(matches!(
            users.create_user(request(&"x".repeat(256), 10)).await,
            Err(UserError::InvalidName(_))
        ));
        assert!(matches!(
            users.create_user(request("dave", -1)).await,
            Err(UserError::InvalidBalance(-1))
        ));
    }
}
