//! Wallet manager implementation: idempotent withdrawals over a transactional store.
//!
//! A withdrawal is one store transaction that records a `PROCESSING` ledger
//! entry, applies the guarded decrement and resolves the entry. The ledger's
//! unique idempotency key is the only concurrency primitive: when the insert
//! reports a conflict, the transaction is abandoned and the previously
//! recorded outcome is replayed instead of executing the decrement again.

use log::{debug, error, info, warn};

use super::{
    config::WalletConfig,
    errors::{WalletError, WalletResult},
    models::{
        INSUFFICIENT_FUND_CODE, Insertion, LedgerEntry, LedgerStatus, LedgerType,
        NewLedgerEntry, OwnerId, Wallet, WithdrawRequest, Withdrawal,
    },
};
use crate::db::{LedgerStore, PgStore, Store, StoreTx, WalletStore, timeouts::with_timeout};

/// Outcome of one withdrawal transaction
#[derive(Debug)]
enum Attempt {
    /// Committed with a `SUCCEED` entry
    Completed(Withdrawal),
    /// Committed with a `FAILED` entry; the error goes back to the caller
    Rejected(WalletError),
    /// The key is already recorded; rolled back without side effects
    Duplicate { wallet_id: i64 },
}

/// Wallet manager
#[derive(Clone)]
pub struct WalletManager<S: Store = PgStore> {
    store: S,
    config: WalletConfig,
}

impl<S: Store> WalletManager<S> {
    /// Create a new wallet manager
    ///
    /// # Arguments
    ///
    /// * `store` - Transactional store holding wallets and the ledger
    /// * `config` - Timeouts for withdrawals and lookups
    pub fn new(store: S, config: WalletConfig) -> Self {
        Self { store, config }
    }

    /// Get wallet for a user
    ///
    /// # Errors
    ///
    /// * `WalletError::WalletNotFound` - User has no wallet
    pub async fn get_wallet(&self, owner_id: OwnerId) -> WalletResult<Wallet> {
        with_timeout(self.config.query_timeout, async {
            let mut tx = self.store.begin().await?;
            let wallet = tx.get_by_owner(owner_id).await;
            tx.rollback().await?;
            wallet
        })
        .await
    }

    /// Get wallet balance for a user
    pub async fn get_balance(&self, owner_id: OwnerId) -> WalletResult<i64> {
        Ok(self.get_wallet(owner_id).await?.balance)
    }

    /// Withdraw from a user's wallet, at most once per idempotency key
    ///
    /// Retrying with the same key and amount returns the recorded outcome of
    /// the first attempt and never deducts twice.
    ///
    /// # Arguments
    ///
    /// * `request` - Owner, idempotency key and amount
    ///
    /// # Returns
    ///
    /// * `WalletResult<Withdrawal>` - Amount withdrawn and the resulting balance
    ///
    /// # Errors
    ///
    /// * `WalletError::InvalidAmount` - Amount is not positive
    /// * `WalletError::InvalidIdempotencyKey` - Key is blank
    /// * `WalletError::WalletNotFound` - User has no wallet
    /// * `WalletError::InsufficientFunds` - Balance does not cover the amount (recorded in the ledger)
    /// * `WalletError::IdempotencyKeyReused` - Key already used for a different request
    /// * `WalletError::RequestInProgress` - An attempt with this key is still unresolved
    /// * `WalletError::WithdrawFailed` - An earlier attempt with this key failed
    /// * `WalletError::Timeout` - Attempt cancelled before commit
    pub async fn withdraw(&self, request: WithdrawRequest) -> WalletResult<Withdrawal> {
        if request.amount <= 0 {
            return Err(WalletError::InvalidAmount(request.amount));
        }
        if request.idempotency_key.trim().is_empty() {
            return Err(WalletError::InvalidIdempotencyKey);
        }

        debug!(
            "Withdrawal {} for user {}: amount {}",
            request.idempotency_key, request.owner_id, request.amount
        );

        let attempt =
            with_timeout(self.config.transaction_timeout, self.attempt_withdrawal(&request))
                .await?;

        match attempt {
            Attempt::Completed(withdrawal) => Ok(withdrawal),
            Attempt::Rejected(err) => Err(err),
            Attempt::Duplicate { wallet_id } => {
                with_timeout(
                    self.config.query_timeout,
                    self.resolve_replay(&request, wallet_id),
                )
                .await
            }
        }
    }

    /// Run one withdrawal transaction and settle it
    async fn attempt_withdrawal(&self, request: &WithdrawRequest) -> WalletResult<Attempt> {
        let mut tx = self.store.begin().await?;

        match Self::run_withdrawal(&mut tx, request).await {
            Ok(attempt @ Attempt::Duplicate { .. }) => {
                tx.rollback().await?;
                Ok(attempt)
            }
            Ok(attempt) => {
                tx.commit().await?;
                Ok(attempt)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        "Rollback of withdrawal {} failed: {}",
                        request.idempotency_key, rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    async fn run_withdrawal(tx: &mut S::Tx, request: &WithdrawRequest) -> WalletResult<Attempt> {
        let wallet = tx.get_by_owner(request.owner_id).await?;

        let entry = NewLedgerEntry::withdrawal(&request.idempotency_key, wallet.id, request.amount);
        let mut entry = match tx.insert_if_absent(entry).await? {
            Insertion::Created(entry) => entry,
            Insertion::Conflict => {
                return Ok(Attempt::Duplicate {
                    wallet_id: wallet.id,
                });
            }
        };

        match tx
            .conditional_decrement(request.owner_id, request.amount)
            .await
        {
            Ok(balance) => {
                entry.succeed(balance);
                tx.update_terminal(&entry).await?;
                Ok(Attempt::Completed(Withdrawal {
                    owner_id: request.owner_id,
                    amount: request.amount,
                    balance,
                    replayed: false,
                }))
            }
            Err(err @ WalletError::InsufficientFunds { .. }) => {
                // Recorded and committed so a retry of this key sees the failure.
                entry.fail(INSUFFICIENT_FUND_CODE, wallet.balance);
                tx.update_terminal(&entry).await?;
                info!(
                    "Withdrawal {} rejected: user {} has {} of {}",
                    request.idempotency_key, request.owner_id, wallet.balance, request.amount
                );
                Ok(Attempt::Rejected(err))
            }
            Err(err) => Err(err),
        }
    }

    /// Look up the recorded entry for a duplicate key, outside the abandoned transaction
    async fn resolve_replay(&self, request: &WithdrawRequest, wallet_id: i64) -> WalletResult<Withdrawal> {
        let mut tx = self.store.begin().await?;
        let lookup = tx.get_by_idempotency_key(&request.idempotency_key).await;
        tx.rollback().await?;

        let entry = lookup.inspect_err(|err| {
            if matches!(err, WalletError::LedgerNotFound(_)) {
                error!(
                    "Ledger conflict on {} but no entry found; ledger is inconsistent",
                    request.idempotency_key
                );
            }
        })?;

        info!(
            "Replaying withdrawal {} for user {}: entry {} is {}",
            request.idempotency_key, request.owner_id, entry.id, entry.status
        );

        resolve_entry(&entry, request, wallet_id)
    }
}

/// Map a previously recorded entry to the outcome a replay must return
fn resolve_entry(
    entry: &LedgerEntry,
    request: &WithdrawRequest,
    wallet_id: i64,
) -> WalletResult<Withdrawal> {
    let key = &request.idempotency_key;

    if entry.amount != request.amount
        || entry.entry_type != LedgerType::Withdraw
        || entry.wallet_id != wallet_id
    {
        return Err(WalletError::IdempotencyKeyReused(key.clone()));
    }

    match entry.status {
        LedgerStatus::Succeed => match entry.result_balance {
            Some(balance) => Ok(Withdrawal {
                owner_id: request.owner_id,
                amount: request.amount,
                balance,
                replayed: true,
            }),
            None => Err(WalletError::RequestInProgress(key.clone())),
        },
        LedgerStatus::Failed => match entry.error_code.as_deref() {
            Some(INSUFFICIENT_FUND_CODE) => Err(WalletError::InsufficientFunds {
                owner_id: request.owner_id,
                required: request.amount,
            }),
            code => Err(WalletError::WithdrawFailed {
                key: key.clone(),
                code: code.unwrap_or("UNKNOWN").to_string(),
            }),
        },
        LedgerStatus::Processing => Err(WalletError::RequestInProgress(key.clone())),
    }
}
