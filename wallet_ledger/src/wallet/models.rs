//! Wallet and ledger data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::WalletError;

/// Owner (user) ID type
pub type OwnerId = i64;

/// Error code recorded on ledger entries that failed the sufficiency guard.
pub const INSUFFICIENT_FUND_CODE: &str = "INSUFFICIENT_FUND";

/// Wallet model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub owner_id: OwnerId,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerType {
    Init,
    Withdraw,
}

impl LedgerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerType::Init => "INIT",
            LedgerType::Withdraw => "WITHDRAW",
        }
    }
}

impl std::fmt::Display for LedgerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerType {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INIT" => Ok(LedgerType::Init),
            "WITHDRAW" => Ok(LedgerType::Withdraw),
            other => Err(WalletError::Storage(format!("unknown ledger type {other:?}"))),
        }
    }
}

/// Ledger entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerStatus {
    Processing,
    Succeed,
    Failed,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Processing => "PROCESSING",
            LedgerStatus::Succeed => "SUCCEED",
            LedgerStatus::Failed => "FAILED",
        }
    }

    /// Whether the entry has reached its final state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LedgerStatus::Processing)
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerStatus {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(LedgerStatus::Processing),
            "SUCCEED" => Ok(LedgerStatus::Succeed),
            "FAILED" => Ok(LedgerStatus::Failed),
            other => Err(WalletError::Storage(format!(
                "unknown ledger status {other:?}"
            ))),
        }
    }
}

/// Ledger entry model (append-only history of balance changes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub idempotency_key: String,
    pub entry_type: LedgerType,
    pub status: LedgerStatus,
    pub wallet_id: i64,
    pub amount: i64,
    pub result_balance: Option<i64>,
    pub error_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Resolve the entry as succeeded with the post-mutation balance.
    pub fn succeed(&mut self, balance: i64) {
        self.status = LedgerStatus::Succeed;
        self.result_balance = Some(balance);
        self.error_code = None;
    }

    /// Resolve the entry as failed, keeping the balance observed by the attempt.
    pub fn fail(&mut self, error_code: &str, balance: i64) {
        self.status = LedgerStatus::Failed;
        self.result_balance = Some(balance);
        self.error_code = Some(error_code.to_string());
    }
}

/// Ledger entry to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub idempotency_key: String,
    pub entry_type: LedgerType,
    pub status: LedgerStatus,
    pub wallet_id: i64,
    pub amount: i64,
    pub result_balance: Option<i64>,
}

impl NewLedgerEntry {
    /// A withdrawal attempt, created in `PROCESSING`.
    pub fn withdrawal(idempotency_key: impl Into<String>, wallet_id: i64, amount: i64) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            entry_type: LedgerType::Withdraw,
            status: LedgerStatus::Processing,
            wallet_id,
            amount,
            result_balance: None,
        }
    }

    /// The opening deposit of a freshly created wallet. Already resolved.
    pub fn initial_deposit(idempotency_key: impl Into<String>, wallet_id: i64, amount: i64) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            entry_type: LedgerType::Init,
            status: LedgerStatus::Succeed,
            wallet_id,
            amount,
            result_balance: Some(amount),
        }
    }
}

/// Outcome of an insert-if-absent on the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// The entry was created
    Created(LedgerEntry),
    /// An entry with the same idempotency key already exists; nothing was written
    Conflict,
}

/// Withdrawal request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub owner_id: OwnerId,
    pub idempotency_key: String,
    pub amount: i64,
}

impl WithdrawRequest {
    pub fn new(owner_id: OwnerId, idempotency_key: impl Into<String>, amount: i64) -> Self {
        Self {
            owner_id,
            idempotency_key: idempotency_key.into(),
            amount,
        }
    }
}

/// Result of a withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub owner_id: OwnerId,
    pub amount: i64,
    pub balance: i64,
    /// True when the result was reproduced from a previously recorded entry
    pub replayed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_type_round_trips_through_str() {
        for entry_type in [LedgerType::Init, LedgerType::Withdraw] {
            assert_eq!(entry_type.as_str().parse::<LedgerType>().unwrap(), entry_type);
        }
        assert!("DEPOSIT".parse::<LedgerType>().is_err());
    }

    #[test]
    fn test_ledger_status_parse_rejects_lowercase() {
        assert_eq!(
            "PROCESSING".parse::<LedgerStatus>().unwrap(),
            LedgerStatus::Processing
        );
        assert!("succeed".parse::<LedgerStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!LedgerStatus::Processing.is_terminal());
        assert!(LedgerStatus::Succeed.is_terminal());
        assert!(LedgerStatus::Failed.is_terminal());
    }

    #[test]
    fn test_new_withdrawal_entry_starts_processing() {
        let entry = NewLedgerEntry::withdrawal("k1", 7, 300);
        assert_eq!(entry.entry_type, LedgerType::Withdraw);
        assert_eq!(entry.status, LedgerStatus::Processing);
        assert_eq!(entry.result_balance, None);
    }

    #[test]
    fn test_initial_deposit_is_resolved() {
        let entry = NewLedgerEntry::initial_deposit("init", 7, 5000);
        assert_eq!(entry.status, LedgerStatus::Succeed);
        assert_eq!(entry.result_balance, Some(5000));
    }

    #[test]
    fn test_fail_records_error_code_and_balance() {
        let now = Utc::now();
        let mut entry = LedgerEntry {
            id: 1,
            idempotency_key: "k".to_string(),
            entry_type: LedgerType::Withdraw,
            status: LedgerStatus::Processing,
            wallet_id: 1,
            amount: 60_000,
            result_balance: None,
            error_code: None,
            created_at: now,
            updated_at: now,
        };

        entry.fail(INSUFFICIENT_FUND_CODE, 50_000);
        assert_eq!(entry.status, LedgerStatus::Failed);
        assert_eq!(entry.error_code.as_deref(), Some("INSUFFICIENT_FUND"));
        assert_eq!(entry.result_balance, Some(50_000));
    }
}
