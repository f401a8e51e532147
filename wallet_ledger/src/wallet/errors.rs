//! Wallet error types.

use std::time::Duration;
use thiserror::Error;

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid amount (must be positive)
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// Idempotency key missing or blank
    #[error("Invalid idempotency key")]
    InvalidIdempotencyKey,

    /// Wallet not found
    #[error("Wallet not found for user {0}")]
    WalletNotFound(i64),

    /// Ledger entry not found
    #[error("Ledger entry not found for idempotency key {0}")]
    LedgerNotFound(String),

    /// Sufficiency guard did not hold
    #[error("Insufficient funds: user {owner_id} cannot withdraw {required}")]
    InsufficientFunds { owner_id: i64, required: i64 },

    /// Same idempotency key used for a different request
    #[error("Idempotency key reused with a different request: {0}")]
    IdempotencyKeyReused(String),

    /// Another attempt with the same idempotency key is unresolved
    #[error("Request in progress for idempotency key {0}")]
    RequestInProgress(String),

    /// A previous attempt under this key failed for a non-retryable reason
    #[error("Withdraw failed for idempotency key {key}: {code}")]
    WithdrawFailed { key: String, code: String },

    /// Operation did not finish in time; nothing was committed
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl WalletError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database and storage errors are sanitized, and user IDs and idempotency
    /// keys are redacted.
    pub fn client_message(&self) -> String {
        match self {
            WalletError::Database(_) | WalletError::Storage(_) | WalletError::LedgerNotFound(_) => {
                "Internal server error".to_string()
            }
            WalletError::WalletNotFound(_) => "Wallet not found".to_string(),
            WalletError::InvalidAmount(_) => "Amount must be greater than 0".to_string(),
            WalletError::InsufficientFunds { .. } => "Insufficient balance".to_string(),
            WalletError::IdempotencyKeyReused(_) => {
                "Idempotency key reused with different request".to_string()
            }
            WalletError::RequestInProgress(_) => {
                "Request is being processed, please retry".to_string()
            }
            WalletError::WithdrawFailed { .. } => "Withdraw failed".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether retrying the same request under the same idempotency key can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::RequestInProgress(_) | WalletError::Timeout(_)
        )
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_database_details() {
        let err = WalletError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.client_message(), "Internal server error");

        let err = WalletError::Storage("disk on fire".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_client_message_redacts_identifiers() {
        let err = WalletError::WalletNotFound(42);
        assert!(!err.client_message().contains("42"));

        let err = WalletError::RequestInProgress("secret-key".to_string());
        assert!(!err.client_message().contains("secret-key"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(WalletError::RequestInProgress("k".to_string()).is_retryable());
        assert!(WalletError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!WalletError::IdempotencyKeyReused("k".to_string()).is_retryable());
        assert!(
            !WalletError::WithdrawFailed {
                key: "k".to_string(),
                code: "X".to_string()
            }
            .is_retryable()
        );
        assert!(
            !WalletError::InsufficientFunds {
                owner_id: 1,
                required: 10
            }
            .is_retryable()
        );
    }
}
