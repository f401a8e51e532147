//! User error types.

use thiserror::Error;

use crate::wallet::WalletError;

/// User account errors
#[derive(Debug, Error)]
pub enum UserError {
    /// Name is blank or too long
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Opening balance is negative
    #[error("Invalid opening balance: {0}")]
    InvalidBalance(i64),

    /// Store failure while creating the account
    #[error(transparent)]
    Store(#[from] WalletError),
}

impl UserError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            UserError::Store(err) => err.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for user operations
pub type UserResult<T> = Result<T, UserError>;
