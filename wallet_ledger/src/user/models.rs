//! User data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wallet::Wallet;

/// Maximum length of a user name, in characters
pub const MAX_NAME_LENGTH: usize = 255;

/// User model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    /// Opening wallet balance
    pub balance: i64,
}

/// A freshly created user together with its wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub user: User,
    pub wallet: Wallet,
}
