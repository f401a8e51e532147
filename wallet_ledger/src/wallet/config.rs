//! Wallet engine configuration.

use std::time::Duration;

use crate::db::timeouts::{DEFAULT_QUERY_TIMEOUT, DEFAULT_TRANSACTION_TIMEOUT};

/// Wallet engine configuration, passed to [`super::WalletManager::new`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    /// Upper bound for one withdrawal attempt, including lock waits
    pub transaction_timeout: Duration,

    /// Upper bound for read-only lookups (balance, replay resolution)
    pub query_timeout: Duration,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}
