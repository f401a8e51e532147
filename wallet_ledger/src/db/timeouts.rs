//! Store operation timeout helpers
//!
//! Wrapping a transaction in a timeout cancels it by dropping the future, and
//! a dropped transaction rolls back, so a timed-out attempt leaves no effect.

use std::time::Duration;
use tokio::time::timeout;

use crate::wallet::{WalletError, WalletResult};

/// Default timeout for single-statement reads (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for a whole withdrawal transaction (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Execute a store operation with timeout
///
/// # Arguments
///
/// * `duration` - Timeout duration
/// * `future` - Async operation to execute
///
/// # Returns
///
/// * `WalletResult<T>` - The operation's own result, or `WalletError::Timeout`
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> WalletResult<T>
where
    F: std::future::Future<Output = WalletResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(WalletError::Timeout(duration)),
    }
}
