//! Structured logging configuration.
//!
//! The library crate logs through the `log` facade; the subscriber installed
//! here also receives those records.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use wl_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log the outcome of a withdrawal request
///
/// # Arguments
///
/// * `user_id` - Owner of the wallet
/// * `amount` - Requested amount
/// * `outcome` - `succeeded`, `replayed` or an error code
/// * `balance` - Resulting balance, when the withdrawal went through
pub fn log_withdrawal_outcome(user_id: i64, amount: i64, outcome: &str, balance: Option<i64>) {
    match balance {
        Some(balance) => tracing::info!(
            user_id = user_id,
            amount = amount,
            outcome = outcome,
            balance = balance,
            "Withdrawal completed"
        ),
        None => tracing::info!(
            user_id = user_id,
            amount = amount,
            outcome = outcome,
            "Withdrawal rejected"
        ),
    }
}

/// Log performance metric
///
/// Operations slower than one second are logged at warn level.
///
/// # Example
///
/// ```
/// use wl_server::logging::log_performance;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// // ... do work ...
/// let duration = start.elapsed().as_millis() as u64;
/// log_performance("withdraw", duration, Some("user 1"));
/// ```
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}

/// Log database operation
///
/// # Arguments
///
/// * `operation` - Operation name
/// * `target` - Table or subsystem
/// * `duration_ms` - Duration in milliseconds
pub fn log_database_operation(operation: &str, target: &str, duration_ms: u64) {
    tracing::debug!(
        operation = operation,
        target_table = target,
        duration_ms = duration_ms,
        "Database operation"
    );

    if duration_ms > 100 {
        tracing::warn!(
            operation = operation,
            target_table = target,
            duration_ms = duration_ms,
            "Slow database operation detected"
        );
    }
}

/// Log API request/response
pub fn log_api_request(
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
    user_id: Option<i64>,
) {
    tracing::info!(
        http_method = method,
        http_path = path,
        http_status = status_code,
        duration_ms = duration_ms,
        user_id = user_id,
        "API request completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_withdrawal_outcome() {
        log_withdrawal_outcome(1, 500, "succeeded", Some(1500));
        log_withdrawal_outcome(1, 500, "INSUFFICIENT_FUNDS", None);
    }

    #[test]
    fn test_log_performance() {
        log_performance("test_operation", 500, Some("metadata"));
        log_performance("slow_operation", 2000, None);
    }

    #[test]
    fn test_log_database_operation() {
        log_database_operation("health_check", "store", 50);
        log_database_operation("health_check", "store", 150);
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/v1/wallets/balance", 200, 45, Some(123));
        log_api_request("POST", "/v1/wallets/withdraw", 409, 120, None);
    }
}
