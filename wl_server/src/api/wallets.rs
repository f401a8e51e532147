//! Wallet API handlers.
//!
//! # Examples
//!
//! Check a balance:
//! ```bash
//! curl http://localhost:8080/v1/wallets/balance -H "X-User-ID: 1"
//! ```
//!
//! Withdraw (safe to retry with the same key):
//! ```bash
//! curl -X POST http://localhost:8080/v1/wallets/withdraw \
//!   -H "X-User-ID: 1" -H "X-Idempotency-Key: order-1234" \
//!   -H "Content-Type: application/json" \
//!   -d '{"amount": 30000}'
//! ```

use std::time::Instant;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use wallet_ledger::{
    db::Store,
    wallet::{WalletError, WithdrawRequest},
};

use super::{
    AppState,
    error::ApiError,
    extract::{IdempotencyKey, UserId},
    request_id::RequestId,
    response::{DataResponse, data},
};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct WithdrawPayload {
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResponse {
    pub balance: i64,
    pub amount: i64,
    pub user_id: i64,
}

/// Get the caller's wallet balance.
///
/// # Response
///
/// `200 OK` with `{"data": {"balance": 70000}}`
///
/// # Errors
///
/// - `400 INVALID_USER_ID`: `X-User-ID` missing or not a positive integer
/// - `404 DATA_NOT_FOUND`: The user has no wallet
pub async fn get_balance<S: Store>(
    State(state): State<AppState<S>>,
    UserId(user_id): UserId,
) -> Result<Json<DataResponse<BalanceResponse>>, ApiError> {
    match state.wallet_manager.get_balance(user_id).await {
        Ok(balance) => Ok(data(BalanceResponse { balance })),
        Err(WalletError::WalletNotFound(_)) => Err(ApiError::DataNotFound),
        Err(e) => Err(e.into()),
    }
}

/// Withdraw from the caller's wallet, at most once per idempotency key.
///
/// Retrying with the same `X-Idempotency-Key` and amount returns the original
/// result without withdrawing again.
///
/// # Request Body
///
/// ```json
/// { "amount": 30000 }
/// ```
///
/// # Response
///
/// `200 OK` with `{"data": {"balance": 70000, "amount": 30000, "userId": 1}}`
///
/// # Errors
///
/// - `400 INVALID_USER_ID`, `INVALID_IDEMPOTENCY_KEY`, `VALIDATION_ERROR`, `INVALID_AMOUNT`
/// - `404 WALLET_NOT_FOUND`
/// - `409 INSUFFICIENT_FUNDS`, `IDEMPOTENCY_KEY_REUSED`, `REQUEST_IN_PROGRESS` (with `Retry-After`)
/// - `500 WITHDRAW_FAILED`, `UNKNOWN_ERROR`
/// - `503 TIMEOUT` (with `Retry-After`)
pub async fn withdraw<S: Store>(
    State(state): State<AppState<S>>,
    request_id: RequestId,
    UserId(user_id): UserId,
    IdempotencyKey(key): IdempotencyKey,
    payload: Result<Json<WithdrawPayload>, JsonRejection>,
) -> Result<Json<DataResponse<WithdrawResponse>>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    tracing::debug!(
        request_id = request_id.as_str(),
        user_id = user_id,
        amount = payload.amount,
        "Withdrawal requested"
    );

    let start = Instant::now();
    let result = state
        .wallet_manager
        .withdraw(WithdrawRequest::new(user_id, key, payload.amount))
        .await;
    let elapsed = start.elapsed();

    let (outcome, balance) = match &result {
        Ok(w) if w.replayed => ("replayed", Some(w.balance)),
        Ok(w) => ("succeeded", Some(w.balance)),
        Err(e) => (ApiError::wallet_code(e), None),
    };
    logging::log_withdrawal_outcome(user_id, payload.amount, outcome, balance);
    logging::log_performance("withdraw", elapsed.as_millis() as u64, Some(outcome));
    metrics::withdrawals_total(outcome);
    metrics::withdraw_duration_ms(outcome, elapsed.as_secs_f64() * 1000.0);

    let withdrawal = result?;
    Ok(data(WithdrawResponse {
        balance: withdrawal.balance,
        amount: withdrawal.amount,
        user_id: withdrawal.owner_id,
    }))
}
