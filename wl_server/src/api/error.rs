//! API error type and its mapping to HTTP responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use wallet_ledger::{user::UserError, wallet::WalletError};

use super::response::ErrorResponse;

/// Seconds a client should wait before retrying a retryable failure
pub const RETRY_AFTER_SECS: u64 = 1;

/// Errors returned by API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing request body
    #[error("Invalid request body: {0}")]
    Validation(String),

    /// `X-User-ID` missing or not a positive integer
    #[error("user_id must be a positive integer")]
    InvalidUserId,

    /// `X-Idempotency-Key` missing or blank
    #[error("idempotency key is required")]
    InvalidIdempotencyKey,

    /// Lookup target does not exist
    #[error("User not found")]
    DataNotFound,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    User(#[from] UserError),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidUserId | ApiError::InvalidIdempotencyKey => {
                StatusCode::BAD_REQUEST
            }
            ApiError::DataNotFound => StatusCode::NOT_FOUND,
            ApiError::Wallet(err) => match err {
                WalletError::InvalidAmount(_) | WalletError::InvalidIdempotencyKey => {
                    StatusCode::BAD_REQUEST
                }
                WalletError::WalletNotFound(_) => StatusCode::NOT_FOUND,
                WalletError::InsufficientFunds { .. }
                | WalletError::IdempotencyKeyReused(_)
                | WalletError::RequestInProgress(_) => StatusCode::CONFLICT,
                WalletError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::User(UserError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::User(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable error code for clients
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvalidUserId => "INVALID_USER_ID",
            ApiError::InvalidIdempotencyKey => "INVALID_IDEMPOTENCY_KEY",
            ApiError::DataNotFound => "DATA_NOT_FOUND",
            ApiError::Wallet(err) => Self::wallet_code(err),
            ApiError::User(UserError::Store(_)) => "UNKNOWN_ERROR",
            ApiError::User(_) => "VALIDATION_ERROR",
        }
    }

    /// Error code a wallet error is reported under
    pub fn wallet_code(err: &WalletError) -> &'static str {
        match err {
            WalletError::InvalidAmount(_) => "INVALID_AMOUNT",
            WalletError::InvalidIdempotencyKey => "INVALID_IDEMPOTENCY_KEY",
            WalletError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            WalletError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            WalletError::IdempotencyKeyReused(_) => "IDEMPOTENCY_KEY_REUSED",
            WalletError::RequestInProgress(_) => "REQUEST_IN_PROGRESS",
            WalletError::WithdrawFailed { .. } => "WITHDRAW_FAILED",
            WalletError::Timeout(_) => "TIMEOUT",
            _ => "UNKNOWN_ERROR",
        }
    }

    /// Client-safe message
    pub fn message(&self) -> String {
        match self {
            ApiError::Wallet(err) => err.client_message(),
            ApiError::User(err) => err.client_message(),
            _ => self.to_string(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Wallet(err) if err.is_retryable())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }

        let body = Json(ErrorResponse::new(self.code(), self.message()));
        let mut response = (status, body).into_response();

        if self.is_retryable() {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_wallet_error_mapping() {
        let cases = [
            (WalletError::InvalidAmount(0), StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            (WalletError::WalletNotFound(1), StatusCode::NOT_FOUND, "WALLET_NOT_FOUND"),
            (
                WalletError::InsufficientFunds { owner_id: 1, required: 5 },
                StatusCode::CONFLICT,
                "INSUFFICIENT_FUNDS",
            ),
            (
                WalletError::IdempotencyKeyReused("k".to_string()),
                StatusCode::CONFLICT,
                "IDEMPOTENCY_KEY_REUSED",
            ),
            (
                WalletError::RequestInProgress("k".to_string()),
                StatusCode::CONFLICT,
                "REQUEST_IN_PROGRESS",
            ),
            (
                WalletError::WithdrawFailed { key: "k".to_string(), code: "X".to_string() },
                StatusCode::INTERNAL_SERVER_ERROR,
                "WITHDRAW_FAILED",
            ),
            (
                WalletError::Timeout(Duration::from_secs(1)),
                StatusCode::SERVICE_UNAVAILABLE,
                "TIMEOUT",
            ),
            (
                WalletError::Storage("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "UNKNOWN_ERROR",
            ),
            (
                WalletError::LedgerNotFound("k".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "UNKNOWN_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn test_retry_after_only_on_retryable() {
        let response =
            ApiError::from(WalletError::RequestInProgress("k".to_string())).into_response();
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "1");

        let response = ApiError::from(WalletError::Timeout(Duration::from_secs(1))).into_response();
        assert!(response.headers().contains_key(RETRY_AFTER));

        let response = ApiError::from(WalletError::InvalidAmount(0)).into_response();
        assert!(!response.headers().contains_key(RETRY_AFTER));
    }

    #[test]
    fn test_storage_message_is_sanitized() {
        let api = ApiError::from(WalletError::Storage("relation wallets missing".to_string()));
        assert_eq!(api.message(), "Internal server error");
    }

    #[test]
    fn test_user_error_mapping() {
        let api = ApiError::from(UserError::InvalidBalance(-1));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.code(), "VALIDATION_ERROR");

        let api = ApiError::from(UserError::Store(WalletError::Storage("x".to_string())));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code(), "UNKNOWN_ERROR");
    }
}
