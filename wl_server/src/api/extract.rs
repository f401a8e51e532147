//! Header extractors for wallet endpoints.

use axum::{extract::FromRequestParts, http::request::Parts};
use wallet_ledger::wallet::OwnerId;

use super::error::ApiError;

/// Header carrying the caller's user ID
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the client-supplied idempotency key
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// Caller's user ID, parsed from `X-User-ID`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub OwnerId);

/// Non-blank idempotency key from `X-Idempotency-Key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyKey(pub String);

fn parse_user_id(value: Option<&str>) -> Result<OwnerId, ApiError> {
    value
        .and_then(|v| v.trim().parse::<OwnerId>().ok())
        .filter(|id| *id > 0)
        .ok_or(ApiError::InvalidUserId)
}

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok());
        parse_user_id(value).map(UserId)
    }
}

impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| IdempotencyKey(key.to_string()))
            .ok_or(ApiError::InvalidIdempotencyKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id(Some("42")).unwrap(), 42);
        assert_eq!(parse_user_id(Some(" 7 ")).unwrap(), 7);
        assert!(parse_user_id(Some("0")).is_err());
        assert!(parse_user_id(Some("-3")).is_err());
        assert!(parse_user_id(Some("abc")).is_err());
        assert!(parse_user_id(None).is_err());
    }
}
