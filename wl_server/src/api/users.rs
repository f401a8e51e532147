//! User API handlers.
//!
//! ```bash
//! curl -X POST http://localhost:8080/v1/users \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "alice", "balance": 100000}'
//! ```

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use wallet_ledger::{db::Store, user::CreateUserRequest};

use super::{
    AppState,
    error::ApiError,
    response::{DataResponse, data},
};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub name: String,
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub id: i64,
    pub wallet_id: i64,
    pub balance: i64,
}

/// Create a user with a funded wallet.
///
/// # Request Body
///
/// ```json
/// { "name": "alice", "balance": 100000 }
/// ```
///
/// # Response
///
/// `200 OK` with `{"data": {"id": 1, "walletId": 1, "balance": 100000}}`
///
/// # Errors
///
/// - `400 VALIDATION_ERROR`: Malformed body, blank name or negative balance
/// - `500 UNKNOWN_ERROR`: Store failure
pub async fn create_user<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateUserPayload>, JsonRejection>,
) -> Result<Json<DataResponse<CreateUserResponse>>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let account = state
        .user_manager
        .create_user(CreateUserRequest {
            name: payload.name,
            balance: payload.balance,
        })
        .await?;

    metrics::users_created_total();
    tracing::info!(
        user_id = account.user.id,
        wallet_id = account.wallet.id,
        "User created"
    );

    Ok(data(CreateUserResponse {
        id: account.user.id,
        wallet_id: account.wallet.id,
        balance: account.wallet.balance,
    }))
}
