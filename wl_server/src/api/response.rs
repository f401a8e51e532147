//! JSON response envelope.
//!
//! Successful responses wrap their payload in `{"data": ...}`, failures in
//! `{"error": {"code": ..., "message": ...}}`.

use axum::Json;
use serde::{Deserialize, Serialize};

/// Success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Error details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `INSUFFICIENT_FUNDS`
    pub code: String,
    pub message: String,
}

/// Error envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Wrap a payload in the success envelope
pub fn data<T: Serialize>(payload: T) -> Json<DataResponse<T>> {
    Json(DataResponse { data: payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_envelope_shape() {
        let value = serde_json::to_value(DataResponse { data: json!({"balance": 5}) }).unwrap();
        assert_eq!(value, json!({"data": {"balance": 5}}));
    }

    #[test]
    fn test_error_envelope_shape() {
        let value = serde_json::to_value(ErrorResponse::new("DATA_NOT_FOUND", "User not found"))
            .unwrap();
        assert_eq!(
            value,
            json!({"error": {"code": "DATA_NOT_FOUND", "message": "User not found"}})
        );
    }
}
