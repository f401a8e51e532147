//! Request ID middleware for tracing and debugging.
//!
//! Every request gets an `x-request-id` (propagated from the client when
//! present), which is echoed on the response and attached to the request log
//! lines together with the caller's `x-user-id`.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::extract::USER_ID_HEADER;
use crate::{logging, metrics};

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Route label for requests that matched no route
const UNMATCHED_ROUTE: &str = "unmatched";

/// Generate or extract request ID from headers
fn get_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Metric and log label for a request's route
fn route_label(matched: Option<&str>) -> String {
    matched.unwrap_or(UNMATCHED_ROUTE).to_string()
}

/// Caller's user ID, if the header parses; used for logging only
fn user_id_for_logging(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Middleware to add request ID to all requests and responses
///
/// Also records the request in the access log and the HTTP metrics, labelled
/// with the matched route rather than the raw URI.
pub async fn request_id_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let start = Instant::now();
    let request_id = get_or_generate_request_id(request.headers());
    let user_id = user_id_for_logging(request.headers());
    let method = request.method().to_string();
    let path = route_label(request.extensions().get::<MatchedPath>().map(MatchedPath::as_str));

    request.extensions_mut().insert(RequestId(request_id.clone()));

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %request.uri(),
        user_id = user_id,
        "Request started"
    );

    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert(REQUEST_ID_HEADER, header_value);
    }

    let duration = start.elapsed();
    let status = parts.status.as_u16();

    tracing::info!(
        request_id = %request_id,
        status = %parts.status,
        "Request completed"
    );
    logging::log_api_request(&method, &path, status, duration.as_millis() as u64, user_id);
    metrics::http_requests_total(&method, &path, status);
    metrics::http_request_duration_ms(&method, &path, duration.as_secs_f64() * 1000.0);

    Ok(Response::from_parts(parts, body))
}

/// Request ID wrapper for extracting from request extensions
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    /// Get the request ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Axum extractor for request ID
impl<S> axum::extract::FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestId>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Request ID not found in extensions",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_generate_request_id_with_existing() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("test-id-123"));

        assert_eq!(get_or_generate_request_id(&headers), "test-id-123");
    }

    #[test]
    fn test_get_or_generate_request_id_generates_new() {
        let request_id = get_or_generate_request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&request_id).is_ok());
    }

    #[test]
    fn test_route_label() {
        assert_eq!(route_label(Some("/v1/wallets/balance")), "/v1/wallets/balance");
        assert_eq!(route_label(None), "unmatched");
    }

    #[test]
    fn test_user_id_for_logging() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id_for_logging(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("17"));
        assert_eq!(user_id_for_logging(&headers), Some(17));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("x"));
        assert_eq!(user_id_for_logging(&headers), None);
    }
}
