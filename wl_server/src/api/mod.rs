//! HTTP API for the wallet server.
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                  - Health check
//! POST /v1/users                - Create a user with a funded wallet
//! GET  /v1/wallets/balance      - Balance of the caller's wallet (X-User-ID)
//! POST /v1/wallets/withdraw     - Idempotent withdrawal (X-User-ID, X-Idempotency-Key)
//! ```
//!
//! Responses use a `{"data": ...}` / `{"error": {"code", "message"}}`
//! envelope, see [`response`].
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use wl_server::api::{AppState, create_router};
//! use wallet_ledger::db::{Database, DatabaseConfig};
//! use wallet_ledger::wallet::WalletConfig;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(&DatabaseConfig::development()).await?;
//! let state = AppState::new(db.store(), WalletConfig::default());
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod error;
pub mod extract;
pub mod request_id;
pub mod response;
pub mod users;
pub mod wallets;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use wallet_ledger::{
    db::{PgStore, Store},
    user::UserManager,
    wallet::{WalletConfig, WalletManager},
};

use crate::logging;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; the managers sit behind `Arc`s and the store is a
/// cheap handle.
#[derive(Clone)]
pub struct AppState<S: Store = PgStore> {
    pub wallet_manager: Arc<WalletManager<S>>,
    pub user_manager: Arc<UserManager<S>>,
    pub store: S,
}

impl<S: Store> AppState<S> {
    /// Build the managers over one store
    pub fn new(store: S, wallet_config: WalletConfig) -> Self {
        Self {
            wallet_manager: Arc::new(WalletManager::new(store.clone(), wallet_config)),
            user_manager: Arc::new(UserManager::new(store.clone())),
            store,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check::<S>))
        .nest("/v1", create_v1_router::<S>())
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(request_id::request_id_middleware)),
        )
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/users", post(users::create_user::<S>))
        .route("/wallets/balance", get(wallets::get_balance::<S>))
        .route("/wallets/withdraw", post(wallets::withdraw::<S>))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","database":true,"timestamp":"2026-10-16T10:30:00Z"}
/// ```
async fn health_check<S: Store>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let start = Instant::now();
    let db_healthy = match state.store.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            false
        }
    };
    logging::log_database_operation(
        "health_check",
        "store",
        start.elapsed().as_millis() as u64,
    );

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
