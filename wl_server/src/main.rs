//! Wallet ledger HTTP server.
//!
//! Connects to PostgreSQL, applies migrations and serves the wallet API.

use std::net::SocketAddr;

use anyhow::Error;
use pico_args::Arguments;
use wallet_ledger::db::Database;
use wl_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run the wallet ledger server

USAGE:
  wl_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND, 0.0.0.0:$PORT or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/wallet_ledger]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  WITHDRAW_TIMEOUT_MS      Upper bound for one withdrawal attempt
  QUERY_TIMEOUT_MS         Upper bound for read-only lookups
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RUN_MIGRATIONS           Apply schema migrations on startup [default: true]
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!("Prometheus metrics exporter listening on {}", addr);
    }

    tracing::info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    tracing::info!("Database connected successfully");

    if config.run_migrations {
        db.migrate()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
        tracing::info!("Database migrations applied");
    }

    let state = api::AppState::new(db.store(), config.wallet.clone());
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    tracing::info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
