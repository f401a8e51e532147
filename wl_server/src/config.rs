//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use std::time::Duration;

use wallet_ledger::{db::DatabaseConfig, wallet::WalletConfig};

/// Default bind address when neither `SERVER_BIND` nor `PORT` is set
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Withdrawal engine timeouts
    pub wallet: WalletConfig,
    /// Prometheus exporter address; metrics are disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if an address variable is set but does not parse
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => bind_from_env()?,
        };

        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .or_else(|| std::env::var("DB_URL").ok())
            .unwrap_or_else(|| DatabaseConfig::development().database_url);

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 5),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT_SECS", 5),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", 1800),
        };

        let defaults = WalletConfig::default();
        let wallet = WalletConfig {
            transaction_timeout: Duration::from_millis(parse_env_or(
                "WITHDRAW_TIMEOUT_MS",
                defaults.transaction_timeout.as_millis() as u64,
            )),
            query_timeout: Duration::from_millis(parse_env_or(
                "QUERY_TIMEOUT_MS",
                defaults.query_timeout.as_millis() as u64,
            )),
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(value) if !value.trim().is_empty() => {
                Some(value.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("Not a socket address: {value}"),
                })?)
            }
            _ => None,
        };

        Ok(ServerConfig {
            bind,
            database,
            wallet,
            metrics_bind,
            run_migrations: parse_env_or("RUN_MIGRATIONS", true),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Must not exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.database.connection_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_CONNECTION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.wallet.transaction_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "WITHDRAW_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.wallet.query_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "QUERY_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// `SERVER_BIND`, else `0.0.0.0:$PORT`, else the default
fn bind_from_env() -> Result<SocketAddr, ConfigError> {
    if let Ok(value) = std::env::var("SERVER_BIND") {
        return value.parse().map_err(|_| ConfigError::Invalid {
            var: "SERVER_BIND".to_string(),
            reason: format!("Not a socket address: {value}"),
        });
    }

    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port.parse().map_err(|_| ConfigError::Invalid {
            var: "PORT".to_string(),
            reason: format!("Not a port number: {port}"),
        })?;
        return Ok(SocketAddr::from(([0, 0, 0, 0], port)));
    }

    DEFAULT_BIND.parse().map_err(|_| ConfigError::Invalid {
        var: "SERVER_BIND".to_string(),
        reason: "Default bind address does not parse".to_string(),
    })
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
