//! HTTP server for the wallet ledger.
//!
//! Exposes account creation, balance lookup and idempotent withdrawals over a
//! small JSON API. The binary in `main.rs` wires these modules to PostgreSQL.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
