//! Runtime configuration from environment variables
//!
//! Environment variables (a `.env` file is honoured by the binaries):
//! - `TRADEFLOW_DB_PATH` (default: data.db)
//! - `TRADEFLOW_LISTEN_ADDR` (default: 0.0.0.0:8080; a bare port is accepted)
//! - `WORKER_POLL_INTERVAL_MS` (default: 100)
//! - `SQLITE_BUSY_TIMEOUT_MS` (default: 5000)

use crate::error::ConfigError;
use crate::sqlite_pragma::DEFAULT_BUSY_TIMEOUT_MS;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "data.db";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Configuration for the HTTP ingestion server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Socket the HTTP API binds to
    pub listen_addr: SocketAddr,

    pub busy_timeout_ms: u64,
}

impl ServerConfig {
    /// Load configuration; an unparseable listen address is fatal
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_addr =
            env::var("TRADEFLOW_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

        Ok(Self {
            db_path: db_path_from_env(),
            listen_addr: parse_listen_addr(&raw_addr)?,
            busy_timeout_ms: parse_or_default("SQLITE_BUSY_TIMEOUT_MS", DEFAULT_BUSY_TIMEOUT_MS),
        })
    }
}

/// Configuration for the queue worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Backoff between cycles
    pub poll_interval: Duration,

    pub busy_timeout_ms: u64,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: db_path_from_env(),
            poll_interval: Duration::from_millis(parse_or_default(
                "WORKER_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )),
            busy_timeout_ms: parse_or_default("SQLITE_BUSY_TIMEOUT_MS", DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

fn db_path_from_env() -> String {
    env::var("TRADEFLOW_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string())
}

/// Read `name` and parse it, falling back to `default` (with a warning when set but invalid)
fn parse_or_default<T: FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {} '{}', defaulting to {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Accept `host:port` or a bare port (bound on all interfaces)
fn parse_listen_addr(raw: &str) -> Result<SocketAddr, ConfigError> {
    let raw = raw.trim();
    let candidate = match raw.parse::<u16>() {
        Ok(port) => format!("0.0.0.0:{}", port),
        Err(_) => raw.to_string(),
    };

    candidate.parse().map_err(|_| ConfigError::InvalidValue {
        name: "TRADEFLOW_LISTEN_ADDR",
        value: raw.to_string(),
    })
}
