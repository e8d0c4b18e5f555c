//! Error taxonomy for the trade pipeline
//!
//! - `ValidationError`: rejected at the ingestion boundary, never retried
//! - `StorageError`: any failure talking to SQLite; transient for the worker
//! - `IngestError`: what a caller of the ingestion gate sees
//!
//! An empty queue is not an error; see `worker::CycleOutcome::Empty`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Account must not be empty")]
    EmptyAccount,

    #[error("Symbol must be 6 uppercase letters (got {0:?})")]
    InvalidSymbol(String),

    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("Side must be either 'buy' or 'sell' (got {0:?})")]
    InvalidSide(String),

    #[error("Trade profit {0} is out of range")]
    ProfitOutOfRange(f64),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection lock poisoned")]
    LockPoisoned,

    #[error("Trade {0} was not pending when marked processed")]
    NotPending(i64),

    #[error("Schema error: {0}")]
    Schema(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to enqueue trade: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}
