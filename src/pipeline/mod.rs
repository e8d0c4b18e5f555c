//! # Trade Queue Pipeline
//!
//! Ingestion appends trades to a durable SQLite queue; a worker claims the
//! oldest pending trade, folds its profit into per-account stats and retires
//! it, all in one transaction.
//!
//! ## Module Organization
//!
//! - `types` - Core data structures (TradeRecord, QueueItem, AccountStats)
//! - `validation` - Ingestion rules
//! - `profit` - Profit of a single trade
//! - `db` - Schema, connections, `TradeQueue` trait + SQLite implementation
//! - `claim` - In-transaction claim / upsert / retire primitives
//! - `ingestion` - Ingestion gate (validate + enqueue)
//! - `worker` - Worker loop state machine

pub mod types;
pub mod validation;
pub mod profit;
pub mod db;
pub mod claim;
pub mod ingestion;
pub mod worker;

// Re-export commonly used types
pub use types::{AccountStats, QueueItem, Side, Trade, TradeRecord};
pub use db::{SqliteTradeQueue, TradeQueue};
pub use ingestion::IngestionGate;
pub use profit::{calculate_profit, LOT_SIZE};
pub use worker::{CycleOutcome, QueueWorker, WorkerMetrics, WorkerState};
