//! Durable trade queue with exactly-once per-account aggregation
//!
//! ```text
//! POST /trades → IngestionGate → trades_q (SQLite)
//!                                   ↓  BEGIN IMMEDIATE
//!                     QueueWorker: claim → profit → upsert stats → mark processed → COMMIT
//!                                   ↓
//! GET /stats/:account ←──────── account_stats
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod sqlite_pragma;
