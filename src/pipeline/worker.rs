//! Worker Loop - claim, aggregate, retire, back off
//!
//! One cycle walks the states
//!
//! ```text
//! Idle → Claiming ─┬─ item ──→ Processing ─┬─ ok ──→ Committing → Backoff → Idle
//!                  ├─ empty ─→ Backoff     └─ err ─→ (rollback) Backoff
//!                  └─ err ───→ Backoff
//! ```
//!
//! All writes of a cycle (stats upsert + processed flag) live in one
//! `BEGIN IMMEDIATE` transaction. Any failure drops the transaction, which
//! rolls it back, and the item stays claimable for the next cycle. Failures
//! never end the loop; only the shutdown signal does, and only between cycles.

use super::claim::{begin_claim, claim_next, mark_processed, upsert_account_stats};
use super::db::open_connection;
use super::profit::item_profit;
use super::types::QueueItem;
use crate::error::StorageError;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::watch;

const THROUGHPUT_LOG_SECS: u64 = 10;

/// Where the worker is inside the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Claiming,
    Processing,
    Committing,
    Backoff,
}

/// Result of one cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// Item retired and stats committed
    Processed { id: i64, account: String, profit: f64 },
    /// Nothing pending; not an error
    Empty,
    /// Transient failure; everything was rolled back
    Failed(StorageError),
}

/// Counters since the worker started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerMetrics {
    pub cycles: u64,
    pub processed: u64,
    pub empty: u64,
    pub failed: u64,
}

/// Single-connection queue consumer
///
/// Owns its own SQLite connection (never shared with the HTTP side), so
/// several workers can run against one database file; `BEGIN IMMEDIATE`
/// serializes them.
pub struct QueueWorker {
    conn: Connection,
    poll_interval: Duration,
    state: WorkerState,
    metrics: WorkerMetrics,
}

impl QueueWorker {
    /// Open the worker's own connection; failure here is a startup failure
    ///
    /// Arguments:
    /// - `db_path`: SQLite file, created (with parent directory) if missing
    /// - `busy_timeout_ms`: how long `BEGIN IMMEDIATE` waits for a rival writer
    /// - `poll_interval`: backoff slept by `run` after every cycle
    ///
    /// Applies pragmas and runs the `/sql/*.sql` migrations before returning.
    pub fn open(
        db_path: impl AsRef<Path>,
        busy_timeout_ms: u64,
        poll_interval: Duration,
    ) -> Result<Self, StorageError> {
        let conn = open_connection(db_path, busy_timeout_ms)?;
        Ok(Self::new(conn, poll_interval))
    }

    /// Wrap an already configured connection
    ///
    /// Note: does NOT run migrations; the caller must have applied
    /// `/sql/01_trades_q.sql` and `/sql/02_account_stats.sql`.
    pub fn new(conn: Connection, poll_interval: Duration) -> Self {
        Self {
            conn,
            poll_interval,
            state: WorkerState::Idle,
            metrics: WorkerMetrics::default(),
        }
    }

    /// Current state; `Backoff` after any `run_cycle`, `Idle` before the first
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Snapshot of the cycle counters
    pub fn metrics(&self) -> WorkerMetrics {
        self.metrics
    }

    /// Backoff slept between cycles by `run`
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run exactly one cycle, ending in `Backoff`
    ///
    /// Operation (one `BEGIN IMMEDIATE` transaction):
    /// 1. Claim oldest pending row from `trades_q` by `(created_at, id)`
    /// 2. UPSERT its profit into `account_stats`
    /// 3. `UPDATE trades_q SET processed = 1` guarded by `processed = 0`
    /// 4. COMMIT
    ///
    /// A failure at any step rolls everything back and is reported as
    /// `CycleOutcome::Failed`; the item stays pending for the next cycle.
    /// Does not sleep; `run` owns the backoff wait.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.state = WorkerState::Claiming;
        self.metrics.cycles += 1;

        let outcome = Self::claim_and_process(&mut self.conn, &mut self.state);

        match &outcome {
            CycleOutcome::Processed { id, account, profit } => {
                self.metrics.processed += 1;
                log::info!(
                    "Processed trade {} for account {}, profit: {:.2}",
                    id,
                    account,
                    profit
                );
            }
            CycleOutcome::Empty => {
                self.metrics.empty += 1;
                log::trace!("Queue empty");
            }
            CycleOutcome::Failed(e) => {
                self.metrics.failed += 1;
                log::warn!("⚠️  Cycle failed in {:?}, rolled back: {}", self.state, e);
            }
        }

        self.state = WorkerState::Backoff;
        outcome
    }

    /// Claiming → Processing → Committing; `state` tracks how far we got
    fn claim_and_process(conn: &mut Connection, state: &mut WorkerState) -> CycleOutcome {
        let tx = match begin_claim(conn) {
            Ok(tx) => tx,
            Err(e) => return CycleOutcome::Failed(e),
        };

        let item = match claim_next(&tx) {
            Ok(Some(item)) => item,
            // Dropping tx rolls back; nothing was written
            Ok(None) => return CycleOutcome::Empty,
            Err(e) => return rollback(tx, e),
        };

        *state = WorkerState::Processing;
        let profit = match apply_item(&tx, &item) {
            Ok(profit) => profit,
            Err(e) => return rollback(tx, e),
        };

        *state = WorkerState::Committing;
        if let Err(e) = tx.commit() {
            return CycleOutcome::Failed(e.into());
        }

        CycleOutcome::Processed {
            id: item.id,
            account: item.account,
            profit,
        }
    }

    /// Loop cycles until `shutdown` flips to true (or its sender is dropped)
    ///
    /// Sleeps `poll_interval` between cycles and logs throughput every
    /// 10 seconds. Returns the final counters.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> WorkerMetrics {
        log::info!(
            "👷 Worker started with polling interval: {:?}",
            self.poll_interval
        );

        let mut window_start = Instant::now();
        let mut window_processed = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.state = WorkerState::Idle;
            if let CycleOutcome::Processed { .. } = self.run_cycle() {
                window_processed += 1;
            }

            if window_start.elapsed().as_secs() >= THROUGHPUT_LOG_SECS {
                let rate = window_processed as f64 / window_start.elapsed().as_secs_f64();
                log::info!(
                    "📊 Worker rate: {:.1} trades/sec (total: {}, failed cycles: {})",
                    rate,
                    self.metrics.processed,
                    self.metrics.failed
                );
                window_start = Instant::now();
                window_processed = 0;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender gone: nobody can ask us to keep running
                        break;
                    }
                }
            }
        }

        self.state = WorkerState::Idle;
        log::info!(
            "✅ Worker stopped ({} processed, {} failed cycles)",
            self.metrics.processed,
            self.metrics.failed
        );
        self.metrics
    }
}

/// Profit → stats upsert → processed flag, all inside `tx`
fn apply_item(tx: &Transaction<'_>, item: &QueueItem) -> Result<f64, StorageError> {
    let profit = item_profit(item);
    upsert_account_stats(tx, &item.account, profit)?;
    mark_processed(tx, item.id)?;
    Ok(profit)
}

fn rollback(tx: Transaction<'_>, cause: StorageError) -> CycleOutcome {
    if let Err(e) = tx.rollback() {
        // SQLite still discards the transaction when the connection moves on
        log::error!("❌ Rollback failed: {}", e);
    }
    CycleOutcome::Failed(cause)
}
