//! Claim Selector and Stats Aggregator primitives
//!
//! Every function here takes an open `Transaction` and never commits it.
//! The caller (the worker) owns the boundary: claim, aggregate and retire
//! commit together or not at all.
//!
//! Exclusivity: SQLite has no row-level `FOR UPDATE`. The claim transaction
//! is opened with `BEGIN IMMEDIATE` (see `begin_claim`), which takes the
//! database write lock before the SELECT runs. A second worker blocks in its
//! own `BEGIN IMMEDIATE` (up to busy_timeout) instead of skipping ahead, so
//! workers are serialized and arrival order holds across all of them.

use super::types::{QueueItem, Side};
use crate::error::StorageError;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Open the claim transaction, taking the write lock up front
///
/// Arguments:
/// - `conn`: the worker's own connection (mutable: a transaction borrows it)
///
/// Operation: `BEGIN IMMEDIATE`
/// - Waits up to the connection's busy_timeout while another writer holds
///   the lock, then fails with `SQLITE_BUSY` (`StorageError::Database`)
/// - Dropping the returned transaction without commit rolls it back
pub fn begin_claim(conn: &mut Connection) -> Result<Transaction<'_>, StorageError> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Select the oldest unprocessed item, ordered by `(created_at, id)`
///
/// SQL reference: `/sql/01_trades_q.sql` (served by `idx_trades_q_pending`)
///
/// Returns `Ok(None)` when the queue is drained; that is not an error.
/// A stored side other than buy/sell surfaces as a conversion error.
pub fn claim_next(tx: &Transaction<'_>) -> Result<Option<QueueItem>, StorageError> {
    let item = tx
        .query_row(
            "SELECT id, account, symbol, volume, open, close, side, created_at, processed
             FROM trades_q
             WHERE processed = 0
             ORDER BY created_at ASC, id ASC
             LIMIT 1",
            [],
            |row| {
                let side_str: String = row.get(6)?;
                let side = Side::parse(&side_str).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        format!("unknown side {:?}", side_str).into(),
                    )
                })?;

                Ok(QueueItem {
                    id: row.get(0)?,
                    account: row.get(1)?,
                    symbol: row.get(2)?,
                    volume: row.get(3)?,
                    open: row.get(4)?,
                    close: row.get(5)?,
                    side,
                    created_at: row.get(7)?,
                    processed: row.get(8)?,
                })
            },
        )
        .optional()?;

    Ok(item)
}

/// Fold one trade's profit into the account's running stats
///
/// SQL reference: `/sql/02_account_stats.sql`
///
/// Operation: UPSERT (INSERT ... ON CONFLICT(account) DO UPDATE)
/// - If account exists: `trades + 1`, `profit + delta`
/// - If account doesn't exist: insert `(account, 1, delta)`
///
/// No read-then-write.
pub fn upsert_account_stats(
    tx: &Transaction<'_>,
    account: &str,
    delta: f64,
) -> Result<(), StorageError> {
    tx.execute(
        "INSERT INTO account_stats (account, trades, profit)
         VALUES (?1, 1, ?2)
         ON CONFLICT(account) DO UPDATE SET
             trades = trades + 1,
             profit = profit + excluded.profit",
        params![account, delta],
    )?;

    Ok(())
}

/// Retire a claimed item
///
/// SQL reference: `/sql/01_trades_q.sql`
///
/// Operation: UPDATE (`processed = 1`).
/// Guarded by `processed = 0`; touching zero rows means the item was
/// already retired and the whole transaction must be abandoned.
pub fn mark_processed(tx: &Transaction<'_>, id: i64) -> Result<(), StorageError> {
    let updated = tx.execute(
        "UPDATE trades_q SET processed = 1 WHERE id = ?1 AND processed = 0",
        [id],
    )?;

    if updated != 1 {
        return Err(StorageError::NotPending(id));
    }

    Ok(())
}
