//! Connection tuning shared by every SQLite handle (server, worker, tests)

use rusqlite::Connection;
use std::time::Duration;

/// Default wait for a competing writer before giving up with SQLITE_BUSY
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Apply PRAGMAs: busy timeout, WAL, NORMAL sync, autocheckpoint
///
/// `busy_timeout` goes first so the WAL switch itself can wait on a
/// connection that another process is holding.
pub fn apply_optimized_pragmas(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;

    // journal_mode returns a row, pragma_update handles that
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "wal_autocheckpoint", 1000)?;

    Ok(())
}
