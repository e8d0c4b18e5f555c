//! Queue Store: schema, connection setup, and the ingestion-side trait
//!
//! Tables (see `sql/`):
//! - `trades_q` - INSERT only from ingestion; `processed` flipped by the worker
//! - `account_stats` - UPSERT on account, worker only

use super::types::{AccountStats, Trade};
use crate::error::StorageError;
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Schema files, applied in order. Every statement uses IF NOT EXISTS.
const SCHEMA: &[(&str, &str)] = &[
    ("01_trades_q.sql", include_str!("../../sql/01_trades_q.sql")),
    ("02_account_stats.sql", include_str!("../../sql/02_account_stats.sql")),
];

/// Run the embedded schema files against `conn` (idempotent)
pub fn run_schema_migrations(conn: &Connection) -> Result<(), StorageError> {
    log::info!("🔧 Running schema migrations");

    for (filename, sql) in SCHEMA {
        log::debug!("   ├─ Executing: {}", filename);
        conn.execute_batch(sql)
            .map_err(|e| StorageError::Schema(format!("{}: {}", filename, e)))?;
    }

    log::info!("✅ Schema ready ({} files)", SCHEMA.len());
    Ok(())
}

/// Open a tuned connection and make sure the schema exists
///
/// Creates the parent directory when missing.
pub fn open_connection(
    db_path: impl AsRef<Path>,
    busy_timeout_ms: u64,
) -> Result<Connection, StorageError> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(db_path)?;
    apply_optimized_pragmas(&conn, busy_timeout_ms)?;
    run_schema_migrations(&conn)?;

    Ok(conn)
}

/// Storage operations used by the ingestion and query paths
///
/// The worker does not go through this trait; it needs a transaction on
/// its own connection (see `claim`).
#[async_trait]
pub trait TradeQueue: Send + Sync {
    /// Append a validated trade with `processed = 0`; returns the new id
    ///
    /// Operation: single INSERT, so there is no partial write.
    async fn enqueue(&self, trade: &Trade) -> Result<i64, StorageError>;

    /// Current stats for `account`, zeros when nothing was processed yet
    async fn account_stats(&self, account: &str) -> Result<AccountStats, StorageError>;

    /// Number of trades still waiting for the worker
    async fn pending_count(&self) -> Result<i64, StorageError>;

    /// Cheap round-trip to check the database answers
    async fn ping(&self) -> Result<(), StorageError>;
}

/// SQLite implementation of TradeQueue
pub struct SqliteTradeQueue {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTradeQueue {
    /// Open (and migrate) the database at `db_path`
    pub fn open(db_path: impl AsRef<Path>, busy_timeout_ms: u64) -> Result<Self, StorageError> {
        let conn = open_connection(db_path, busy_timeout_ms)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already configured connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        f(&conn)
    }
}

#[async_trait]
impl TradeQueue for SqliteTradeQueue {
    async fn enqueue(&self, trade: &Trade) -> Result<i64, StorageError> {
        let created_at = chrono::Utc::now().timestamp_millis();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO trades_q (account, symbol, volume, open, close, side, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    trade.account,
                    trade.symbol,
                    trade.volume,
                    trade.open,
                    trade.close,
                    trade.side.as_str(),
                    created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    async fn account_stats(&self, account: &str) -> Result<AccountStats, StorageError> {
        self.with_conn(|conn| {
            let stats = conn
                .query_row(
                    "SELECT account, trades, profit FROM account_stats WHERE account = ?1",
                    [account],
                    |row| {
                        Ok(AccountStats {
                            account: row.get(0)?,
                            trades: row.get(1)?,
                            profit: row.get(2)?,
                        })
                    },
                )
                .optional()?;

            Ok(stats.unwrap_or_else(|| AccountStats::empty(account)))
        })
    }

    async fn pending_count(&self) -> Result<i64, StorageError> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM trades_q WHERE processed = 0",
                [],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::Side;
    use crate::sqlite_pragma::DEFAULT_BUSY_TIMEOUT_MS;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, SqliteTradeQueue) {
        let temp_file = NamedTempFile::new().unwrap();
        let queue = SqliteTradeQueue::open(temp_file.path(), DEFAULT_BUSY_TIMEOUT_MS).unwrap();
        (temp_file, queue)
    }

    fn make_trade(account: &str, side: Side) -> Trade {
        Trade {
            account: account.to_string(),
            symbol: "EURUSD".to_string(),
            volume: 1.0,
            open: 1.1,
            close: 1.2,
            side,
        }
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = open_connection(temp_file.path(), DEFAULT_BUSY_TIMEOUT_MS).unwrap();

        run_schema_migrations(&conn).unwrap();
        run_schema_migrations(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('trades_q', 'account_stats')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("queue.db");

        SqliteTradeQueue::open(&db_path, DEFAULT_BUSY_TIMEOUT_MS).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_open_reports_directory_failure_as_io() {
        // A regular file where the parent directory should be
        let blocker = NamedTempFile::new().unwrap();
        let db_path = blocker.path().join("queue.db");

        let result = open_connection(&db_path, DEFAULT_BUSY_TIMEOUT_MS);
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[tokio::test]
    async fn test_enqueue_inserts_unprocessed_row() {
        let (_temp, queue) = create_test_db();

        let id = queue.enqueue(&make_trade("acc-1", Side::Sell)).await.unwrap();

        let conn = queue.conn.lock().unwrap();
        let (account, side, processed, created_at): (String, String, bool, i64) = conn
            .query_row(
                "SELECT account, side, processed, created_at FROM trades_q WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();

        assert_eq!(account, "acc-1");
        assert_eq!(side, "sell");
        assert!(!processed);
        assert!(created_at > 0);
    }

    #[tokio::test]
    async fn test_enqueue_ids_increase() {
        let (_temp, queue) = create_test_db();

        let first = queue.enqueue(&make_trade("acc-1", Side::Buy)).await.unwrap();
        let second = queue.enqueue(&make_trade("acc-1", Side::Buy)).await.unwrap();

        assert!(second > first);
        assert_eq!(queue.pending_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_account_reads_as_zero() {
        let (_temp, queue) = create_test_db();

        let stats = queue.account_stats("nobody").await.unwrap();

        assert_eq!(stats, AccountStats::empty("nobody"));
    }

    #[tokio::test]
    async fn test_account_stats_reads_existing_row() {
        let (_temp, queue) = create_test_db();
        {
            let conn = queue.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO account_stats (account, trades, profit) VALUES (?1, ?2, ?3)",
                params!["acc-1", 4, -125.5],
            )
            .unwrap();
        }

        let stats = queue.account_stats("acc-1").await.unwrap();

        assert_eq!(stats.trades, 4);
        assert_eq!(stats.profit, -125.5);
    }

    #[tokio::test]
    async fn test_ping() {
        let (_temp, queue) = create_test_db();
        queue.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_fails_without_schema() {
        let (_temp, queue) = create_test_db();
        {
            let conn = queue.conn.lock().unwrap();
            conn.execute("DROP TABLE trades_q", []).unwrap();
        }

        let result = queue.enqueue(&make_trade("acc-1", Side::Buy)).await;

        assert!(matches!(result, Err(StorageError::Database(_))));
    }
}
