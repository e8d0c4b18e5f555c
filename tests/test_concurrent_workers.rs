//! Several workers, each on its own connection and thread, draining one queue
//!
//! Every item must be claimed by exactly one worker and the sum of
//! `trades` across accounts must equal the number of queued items.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tradeflow::pipeline::{
    calculate_profit, CycleOutcome, QueueWorker, Side, SqliteTradeQueue, Trade, TradeQueue,
};

const WORKERS: usize = 4;
const ITEMS: usize = 120;
const ACCOUNTS: [&str; 3] = ["acc-a", "acc-b", "acc-c"];
// Long enough that a blocked BEGIN IMMEDIATE never times out here
const BUSY_TIMEOUT_MS: u64 = 30_000;

fn trade(i: usize) -> Trade {
    Trade {
        account: ACCOUNTS[i % ACCOUNTS.len()].to_string(),
        symbol: "EURUSD".to_string(),
        volume: 1.0 + (i % 5) as f64,
        open: 1.1000,
        close: 1.1000 + (i % 7) as f64 * 0.001,
        side: if i % 2 == 0 { Side::Buy } else { Side::Sell },
    }
}

#[tokio::test]
async fn test_concurrent_workers_claim_each_item_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("concurrent.db");
    let queue = Arc::new(SqliteTradeQueue::open(&db_path, BUSY_TIMEOUT_MS).unwrap());

    let mut expected_profit = vec![0.0f64; ACCOUNTS.len()];
    for i in 0..ITEMS {
        let t = trade(i);
        expected_profit[i % ACCOUNTS.len()] += calculate_profit(t.volume, t.open, t.close, t.side);
        queue.enqueue(&t).await.unwrap();
    }

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let db_path = db_path.clone();
            thread::spawn(move || {
                let mut worker =
                    QueueWorker::open(&db_path, BUSY_TIMEOUT_MS, Duration::from_millis(1)).unwrap();
                let mut claimed = Vec::new();
                loop {
                    match worker.run_cycle() {
                        CycleOutcome::Processed { id, .. } => claimed.push(id),
                        CycleOutcome::Empty => break,
                        CycleOutcome::Failed(e) => panic!("unexpected failure: {}", e),
                    }
                }
                claimed
            })
        })
        .collect();

    let mut all_claimed = Vec::new();
    for handle in handles {
        all_claimed.extend(handle.join().unwrap());
    }

    let unique: HashSet<i64> = all_claimed.iter().copied().collect();
    assert_eq!(all_claimed.len(), ITEMS, "every item processed");
    assert_eq!(unique.len(), ITEMS, "no item processed twice");

    let mut total_trades = 0;
    for (idx, account) in ACCOUNTS.iter().enumerate() {
        let stats = queue.account_stats(account).await.unwrap();
        total_trades += stats.trades;
        assert!(
            (stats.profit - expected_profit[idx]).abs() < 1e-3,
            "{}: profit {} expected {}",
            account,
            stats.profit,
            expected_profit[idx]
        );
    }
    assert_eq!(total_trades, ITEMS as i64);
    assert_eq!(queue.pending_count().await.unwrap(), 0);
}
