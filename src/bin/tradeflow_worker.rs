//! Queue worker - folds queued trades into per-account stats
//!
//! Usage:
//!   cargo run --release --bin tradeflow_worker
//!
//! Environment variables:
//!   TRADEFLOW_DB_PATH - SQLite database path (default: data.db)
//!   WORKER_POLL_INTERVAL_MS - Backoff between cycles (default: 100)
//!   SQLITE_BUSY_TIMEOUT_MS - Wait for another worker's claim (default: 5000)

use dotenv::dotenv;
use log::{error, info};
use tokio::sync::watch;
use tradeflow::config::WorkerConfig;
use tradeflow::pipeline::QueueWorker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("🚀 Starting tradeflow worker");

    let config = WorkerConfig::from_env();
    info!("   ├─ Database: {}", config.db_path);
    info!("   └─ Poll interval: {:?}", config.poll_interval);

    // Cannot open storage at all: abort before any processing
    let worker = QueueWorker::open(&config.db_path, config.busy_timeout_ms, config.poll_interval)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(worker.run(shutdown_rx));

    info!("🔄 Press CTRL+C to shutdown gracefully");
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("⚠️  Received CTRL+C, finishing current cycle..."),
        Err(err) => error!("❌ Failed to listen for CTRL+C: {}", err),
    }

    // The in-flight transaction either commits or rolls back before the loop exits
    let _ = shutdown_tx.send(true);
    let metrics = handle.await?;

    info!(
        "✅ Worker runtime stopped ({} cycles, {} processed)",
        metrics.cycles, metrics.processed
    );
    Ok(())
}
