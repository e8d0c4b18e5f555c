//! Trade ingestion server
//!
//! Usage:
//!   cargo run --release --bin tradeflow_server
//!
//! Environment variables:
//!   TRADEFLOW_DB_PATH - SQLite database path (default: data.db)
//!   TRADEFLOW_LISTEN_ADDR - Bind address or bare port (default: 0.0.0.0:8080)
//!   SQLITE_BUSY_TIMEOUT_MS - Wait for a locked database (default: 5000)

use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;
use tradeflow::config::ServerConfig;
use tradeflow::pipeline::{IngestionGate, SqliteTradeQueue};
use tradeflow::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("🚀 Starting tradeflow server");

    let config = ServerConfig::from_env()?;
    info!("   ├─ Database: {}", config.db_path);
    info!("   └─ Listen: {}", config.listen_addr);

    // Startup failures are fatal: nothing is served without storage
    let queue = Arc::new(SqliteTradeQueue::open(&config.db_path, config.busy_timeout_ms)?);
    let gate = IngestionGate::new(queue);
    info!("✅ Database initialized");

    let listener = TcpListener::bind(config.listen_addr).await?;

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("⚠️  Received CTRL+C, shutting down..."),
            Err(err) => error!("❌ Failed to listen for CTRL+C: {}", err),
        }
    };

    server::serve(listener, gate, shutdown).await?;

    info!("✅ Server stopped");
    Ok(())
}
