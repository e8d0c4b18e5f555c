//! Ingestion Gate - validate, then append to the queue
//!
//! Runs once per inbound request. Concurrent submissions are independent
//! single-row inserts, so the gate holds no state of its own.

use super::db::TradeQueue;
use super::types::TradeRecord;
use super::validation::validate;
use crate::error::IngestError;
use std::sync::Arc;

#[derive(Clone)]
pub struct IngestionGate {
    queue: Arc<dyn TradeQueue>,
}

impl IngestionGate {
    pub fn new(queue: Arc<dyn TradeQueue>) -> Self {
        Self { queue }
    }

    /// Validate `record` and enqueue it; returns the new queue id
    ///
    /// A `ValidationError` means nothing was written. A `StorageError`
    /// means the single INSERT failed and nothing was written either.
    pub async fn submit(&self, record: TradeRecord) -> Result<i64, IngestError> {
        let trade = match validate(record) {
            Ok(trade) => trade,
            Err(e) => {
                log::debug!("Rejected trade: {}", e);
                return Err(e.into());
            }
        };

        let id = self.queue.enqueue(&trade).await.map_err(|e| {
            log::error!("❌ Failed to enqueue trade for {}: {}", trade.account, e);
            e
        })?;

        log::debug!(
            "📥 Enqueued trade {} {} {} {:.2}@{} for {}",
            id,
            trade.side.as_str(),
            trade.symbol,
            trade.volume,
            trade.open,
            trade.account
        );

        Ok(id)
    }

    /// Underlying queue, for the read-only query paths
    pub fn queue(&self) -> &Arc<dyn TradeQueue> {
        &self.queue
    }
}
