//! Profit of a single trade

use super::types::{QueueItem, Side};

/// Units per lot; converts a price delta times volume into money
pub const LOT_SIZE: f64 = 100_000.0;

/// Largest absolute profit a single trade may carry into the stats
pub const MAX_TRADE_PROFIT: f64 = 1e15;

/// `(close - open) * volume * LOT_SIZE`, negated for sells
///
/// Inputs are assumed validated (positive, finite).
pub fn calculate_profit(volume: f64, open: f64, close: f64, side: Side) -> f64 {
    let profit = (close - open) * volume * LOT_SIZE;
    match side {
        Side::Buy => profit,
        Side::Sell => -profit,
    }
}

/// Profit of a claimed queue item
pub fn item_profit(item: &QueueItem) -> f64 {
    calculate_profit(item.volume, item.open, item.close, item.side)
}
