//! Core data types for the trade queue
//!
//! Table mapping (see `sql/`):
//! - `trades_q` → `QueueItem`
//! - `account_stats` → `AccountStats`

use serde::{Deserialize, Serialize};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    /// Parse the exact wire/database spelling; anything else is rejected
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }
}

/// Inbound trade as submitted by a client, before validation
///
/// `side` stays a string here so an unknown value surfaces as a
/// validation error instead of a JSON decoding error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub account: String,
    pub symbol: String,
    pub volume: f64,
    pub open: f64,
    pub close: f64,
    pub side: String,
}

/// A trade that passed every ingestion rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub account: String,
    pub symbol: String,
    pub volume: f64,
    pub open: f64,
    pub close: f64,
    pub side: Side,
}

/// One row of `trades_q`
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub id: i64,
    pub account: String,
    pub symbol: String,
    pub volume: f64,
    pub open: f64,
    pub close: f64,
    pub side: Side,
    /// Unix epoch milliseconds at insert; primary processing order
    pub created_at: i64,
    pub processed: bool,
}

/// Running aggregate for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStats {
    pub account: String,
    pub trades: i64,
    pub profit: f64,
}

impl AccountStats {
    /// Stats for an account with no processed trades
    pub fn empty(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            trades: 0,
            profit: 0.0,
        }
    }
}
