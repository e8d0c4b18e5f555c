//! Ingestion rules a trade must pass before it may be enqueued
//!
//! | field               | rule                          |
//! |---------------------|-------------------------------|
//! | account             | non-empty                     |
//! | symbol              | exactly 6 uppercase A-Z       |
//! | volume, open, close | finite and strictly > 0       |
//! | side                | exactly "buy" or "sell"       |
//! | profit (derived)    | abs <= MAX_TRADE_PROFIT       |
//!
//! Rules are checked in table order and the first violation is returned.
//!
//! The profit bound keeps every stored value finite: a running total of
//! bounded trades cannot reach f64 overflow before the i64 trade counter
//! does, so the worker never meets a trade it cannot fold in.

use super::profit::{calculate_profit, MAX_TRADE_PROFIT};
use super::types::{Side, Trade, TradeRecord};
use crate::error::ValidationError;

pub const SYMBOL_LEN: usize = 6;

/// Validate a raw record and convert it into a `Trade`
pub fn validate(record: TradeRecord) -> Result<Trade, ValidationError> {
    if record.account.is_empty() {
        return Err(ValidationError::EmptyAccount);
    }

    if !is_valid_symbol(&record.symbol) {
        return Err(ValidationError::InvalidSymbol(record.symbol));
    }

    for (field, value) in [
        ("volume", record.volume),
        ("open", record.open),
        ("close", record.close),
    ] {
        // NaN fails the comparison too
        if !(value.is_finite() && value > 0.0) {
            return Err(ValidationError::NonPositive { field, value });
        }
    }

    let side = Side::parse(&record.side).ok_or(ValidationError::InvalidSide(record.side))?;

    // Finite positive inputs can still multiply out to +/-inf
    let profit = calculate_profit(record.volume, record.open, record.close, side);
    if !(profit.is_finite() && profit.abs() <= MAX_TRADE_PROFIT) {
        return Err(ValidationError::ProfitOutOfRange(profit));
    }

    Ok(Trade {
        account: record.account,
        symbol: record.symbol,
        volume: record.volume,
        open: record.open,
        close: record.close,
        side,
    })
}

fn is_valid_symbol(symbol: &str) -> bool {
    symbol.len() == SYMBOL_LEN && symbol.bytes().all(|b| b.is_ascii_uppercase())
}
