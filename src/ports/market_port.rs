//! Market session port trait.

use chrono::{NaiveDate, NaiveDateTime};

pub trait MarketHours {
    /// Whether `symbol` can be traded at `at`.
    fn is_market_open(&self, symbol: &str, at: NaiveDateTime) -> bool;

    /// Whether the scheduler should deliver a step on `date` at all.
    fn is_trading_day(&self, date: NaiveDate) -> bool;
}
