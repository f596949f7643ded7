#![allow(dead_code)]

use chainroll::domain::contract::Contract;
use chainroll::domain::error::ChainrollError;
use chainroll::ports::chain_port::ChainPort;
use chainroll::ports::market_port::MarketHours;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use std::collections::{BTreeMap, HashSet};

pub struct MockChainPort {
    pub listings: BTreeMap<String, Vec<Contract>>,
    pub errors: BTreeMap<String, String>,
}

impl MockChainPort {
    pub fn new() -> Self {
        Self {
            listings: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_contract(mut self, underlying: &str, symbol: &str, expiry: NaiveDateTime) -> Self {
        self.listings
            .entry(underlying.to_string())
            .or_default()
            .push(Contract::new(symbol, underlying, expiry));
        self
    }

    pub fn with_error(mut self, underlying: &str, reason: &str) -> Self {
        self.errors.insert(underlying.to_string(), reason.to_string());
        self
    }
}

impl ChainPort for MockChainPort {
    fn listed_contracts(&self, underlying: &str) -> Result<Vec<Contract>, ChainrollError> {
        if let Some(reason) = self.errors.get(underlying) {
            return Err(ChainrollError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.listings.get(underlying).cloned().unwrap_or_default())
    }

    fn underlyings(&self) -> Result<Vec<String>, ChainrollError> {
        Ok(self.listings.keys().cloned().collect())
    }
}

/// Weekday market that can be closed for chosen symbols.
pub struct MockMarket {
    pub closed_symbols: HashSet<String>,
}

impl MockMarket {
    pub fn open() -> Self {
        Self {
            closed_symbols: HashSet::new(),
        }
    }

    pub fn closed_for(symbols: &[&str]) -> Self {
        Self {
            closed_symbols: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MarketHours for MockMarket {
    fn is_market_open(&self, symbol: &str, at: NaiveDateTime) -> bool {
        self.is_trading_day(at.date()) && !self.closed_symbols.contains(symbol)
    }

    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
}

pub fn expiry(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(13, 30, 0).unwrap()
}

/// Quarterly ES and monthly-ish GC listings around the 2013-2014 period.
pub fn sample_listing() -> MockChainPort {
    MockChainPort::new()
        .with_contract("ES", "ESZ13", expiry(2013, 12, 20))
        .with_contract("ES", "ESH14", expiry(2014, 3, 21))
        .with_contract("ES", "ESM14", expiry(2014, 6, 20))
        .with_contract("ES", "ESU14", expiry(2014, 9, 19))
        .with_contract("GC", "GCZ13", expiry(2013, 12, 27))
        .with_contract("GC", "GCG14", expiry(2014, 2, 26))
        .with_contract("GC", "GCJ14", expiry(2014, 4, 28))
}
