//! Weekday/holiday market calendar.

use crate::domain::config_validation::parse_holidays;
use crate::domain::error::ChainrollError;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_port::MarketHours;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use std::collections::BTreeSet;

/// Open Monday to Friday except listed holidays, for every symbol alike.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays<I: IntoIterator<Item = NaiveDate>>(mut self, holidays: I) -> Self {
        self.holidays.extend(holidays);
        self
    }

    /// Builds a calendar from `[market] holidays`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ChainrollError> {
        let holidays = match config.get_string("market", "holidays") {
            Some(s) => parse_holidays(&s)?,
            None => Vec::new(),
        };
        Ok(Self::new().with_holidays(holidays))
    }

    pub fn holiday_count(&self) -> usize {
        self.holidays.len()
    }
}

impl MarketHours for WeekdayCalendar {
    fn is_market_open(&self, _symbol: &str, at: NaiveDateTime) -> bool {
        self.is_trading_day(at.date())
    }

    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}
