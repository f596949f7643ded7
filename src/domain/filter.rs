//! Expiry filtering: per-underlying subscription windows and the entry horizon.

use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeMap;

use crate::domain::contract::Contract;
use crate::domain::error::ChainrollError;

pub const DEFAULT_MIN_HORIZON_DAYS: i64 = 90;
pub const DEFAULT_MAX_EXPIRY_DAYS: i64 = 182;
/// Upper bound on any configured day count (horizon or window edge).
pub const MAX_CONFIG_DAYS: i64 = 36_500;

fn offset(now: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    Duration::try_days(days).and_then(|d| now.checked_add_signed(d))
}

/// Inclusive `[min_days, max_days]` range of days-to-expiry a contract must
/// fall in to be visible for its underlying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWindow {
    pub min_days: i64,
    pub max_days: i64,
}

impl ExpiryWindow {
    pub fn new(min_days: i64, max_days: i64) -> Result<Self, ChainrollError> {
        if min_days < 0 {
            return Err(ChainrollError::invalid(
                "filter",
                "min_expiry_days",
                "min_expiry_days must be non-negative",
            ));
        }
        if max_days < min_days {
            return Err(ChainrollError::invalid(
                "filter",
                "max_expiry_days",
                "max_expiry_days must not be less than min_expiry_days",
            ));
        }
        if max_days > MAX_CONFIG_DAYS {
            return Err(ChainrollError::invalid(
                "filter",
                "max_expiry_days",
                format!("max_expiry_days must not exceed {MAX_CONFIG_DAYS}"),
            ));
        }
        Ok(Self { min_days, max_days })
    }

    /// A bound that cannot be represented as a date admits nothing.
    pub fn admits(&self, contract: &Contract, now: NaiveDateTime) -> bool {
        match (offset(now, self.min_days), offset(now, self.max_days)) {
            (Some(lo), Some(hi)) => contract.expiry >= lo && contract.expiry <= hi,
            _ => false,
        }
    }
}

impl Default for ExpiryWindow {
    fn default() -> Self {
        Self {
            min_days: 0,
            max_days: DEFAULT_MAX_EXPIRY_DAYS,
        }
    }
}

/// Immutable filter settings fixed at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    min_horizon: Duration,
    windows: BTreeMap<String, ExpiryWindow>,
}

impl FilterConfig {
    pub fn new(min_horizon_days: i64) -> Result<Self, ChainrollError> {
        if min_horizon_days < 0 {
            return Err(ChainrollError::invalid(
                "selection",
                "min_horizon_days",
                "min_horizon_days must be non-negative",
            ));
        }
        if min_horizon_days > MAX_CONFIG_DAYS {
            return Err(ChainrollError::invalid(
                "selection",
                "min_horizon_days",
                format!("min_horizon_days must not exceed {MAX_CONFIG_DAYS}"),
            ));
        }
        Ok(Self {
            min_horizon: Duration::days(min_horizon_days),
            windows: BTreeMap::new(),
        })
    }

    pub fn with_window(mut self, underlying: impl Into<String>, window: ExpiryWindow) -> Self {
        self.windows.insert(underlying.into(), window);
        self
    }

    pub fn min_horizon(&self) -> Duration {
        self.min_horizon
    }

    pub fn window(&self, underlying: &str) -> Option<&ExpiryWindow> {
        self.windows.get(underlying)
    }

    /// A contract is eligible when it sits inside its underlying's window
    /// (if one is configured) and expires strictly after `now + horizon`.
    pub fn is_eligible(&self, contract: &Contract, now: NaiveDateTime) -> bool {
        let in_window = self
            .windows
            .get(&contract.underlying)
            .is_none_or(|w| w.admits(contract, now));
        in_window
            && now
                .checked_add_signed(self.min_horizon)
                .is_some_and(|limit| contract.expiry > limit)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_horizon: Duration::days(DEFAULT_MIN_HORIZON_DAYS),
            windows: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 10, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn contract_in(days: i64) -> Contract {
        Contract::new(format!("ES+{days}"), "ES", now() + Duration::days(days))
    }

    #[test]
    fn negative_horizon_rejected() {
        let err = FilterConfig::new(-1).unwrap_err();
        assert!(
            matches!(err, ChainrollError::ConfigInvalid { key, .. } if key == "min_horizon_days")
        );
    }

    #[test]
    fn inverted_window_rejected() {
        let err = ExpiryWindow::new(30, 10).unwrap_err();
        assert!(
            matches!(err, ChainrollError::ConfigInvalid { key, .. } if key == "max_expiry_days")
        );
    }

    #[test]
    fn oversized_day_counts_rejected() {
        let err = FilterConfig::new(100_000_000).unwrap_err();
        assert!(
            matches!(err, ChainrollError::ConfigInvalid { key, .. } if key == "min_horizon_days")
        );
        assert!(FilterConfig::new(MAX_CONFIG_DAYS).is_ok());
        assert!(ExpiryWindow::new(0, MAX_CONFIG_DAYS + 1).is_err());
    }

    #[test]
    fn unrepresentable_bounds_are_not_eligible() {
        let late = NaiveDateTime::MAX - Duration::days(10);
        let contract = Contract::new("ESZ99", "ES", NaiveDateTime::MAX);
        assert!(!FilterConfig::default().is_eligible(&contract, late));

        let window = ExpiryWindow {
            min_days: 0,
            max_days: i64::MAX,
        };
        assert!(!window.admits(&contract_in(30), now()));
    }

    #[test]
    fn negative_window_rejected() {
        assert!(ExpiryWindow::new(-5, 10).is_err());
    }

    #[test]
    fn horizon_is_strict() {
        let filter = FilterConfig::new(90).unwrap();
        assert!(!filter.is_eligible(&contract_in(90), now()));
        assert!(filter.is_eligible(&contract_in(91), now()));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = ExpiryWindow::new(0, 182).unwrap();
        assert!(window.admits(&contract_in(0), now()));
        assert!(window.admits(&contract_in(182), now()));
        assert!(!window.admits(&contract_in(183), now()));
    }

    #[test]
    fn window_applies_only_to_its_underlying() {
        let filter = FilterConfig::new(90)
            .unwrap()
            .with_window("GC", ExpiryWindow::new(0, 100).unwrap());
        let es = contract_in(300);
        let gc = Contract::new("GCZ14", "GC", now() + Duration::days(300));
        assert!(filter.is_eligible(&es, now()));
        assert!(!filter.is_eligible(&gc, now()));
    }

    #[test]
    fn default_uses_ninety_day_horizon() {
        let filter = FilterConfig::default();
        assert_eq!(filter.min_horizon(), Duration::days(90));
        assert!(filter.window("ES").is_none());
    }
}
