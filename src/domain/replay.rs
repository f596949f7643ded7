//! Daily replay loop driving the selector.
//!
//! EngineConfig holds the run-wide settings fixed before the first step.

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};

use crate::domain::contract::{Chain, ChainSnapshot};
use crate::domain::error::ChainrollError;
use crate::domain::position::{Action, PositionState};
use crate::domain::selector::RolloverSelector;
use crate::ports::chain_port::ChainPort;
use crate::ports::market_port::MarketHours;
use crate::ports::order_port::OrderPort;

/// Replay range, starting cash and the roots to subscribe.
///
/// Fields are not checked here; `start_date > end_date` yields a replay with
/// no steps. Configuration loaded from a file is validated beforehand.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cash: f64,
    pub roots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub time: NaiveDateTime,
    pub action: Action,
}

#[derive(Debug, Clone, Default)]
pub struct ReplayResult {
    pub steps: Vec<StepRecord>,
    pub final_position: PositionState,
}

impl ReplayResult {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn entries(&self) -> usize {
        self.count(|a| matches!(a, Action::EnterLong { .. }))
    }

    pub fn liquidations(&self) -> usize {
        self.count(|a| matches!(a, Action::Liquidate))
    }

    pub fn no_ops(&self) -> usize {
        self.count(Action::is_no_op)
    }

    fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.action)).count()
    }
}

/// Step times between `start` and `end` inclusive, one per trading day at
/// midnight.
pub fn trading_steps(
    market: &dyn MarketHours,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDateTime> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| market.is_trading_day(*d))
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
        .collect()
}

/// Chains of every root as visible at `now`: listed contracts not yet expired.
pub fn build_snapshot(
    chain_port: &dyn ChainPort,
    roots: &[String],
    now: NaiveDateTime,
) -> Result<ChainSnapshot, ChainrollError> {
    let mut snapshot = ChainSnapshot::new();
    for root in roots {
        let contracts = chain_port
            .listed_contracts(root)?
            .into_iter()
            .filter(|c| !c.is_expired(now))
            .collect();
        snapshot.insert(Chain::new(root.clone(), contracts));
    }
    Ok(snapshot)
}

fn route(
    orders: &mut dyn OrderPort,
    action: &Action,
    now: NaiveDateTime,
) -> Result<(), ChainrollError> {
    match action {
        Action::NoOp => Ok(()),
        Action::EnterLong { symbol, quantity } => orders.market_order(symbol, *quantity, now),
        Action::Liquidate => orders.liquidate(now),
    }
}

pub fn run_replay(
    chain_port: &dyn ChainPort,
    market: &dyn MarketHours,
    orders: &mut dyn OrderPort,
    selector: &RolloverSelector,
    config: &EngineConfig,
) -> Result<ReplayResult, ChainrollError> {
    let steps = trading_steps(market, config.start_date, config.end_date);
    info!(
        "replaying {} steps from {} to {} over {}",
        steps.len(),
        config.start_date,
        config.end_date,
        config.roots.join(",")
    );

    let mut position = PositionState::Flat;
    let mut result = ReplayResult::default();

    for now in steps {
        if orders.is_invested() == position.is_flat() {
            warn!(
                "{now}: order sink invested={} but selector state is {:?}",
                orders.is_invested(),
                position
            );
        }

        let snapshot = build_snapshot(chain_port, &config.roots, now)?;
        debug!(
            "{now}: {} contracts across {} chains",
            snapshot.contract_count(),
            snapshot.underlying_count()
        );

        let action = selector.decide(now, &snapshot, &position, market);
        route(orders, &action, now)?;
        position.apply(&action);

        if !action.is_no_op() {
            info!("{now}: {action}");
        }
        result.steps.push(StepRecord { time: now, action });
    }

    result.final_position = position;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::Contract;
    use crate::domain::selector::SelectorConfig;
    use chrono::{Datelike, Weekday};
    use std::collections::HashMap;

    struct Listing(HashMap<String, Vec<Contract>>);

    impl ChainPort for Listing {
        fn listed_contracts(&self, underlying: &str) -> Result<Vec<Contract>, ChainrollError> {
            Ok(self.0.get(underlying).cloned().unwrap_or_default())
        }

        fn underlyings(&self) -> Result<Vec<String>, ChainrollError> {
            Ok(self.0.keys().cloned().collect())
        }
    }

    struct Weekdays;

    impl MarketHours for Weekdays {
        fn is_market_open(&self, _symbol: &str, at: NaiveDateTime) -> bool {
            self.is_trading_day(at.date())
        }

        fn is_trading_day(&self, date: NaiveDate) -> bool {
            !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
        }
    }

    #[derive(Default)]
    struct Recorder {
        orders: Vec<(String, i64)>,
        held: Vec<String>,
    }

    impl OrderPort for Recorder {
        fn market_order(
            &mut self,
            symbol: &str,
            quantity: i64,
            _at: NaiveDateTime,
        ) -> Result<(), ChainrollError> {
            self.orders.push((symbol.to_string(), quantity));
            self.held.push(symbol.to_string());
            Ok(())
        }

        fn liquidate(&mut self, _at: NaiveDateTime) -> Result<(), ChainrollError> {
            for symbol in self.held.drain(..) {
                self.orders.push((symbol, -1));
            }
            Ok(())
        }

        fn is_invested(&self) -> bool {
            !self.held.is_empty()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn listing() -> Listing {
        let expiry = date(2014, 3, 21).and_hms_opt(13, 30, 0).unwrap();
        Listing(HashMap::from([(
            "ES".to_string(),
            vec![
                Contract::new("ESZ13", "ES", date(2013, 12, 20).and_hms_opt(13, 30, 0).unwrap()),
                Contract::new("ESH14", "ES", expiry),
            ],
        )]))
    }

    fn config(start: NaiveDate, end: NaiveDate) -> EngineConfig {
        EngineConfig {
            start_date: start,
            end_date: end,
            cash: 1_000_000.0,
            roots: vec!["ES".into()],
        }
    }

    #[test]
    fn trading_steps_skip_weekends() {
        // 2013-10-07 is a Monday
        let steps = trading_steps(&Weekdays, date(2013, 10, 7), date(2013, 10, 13));
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].date(), date(2013, 10, 7));
        assert_eq!(steps[4].date(), date(2013, 10, 11));
    }

    #[test]
    fn trading_steps_empty_when_end_before_start() {
        assert!(trading_steps(&Weekdays, date(2013, 10, 8), date(2013, 10, 7)).is_empty());
    }

    #[test]
    fn snapshot_drops_expired_contracts() {
        let now = date(2014, 1, 2).and_hms_opt(0, 0, 0).unwrap();
        let snapshot = build_snapshot(&listing(), &["ES".to_string(), "GC".to_string()], now).unwrap();
        let es = snapshot.get("ES").unwrap();
        assert_eq!(es.len(), 1);
        assert_eq!(es.contracts[0].symbol, "ESH14");
        assert!(snapshot.get("GC").unwrap().is_empty());
    }

    #[test]
    fn replay_alternates_entry_and_liquidation() {
        let selector = RolloverSelector::new(SelectorConfig::default()).unwrap();
        let mut orders = Recorder::default();
        // Tue 2013-10-08 .. Fri 2013-10-11: ESH14 is > 90 days out throughout
        let cfg = config(date(2013, 10, 8), date(2013, 10, 11));

        let result = run_replay(&listing(), &Weekdays, &mut orders, &selector, &cfg).unwrap();

        assert_eq!(result.step_count(), 4);
        assert_eq!(result.entries(), 2);
        assert_eq!(result.liquidations(), 2);
        assert_eq!(result.no_ops(), 0);
        assert!(result.final_position.is_flat());
        assert_eq!(
            orders.orders,
            vec![
                ("ESH14".to_string(), 1),
                ("ESH14".to_string(), -1),
                ("ESH14".to_string(), 1),
                ("ESH14".to_string(), -1),
            ]
        );
    }

    #[test]
    fn replay_no_ops_once_horizon_excludes_everything() {
        let selector = RolloverSelector::new(SelectorConfig::default()).unwrap();
        let mut orders = Recorder::default();
        let cfg = config(date(2014, 1, 6), date(2014, 1, 7));

        let result = run_replay(&listing(), &Weekdays, &mut orders, &selector, &cfg).unwrap();

        assert_eq!(result.step_count(), 2);
        assert_eq!(result.no_ops(), 2);
        assert!(orders.orders.is_empty());
    }
}
