//! Front-contract selection and single-position rollover decisions.
//!
//! Each step the selector either liquidates whatever is held, or, when flat,
//! picks the farthest-dated eligible contract and enters it if its market is
//! open. Only one contract is ever entered per step, whatever the number of
//! subscribed underlyings.

use chrono::NaiveDateTime;
use log::debug;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::domain::contract::{Chain, ChainSnapshot, Contract};
use crate::domain::error::ChainrollError;
use crate::domain::filter::FilterConfig;
use crate::domain::position::{Action, PositionState};
use crate::ports::market_port::MarketHours;

/// How a single entry is chosen when several underlyings have a tradable
/// front contract in the same step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// Underlyings are visited in identifier order; the first tradable wins.
    #[default]
    FirstEligible,
    /// The tradable front contract with the latest expiry wins.
    FarthestExpiry,
}

impl FromStr for AggregationPolicy {
    type Err = ChainrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first_eligible" => Ok(AggregationPolicy::FirstEligible),
            "farthest_expiry" => Ok(AggregationPolicy::FarthestExpiry),
            other => Err(ChainrollError::invalid(
                "selection",
                "aggregation",
                format!("unknown aggregation policy '{other}' (expected first_eligible or farthest_expiry)"),
            )),
        }
    }
}

/// Settings fixed when the selector is built: the expiry filter, the lot
/// size of each entry, and how underlyings are weighed against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    pub filter: FilterConfig,
    pub quantity: i64,
    pub aggregation: AggregationPolicy,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            quantity: 1,
            aggregation: AggregationPolicy::default(),
        }
    }
}

/// Per-underlying selection result before the market-open check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub underlying: &'a str,
    pub front: Option<&'a Contract>,
}

/// Latest expiry first; equal expiries fall back to the smaller symbol.
fn by_expiry_then_symbol(a: &&Contract, b: &&Contract) -> Ordering {
    a.expiry
        .cmp(&b.expiry)
        .then_with(|| b.symbol.cmp(&a.symbol))
}

#[derive(Debug, Clone)]
pub struct RolloverSelector {
    config: SelectorConfig,
}

impl RolloverSelector {
    pub fn new(config: SelectorConfig) -> Result<Self, ChainrollError> {
        if config.quantity <= 0 {
            return Err(ChainrollError::invalid(
                "selection",
                "quantity",
                "quantity must be positive",
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// The farthest-dated eligible contract of `chain`, if any.
    pub fn front_contract<'a>(&self, now: NaiveDateTime, chain: &'a Chain) -> Option<&'a Contract> {
        chain
            .contracts
            .iter()
            .filter(|c| self.config.filter.is_eligible(c, now))
            .max_by(by_expiry_then_symbol)
    }

    pub fn candidates<'a>(
        &self,
        now: NaiveDateTime,
        snapshot: &'a ChainSnapshot,
    ) -> Vec<Candidate<'a>> {
        snapshot
            .chains()
            .map(|chain| Candidate {
                underlying: &chain.underlying,
                front: self.front_contract(now, chain),
            })
            .collect()
    }

    /// Pure decision for one step; calling it twice with the same inputs
    /// gives the same action.
    pub fn decide(
        &self,
        now: NaiveDateTime,
        snapshot: &ChainSnapshot,
        position: &PositionState,
        market: &dyn MarketHours,
    ) -> Action {
        if let PositionState::Holding(symbol) = position {
            debug!("{now}: holding {symbol}, liquidating");
            return Action::Liquidate;
        }

        let candidates = self.candidates(now, snapshot);
        let mut tradable = candidates.iter().filter_map(|candidate| {
            let Some(front) = candidate.front else {
                debug!("{now}: no eligible contract for {}", candidate.underlying);
                return None;
            };
            if market.is_market_open(&front.symbol, now) {
                Some(front)
            } else {
                debug!("{now}: market closed for {}", front.symbol);
                None
            }
        });

        let chosen = match self.config.aggregation {
            AggregationPolicy::FirstEligible => tradable.next(),
            AggregationPolicy::FarthestExpiry => tradable.max_by(by_expiry_then_symbol),
        };

        match chosen {
            Some(contract) => Action::EnterLong {
                symbol: contract.symbol.clone(),
                quantity: self.config.quantity,
            },
            None => Action::NoOp,
        }
    }

    /// [`decide`](Self::decide) followed by the position transition.
    pub fn step(
        &self,
        now: NaiveDateTime,
        snapshot: &ChainSnapshot,
        position: &mut PositionState,
        market: &dyn MarketHours,
    ) -> Action {
        let action = self.decide(now, snapshot, position, market);
        position.apply(&action);
        action
    }
}
