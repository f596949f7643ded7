//! Futures contracts, per-underlying chains and per-step snapshots.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// A single listed futures contract as observed at one time step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub symbol: String,
    pub underlying: String,
    pub expiry: NaiveDateTime,
}

impl Contract {
    pub fn new(
        symbol: impl Into<String>,
        underlying: impl Into<String>,
        expiry: NaiveDateTime,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            underlying: underlying.into(),
            expiry,
        }
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expiry <= now
    }
}

/// The contracts of one underlying visible at the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub underlying: String,
    pub contracts: Vec<Contract>,
}

impl Chain {
    pub fn new(underlying: impl Into<String>, contracts: Vec<Contract>) -> Self {
        Self {
            underlying: underlying.into(),
            contracts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }
}

/// All chains delivered for a single step, keyed by underlying.
///
/// Keys are kept ordered so every walk over the snapshot visits underlyings
/// in the same sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSnapshot {
    chains: BTreeMap<String, Chain>,
}

impl ChainSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the chain for `chain.underlying`.
    pub fn insert(&mut self, chain: Chain) {
        self.chains.insert(chain.underlying.clone(), chain);
    }

    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.insert(chain);
        self
    }

    pub fn get(&self, underlying: &str) -> Option<&Chain> {
        self.chains.get(underlying)
    }

    pub fn chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.values()
    }

    pub fn underlying_count(&self) -> usize {
        self.chains.len()
    }

    pub fn contract_count(&self) -> usize {
        self.chains.values().map(Chain::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl FromIterator<Chain> for ChainSnapshot {
    fn from_iter<I: IntoIterator<Item = Chain>>(iter: I) -> Self {
        let mut snapshot = ChainSnapshot::new();
        for chain in iter {
            snapshot.insert(chain);
        }
        snapshot
    }
}
