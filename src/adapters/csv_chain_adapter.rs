//! CSV contract listing adapter.
//!
//! Expects a header row followed by `underlying,symbol,expiry` records.

use crate::domain::contract::Contract;
use crate::domain::error::ChainrollError;
use crate::ports::chain_port::ChainPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

pub struct CsvChainAdapter {
    listings: BTreeMap<String, Vec<Contract>>,
}

/// Accepts `YYYY-MM-DD HH:MM:SS` or a bare date, which is read as midnight.
pub fn parse_expiry(value: &str) -> Result<NaiveDateTime, ChainrollError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| ChainrollError::Data {
            reason: format!("invalid expiry '{}': {}", value, e),
        })
}

impl CsvChainAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ChainrollError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ChainrollError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_reader(content.as_bytes())
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, ChainrollError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut listings: BTreeMap<String, Vec<Contract>> = BTreeMap::new();
        let mut seen: HashMap<String, (String, NaiveDateTime)> = HashMap::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| ChainrollError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let field = |idx: usize, name: &'static str| {
                record
                    .get(idx)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| ChainrollError::Data {
                        reason: format!("record {}: missing {} column", line + 1, name),
                    })
            };

            let underlying = field(0, "underlying")?.to_uppercase();
            let symbol = field(1, "symbol")?.to_string();
            let expiry = parse_expiry(field(2, "expiry")?)?;

            if let Some((prev_underlying, prev_expiry)) = seen.get(&symbol) {
                if *prev_underlying != underlying || *prev_expiry != expiry {
                    return Err(ChainrollError::Data {
                        reason: format!(
                            "record {}: {} already listed as {} expiring {}",
                            line + 1,
                            symbol,
                            prev_underlying,
                            prev_expiry
                        ),
                    });
                }
                continue;
            }
            seen.insert(symbol.clone(), (underlying.clone(), expiry));

            listings
                .entry(underlying.clone())
                .or_default()
                .push(Contract::new(symbol, underlying, expiry));
        }

        for contracts in listings.values_mut() {
            contracts.sort_by(|a, b| a.expiry.cmp(&b.expiry).then_with(|| a.symbol.cmp(&b.symbol)));
        }

        Ok(Self { listings })
    }

    pub fn contract_count(&self) -> usize {
        self.listings.values().map(Vec::len).sum()
    }
}

impl ChainPort for CsvChainAdapter {
    fn listed_contracts(&self, underlying: &str) -> Result<Vec<Contract>, ChainrollError> {
        Ok(self
            .listings
            .get(&underlying.to_uppercase())
            .cloned()
            .unwrap_or_default())
    }

    fn underlyings(&self) -> Result<Vec<String>, ChainrollError> {
        Ok(self.listings.keys().cloned().collect())
    }
}
