//! In-memory order sink that records market orders without pricing them.

use crate::domain::error::ChainrollError;
use crate::ports::order_port::OrderPort;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEvent {
    pub time: NaiveDateTime,
    pub symbol: String,
    pub quantity: i64,
}

#[derive(Debug, Default)]
pub struct PaperBroker {
    holdings: BTreeMap<String, i64>,
    events: Vec<OrderEvent>,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[OrderEvent] {
        &self.events
    }

    pub fn holding(&self, symbol: &str) -> i64 {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    /// Writes the order log as `time,symbol,quantity` CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ChainrollError> {
        let mut wtr = csv::Writer::from_writer(writer);
        let to_err = |e: csv::Error| ChainrollError::Io(std::io::Error::other(e));

        wtr.write_record(["time", "symbol", "quantity"]).map_err(to_err)?;
        for event in &self.events {
            wtr.write_record([
                event.time.format("%Y-%m-%d %H:%M:%S").to_string(),
                event.symbol.clone(),
                event.quantity.to_string(),
            ])
            .map_err(to_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn record(&mut self, symbol: &str, quantity: i64, at: NaiveDateTime) {
        let held = self.holdings.entry(symbol.to_string()).or_insert(0);
        *held += quantity;
        if *held == 0 {
            self.holdings.remove(symbol);
        }
        self.events.push(OrderEvent {
            time: at,
            symbol: symbol.to_string(),
            quantity,
        });
    }
}

impl OrderPort for PaperBroker {
    fn market_order(
        &mut self,
        symbol: &str,
        quantity: i64,
        at: NaiveDateTime,
    ) -> Result<(), ChainrollError> {
        if quantity == 0 {
            return Err(ChainrollError::Order {
                symbol: symbol.to_string(),
                reason: "zero quantity".into(),
            });
        }
        self.record(symbol, quantity, at);
        Ok(())
    }

    fn liquidate(&mut self, at: NaiveDateTime) -> Result<(), ChainrollError> {
        let open: Vec<(String, i64)> = self
            .holdings
            .iter()
            .map(|(s, q)| (s.clone(), *q))
            .collect();
        for (symbol, quantity) in open {
            self.record(&symbol, -quantity, at);
        }
        Ok(())
    }

    fn is_invested(&self) -> bool {
        !self.holdings.is_empty()
    }
}
