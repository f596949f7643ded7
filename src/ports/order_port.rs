//! Order routing port trait.
//!
//! Orders are fire-and-forget: fills and accounting belong to the
//! implementation, not to the caller.

use chrono::NaiveDateTime;

use crate::domain::error::ChainrollError;

pub trait OrderPort {
    fn market_order(
        &mut self,
        symbol: &str,
        quantity: i64,
        at: NaiveDateTime,
    ) -> Result<(), ChainrollError>;

    /// Closes every open holding.
    fn liquidate(&mut self, at: NaiveDateTime) -> Result<(), ChainrollError>;

    fn is_invested(&self) -> bool;
}
