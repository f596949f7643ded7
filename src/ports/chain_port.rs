//! Contract listing port trait.

use crate::domain::contract::Contract;
use crate::domain::error::ChainrollError;

/// Source of listed futures contracts, one underlying at a time.
pub trait ChainPort {
    /// Every contract ever listed for `underlying`, expired or not.
    fn listed_contracts(&self, underlying: &str) -> Result<Vec<Contract>, ChainrollError>;

    fn underlyings(&self) -> Result<Vec<String>, ChainrollError>;
}
