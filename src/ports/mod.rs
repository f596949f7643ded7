//! Port traits: the surfaces a trading-engine framework would provide.

pub mod config_port;
pub mod chain_port;
pub mod market_port;
pub mod order_port;
