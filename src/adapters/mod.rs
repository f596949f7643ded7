//! Concrete adapter implementations for ports.

pub mod calendar_adapter;
pub mod csv_chain_adapter;
pub mod file_config_adapter;
pub mod paper_broker;
