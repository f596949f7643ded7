//! Core domain types and logic.

pub mod contract;
pub mod filter;
pub mod position;
pub mod selector;
pub mod replay;
pub mod config_validation;
pub mod error;
