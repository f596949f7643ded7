//! Configuration access port trait.

use crate::domain::error::ChainrollError;

/// Numeric getters return `default` only when the key is absent; a value that
/// does not parse is a `ConfigInvalid` error.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, ChainrollError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, ChainrollError>;
}
