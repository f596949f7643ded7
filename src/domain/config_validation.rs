//! Configuration validation.
//!
//! Validates every config field before a run so bad settings fail at
//! initialization, never mid-replay.

use crate::domain::error::ChainrollError;
use crate::domain::filter::{DEFAULT_MAX_EXPIRY_DAYS, MAX_CONFIG_DAYS};
use crate::domain::selector::AggregationPolicy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::HashSet;

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), ChainrollError> {
    validate_cash(config)?;
    validate_dates(config)?;
    validate_holidays(config)?;
    Ok(())
}

pub fn validate_selection_config(config: &dyn ConfigPort) -> Result<(), ChainrollError> {
    validate_roots(config)?;
    validate_horizon(config)?;
    validate_quantity(config)?;
    validate_aggregation(config)?;
    for root in parse_roots(&config.get_string("selection", "futures").unwrap_or_default())? {
        validate_window(config, &root)?;
    }
    Ok(())
}

/// Splits a comma-separated root list, uppercasing and rejecting blanks and
/// duplicates.
pub fn parse_roots(input: &str) -> Result<Vec<String>, ChainrollError> {
    let mut roots = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let root = token.trim().to_uppercase();
        if root.is_empty() {
            return Err(ChainrollError::invalid(
                "selection",
                "futures",
                "empty entry in futures list",
            ));
        }
        if !seen.insert(root.clone()) {
            return Err(ChainrollError::invalid(
                "selection",
                "futures",
                format!("duplicate root {root}"),
            ));
        }
        roots.push(root);
    }

    Ok(roots)
}

pub fn parse_date(value: Option<&str>, section: &str, field: &str) -> Result<NaiveDate, ChainrollError> {
    match value {
        None => Err(ChainrollError::missing(section, field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            ChainrollError::invalid(
                section,
                field,
                format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}

pub fn parse_holidays(input: &str) -> Result<Vec<NaiveDate>, ChainrollError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_date(Some(s), "market", "holidays"))
        .collect()
}

/// Section holding the expiry window overrides for `root`.
pub fn window_section(root: &str) -> String {
    format!("future.{}", root.to_lowercase())
}

/// Whether `root` configures a subscription window at all.
pub fn has_window(config: &dyn ConfigPort, root: &str) -> bool {
    let section = window_section(root);
    config.get_string(&section, "min_expiry_days").is_some()
        || config.get_string(&section, "max_expiry_days").is_some()
}

fn validate_cash(config: &dyn ConfigPort) -> Result<(), ChainrollError> {
    let value = config.get_double("engine", "cash", 0.0)?;
    if !(value > 0.0 && value.is_finite()) {
        return Err(ChainrollError::invalid("engine", "cash", "cash must be positive"));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), ChainrollError> {
    let start_str = config.get_string("engine", "start_date");
    let end_str = config.get_string("engine", "end_date");

    let start_date = parse_date(start_str.as_deref(), "engine", "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "engine", "end_date")?;

    if start_date > end_date {
        return Err(ChainrollError::invalid(
            "engine",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

fn validate_holidays(config: &dyn ConfigPort) -> Result<(), ChainrollError> {
    if let Some(holidays) = config.get_string("market", "holidays") {
        parse_holidays(&holidays)?;
    }
    Ok(())
}

fn validate_roots(config: &dyn ConfigPort) -> Result<(), ChainrollError> {
    match config.get_string("selection", "futures") {
        Some(s) if !s.trim().is_empty() => parse_roots(&s).map(|_| ()),
        _ => Err(ChainrollError::missing("selection", "futures")),
    }
}

fn validate_horizon(config: &dyn ConfigPort) -> Result<(), ChainrollError> {
    let value = config.get_int("selection", "min_horizon_days", 0)?;
    if value < 0 {
        return Err(ChainrollError::invalid(
            "selection",
            "min_horizon_days",
            "min_horizon_days must be non-negative",
        ));
    }
    if value > MAX_CONFIG_DAYS {
        return Err(ChainrollError::invalid(
            "selection",
            "min_horizon_days",
            format!("min_horizon_days must not exceed {MAX_CONFIG_DAYS}"),
        ));
    }
    Ok(())
}

fn validate_quantity(config: &dyn ConfigPort) -> Result<(), ChainrollError> {
    let value = config.get_int("selection", "quantity", 1)?;
    if value < 1 {
        return Err(ChainrollError::invalid(
            "selection",
            "quantity",
            "quantity must be at least 1",
        ));
    }
    Ok(())
}

fn validate_aggregation(config: &dyn ConfigPort) -> Result<(), ChainrollError> {
    if let Some(value) = config.get_string("selection", "aggregation") {
        value.parse::<AggregationPolicy>()?;
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort, root: &str) -> Result<(), ChainrollError> {
    let section = window_section(root);
    if !has_window(config, root) {
        return Ok(());
    }
    let min = config.get_int(&section, "min_expiry_days", 0)?;
    let max = config.get_int(&section, "max_expiry_days", DEFAULT_MAX_EXPIRY_DAYS)?;
    if min < 0 {
        return Err(ChainrollError::invalid(
            &section,
            "min_expiry_days",
            "min_expiry_days must be non-negative",
        ));
    }
    if max < min {
        return Err(ChainrollError::invalid(
            &section,
            "max_expiry_days",
            "max_expiry_days must not be less than min_expiry_days",
        ));
    }
    if max > MAX_CONFIG_DAYS {
        return Err(ChainrollError::invalid(
            &section,
            "max_expiry_days",
            format!("max_expiry_days must not exceed {MAX_CONFIG_DAYS}"),
        ));
    }
    Ok(())
}
