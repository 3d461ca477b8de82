//! Configuration validation.
//!
//! Range checks on raw config values, run before any pipeline touches data.

use chrono::NaiveDate;

use crate::domain::duration::Lookback;
use crate::domain::error::AnalyticsError;
use crate::domain::strategy::StrategyKind;
use crate::domain::universe::{parse_tickers, parse_weights};
use crate::ports::config_port::ConfigPort;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    validate_risk_free_rate(config)?;
    validate_confidence_level(config)?;
    validate_window(config, "analysis", "rolling_window", 20)?;
    validate_lookback(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    validate_strategy(config)?;
    validate_capital(config, "backtest", 1000.0)?;
    validate_window(config, "backtest", "momentum_window", 10)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_portfolio_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    validate_capital(config, "portfolio", 10_000.0)?;
    validate_ticker_list(config)?;
    validate_weight_list(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> AnalyticsError {
    AnalyticsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Numeric value or `default` when absent; present but unparseable is an error.
fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, AnalyticsError> {
    match config.get_nonempty(section, key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| invalid(section, key, format!("{key} must be a number, got '{raw}'"))),
        None => Ok(default),
    }
}

fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, AnalyticsError> {
    match config.get_nonempty(section, key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| invalid(section, key, format!("{key} must be an integer, got '{raw}'"))),
        None => Ok(default),
    }
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let value = read_double(config, "analysis", "risk_free_rate", 0.02)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "analysis",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_confidence_level(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let value = read_double(config, "analysis", "confidence_level", 0.95)?;
    if value <= 0.0 || value >= 1.0 {
        return Err(invalid(
            "analysis",
            "confidence_level",
            "confidence_level must be strictly between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), AnalyticsError> {
    check_window(section, key, read_int(config, section, key, default)?)
}

/// Rolling and momentum windows need at least two observations.
pub fn check_window(section: &str, key: &str, value: i64) -> Result<(), AnalyticsError> {
    if value < 2 {
        return Err(invalid(section, key, format!("{key} must be at least 2")));
    }
    Ok(())
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    if let Some(token) = config.get_nonempty("analysis", "lookback") {
        token
            .parse::<Lookback>()
            .map_err(|e| invalid("analysis", "lookback", e.to_string()))?;
    }
    Ok(())
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    if let Some(name) = config.get_nonempty("backtest", "strategy") {
        name.parse::<StrategyKind>()?;
    }
    Ok(())
}

fn validate_capital(config: &dyn ConfigPort, section: &str, default: f64) -> Result<(), AnalyticsError> {
    check_capital(section, read_double(config, section, "initial_capital", default)?)
}

pub fn check_capital(section: &str, value: f64) -> Result<(), AnalyticsError> {
    if value.is_nan() || value <= 0.0 {
        return Err(invalid(
            section,
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;
    check_date_order(start_date, end_date)
}

pub fn check_date_order(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(), AnalyticsError> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

/// Optional `[backtest]` date; present but malformed is an error.
pub fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, AnalyticsError> {
    config
        .get_nonempty("backtest", field)
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|_| {
                invalid(
                    "backtest",
                    field,
                    format!("invalid {field} format, expected YYYY-MM-DD"),
                )
            })
        })
        .transpose()
}

fn validate_ticker_list(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    if let Some(list) = config.get_nonempty("portfolio", "tickers") {
        parse_tickers(&list).map_err(|e| invalid("portfolio", "tickers", e.to_string()))?;
    }
    Ok(())
}

fn validate_weight_list(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    if let Some(list) = config.get_nonempty("portfolio", "weights") {
        parse_weights(&list).map_err(|e| invalid("portfolio", "weights", e.to_string()))?;
    }
    Ok(())
}
