//! Ticker universe for multi-instrument analysis.
//!
//! Parses ticker and weight lists from configuration and loads the history of
//! each ticker through a [`DataPort`], skipping tickers without data.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::domain::error::AnalyticsError;
use crate::domain::time_series::TimeSeries;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("malformed weight entry '{0}' (expected TICKER:weight)")]
    MalformedWeight(String),
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

/// Parse `AAPL:0.6, MSFT:0.4` into a weight map keyed by upper-cased ticker.
pub fn parse_weights(input: &str) -> Result<HashMap<String, f64>, UniverseError> {
    let mut weights = HashMap::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let (ticker, weight) = trimmed
            .split_once(':')
            .or_else(|| trimmed.split_once('='))
            .ok_or_else(|| UniverseError::MalformedWeight(trimmed.to_string()))?;
        let ticker = ticker.trim().to_uppercase();
        let weight: f64 = weight
            .trim()
            .parse()
            .map_err(|_| UniverseError::MalformedWeight(trimmed.to_string()))?;
        if ticker.is_empty() || !weight.is_finite() {
            return Err(UniverseError::MalformedWeight(trimmed.to_string()));
        }
        if weights.insert(ticker.clone(), weight).is_some() {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
    }

    Ok(weights)
}

#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    pub series: Vec<TimeSeries>,
    pub skipped: Vec<String>,
}

/// Fetch every ticker's history. Empty histories are skipped; it is an error
/// only when nothing at all could be loaded.
pub fn load_universe(
    data_port: &dyn DataPort,
    tickers: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<LoadedUniverse, AnalyticsError> {
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for ticker in tickers {
        let bars = data_port.fetch_history(ticker, start, end)?;
        if bars.is_empty() {
            warn!(ticker = %ticker, "skipping ticker: no data");
            skipped.push(ticker.clone());
            continue;
        }
        info!(ticker = %ticker, rows = bars.len(), "loaded history");
        series.push(TimeSeries::new(ticker.as_str(), bars)?);
    }

    if series.is_empty() {
        return Err(AnalyticsError::NoData {
            ticker: tickers.join(","),
        });
    }

    Ok(LoadedUniverse { series, skipped })
}
