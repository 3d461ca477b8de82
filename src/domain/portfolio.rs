//! Weighted multi-instrument portfolio aggregation.
//!
//! Returns of all holdings are inner-joined on date: a date missing from any
//! instrument is dropped for every instrument. Aggregate metrics refuse to run
//! until every weight is set and the weights sum to 1.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use super::error::PortfolioError;
use super::series::SeriesPoint;
use super::stats;
use super::time_series::TimeSeries;

pub const WEIGHT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_NAME: &str = "Default Portfolio";
pub const DEFAULT_PORTFOLIO_CAPITAL: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightEntry {
    Unset,
    Value(f64),
}

impl From<Option<f64>> for WeightEntry {
    fn from(weight: Option<f64>) -> Self {
        weight.map_or(WeightEntry::Unset, WeightEntry::Value)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Holding {
    series: TimeSeries,
    weight: WeightEntry,
}

/// Returns of every holding on the dates they all share.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnsMatrix {
    pub tickers: Vec<String>,
    pub dates: Vec<NaiveDate>,
    /// One row per date, one column per ticker.
    pub rows: Vec<Vec<f64>>,
}

impl ReturnsMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.tickers.len()).map(|i| self.column(i)).collect()
    }

    /// Sample covariance matrix; zeros when fewer than two dates survive.
    pub fn covariance_matrix(&self) -> Vec<Vec<f64>> {
        let cols = self.columns();
        cols.iter()
            .map(|a| {
                cols.iter()
                    .map(|b| stats::covariance(a, b).unwrap_or(0.0))
                    .collect()
            })
            .collect()
    }

    /// Pearson correlations; 1 on the diagonal, 0 where a column is constant.
    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        let cols = self.columns();
        let values = cols
            .iter()
            .enumerate()
            .map(|(i, a)| {
                cols.iter()
                    .enumerate()
                    .map(|(j, b)| {
                        if i == j {
                            1.0
                        } else {
                            stats::correlation(a, b).unwrap_or(0.0)
                        }
                    })
                    .collect()
            })
            .collect();
        CorrelationMatrix {
            tickers: self.tickers.clone(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        Some(self.values[i][j])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub name: String,
    holdings: Vec<Holding>,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Portfolio {
    pub fn new(name: impl Into<String>) -> Self {
        Portfolio {
            name: name.into(),
            holdings: Vec::new(),
        }
    }

    /// Register an instrument. Adding a ticker again replaces it in place.
    pub fn add(&mut self, series: TimeSeries, weight: Option<f64>) {
        let weight = WeightEntry::from(weight);
        match self
            .holdings
            .iter_mut()
            .find(|h| h.series.ticker() == series.ticker())
        {
            Some(existing) => {
                existing.series = series;
                existing.weight = weight;
            }
            None => self.holdings.push(Holding { series, weight }),
        }
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn tickers(&self) -> Vec<String> {
        self.holdings
            .iter()
            .map(|h| h.series.ticker().to_string())
            .collect()
    }

    pub fn weight(&self, ticker: &str) -> Option<WeightEntry> {
        self.holdings
            .iter()
            .find(|h| h.series.ticker() == ticker)
            .map(|h| h.weight)
    }

    pub fn set_equal_weights(&mut self) -> Result<(), PortfolioError> {
        if self.holdings.is_empty() {
            return Err(PortfolioError::EmptyPortfolio);
        }
        let w = 1.0 / self.holdings.len() as f64;
        for h in &mut self.holdings {
            h.weight = WeightEntry::Value(w);
        }
        Ok(())
    }

    /// Assign every weight from `weights`; all registered tickers must appear.
    pub fn set_weights(&mut self, weights: &HashMap<String, f64>) -> Result<(), PortfolioError> {
        if let Some(missing) = self
            .holdings
            .iter()
            .find(|h| !weights.contains_key(h.series.ticker()))
        {
            return Err(PortfolioError::MissingWeight {
                ticker: missing.series.ticker().to_string(),
            });
        }

        for ticker in weights.keys() {
            if self.weight(ticker).is_none() {
                warn!(ticker = %ticker, "ignoring weight for unregistered ticker");
            }
        }

        for h in &mut self.holdings {
            h.weight = WeightEntry::Value(weights[h.series.ticker()]);
        }
        Ok(())
    }

    fn weight_values(&self) -> Result<Vec<f64>, PortfolioError> {
        self.holdings
            .iter()
            .map(|h| match h.weight {
                WeightEntry::Value(w) => Ok(w),
                WeightEntry::Unset => Err(PortfolioError::UnsetWeight {
                    ticker: h.series.ticker().to_string(),
                }),
            })
            .collect()
    }

    /// Whether the weights sum to 1 within `tolerance`.
    pub fn validate_weights(&self, tolerance: f64) -> Result<bool, PortfolioError> {
        let total: f64 = self.weight_values()?.iter().sum();
        Ok((total - 1.0).abs() < tolerance)
    }

    fn weight_vector(&self) -> Result<Vec<f64>, PortfolioError> {
        if self.holdings.is_empty() {
            return Err(PortfolioError::EmptyPortfolio);
        }
        let weights = self.weight_values()?;
        if !self.validate_weights(WEIGHT_TOLERANCE)? {
            return Err(PortfolioError::WeightSum {
                total: weights.iter().sum(),
            });
        }
        Ok(weights)
    }

    pub fn returns_matrix(&self) -> ReturnsMatrix {
        let tickers = self.tickers();
        let n = self.holdings.len();
        let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();

        for (i, h) in self.holdings.iter().enumerate() {
            for p in h.series.returns() {
                by_date.entry(p.date).or_insert_with(|| vec![None; n])[i] = Some(p.value);
            }
        }

        let total_dates = by_date.len();
        let mut dates = Vec::new();
        let mut rows = Vec::new();
        for (date, row) in by_date {
            if let Some(row) = row.into_iter().collect::<Option<Vec<f64>>>() {
                dates.push(date);
                rows.push(row);
            }
        }

        if dates.len() < total_dates {
            debug!(
                kept = dates.len(),
                dropped = total_dates - dates.len(),
                "inner join dropped unaligned dates"
            );
        }

        ReturnsMatrix {
            tickers,
            dates,
            rows,
        }
    }

    pub fn portfolio_returns(&self) -> Result<Vec<SeriesPoint>, PortfolioError> {
        let w = self.weight_vector()?;
        let matrix = self.returns_matrix();
        Ok(matrix
            .dates
            .iter()
            .zip(&matrix.rows)
            .map(|(&date, row)| SeriesPoint::new(date, dot(row, &w)))
            .collect())
    }

    pub fn portfolio_volatility(&self, freq: f64) -> Result<f64, PortfolioError> {
        let returns: Vec<f64> = self.portfolio_returns()?.iter().map(|p| p.value).collect();
        Ok(freq.sqrt() * stats::std_dev(&returns).unwrap_or(0.0))
    }

    /// `sum(w_i * sigma_i) / sqrt(w' Cov w)` with annualized inputs; 0 when the
    /// portfolio has no variance.
    pub fn diversification_ratio(&self, freq: f64) -> Result<f64, PortfolioError> {
        let w = self.weight_vector()?;
        let matrix = self.returns_matrix();
        let cov: Vec<Vec<f64>> = matrix
            .covariance_matrix()
            .into_iter()
            .map(|row| row.into_iter().map(|c| c * freq).collect())
            .collect();

        let weighted_vol: f64 = w
            .iter()
            .enumerate()
            .map(|(i, wi)| wi * cov[i][i].sqrt())
            .sum();

        let variance: f64 = w
            .iter()
            .enumerate()
            .map(|(i, wi)| wi * dot(&cov[i], &w))
            .sum();

        if variance > 0.0 {
            Ok(weighted_vol / variance.sqrt())
        } else {
            Ok(0.0)
        }
    }

    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        self.returns_matrix().correlation_matrix()
    }

    /// `initial_capital * cumprod(1 + portfolio_return)`.
    pub fn portfolio_value(&self, initial_capital: f64) -> Result<Vec<SeriesPoint>, PortfolioError> {
        let mut value = initial_capital;
        Ok(self
            .portfolio_returns()?
            .into_iter()
            .map(|p| {
                value *= 1.0 + p.value;
                SeriesPoint::new(p.date, value)
            })
            .collect())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
