//! Typed run configuration, built from a [`ConfigPort`](crate::ports::config_port::ConfigPort)
//! by the CLI.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::PathBuf;

use super::duration::Lookback;
use super::metrics::{DEFAULT_CONFIDENCE, DEFAULT_RISK_FREE_RATE};
use super::portfolio::{DEFAULT_NAME, DEFAULT_PORTFOLIO_CAPITAL};
use super::strategy::{momentum, StrategyKind, DEFAULT_CAPITAL};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_ROLLING_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub risk_free_rate: f64,
    pub confidence_level: f64,
    pub rolling_window: usize,
    pub lookback: Lookback,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            confidence_level: DEFAULT_CONFIDENCE,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            lookback: Lookback::Max,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub strategy: StrategyKind,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub momentum_window: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::BuyHold,
            start_date: None,
            end_date: None,
            initial_capital: DEFAULT_CAPITAL,
            momentum_window: momentum::DEFAULT_WINDOW,
        }
    }
}

/// `weights == None` means equal weights over whatever tickers load.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    pub name: String,
    pub tickers: Vec<String>,
    pub weights: Option<HashMap<String, f64>>,
    pub initial_capital: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            tickers: Vec::new(),
            weights: None,
            initial_capital: DEFAULT_PORTFOLIO_CAPITAL,
        }
    }
}
