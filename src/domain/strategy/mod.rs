//! Trading-strategy simulation.
//!
//! A [`Strategy`] only has to say how it builds its equity curve; every
//! metric is derived from the curve's own period returns through the shared
//! default methods, so Buy & Hold and Momentum are scored identically.

pub mod buy_hold;
pub mod momentum;

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::error::AnalyticsError;
use super::metrics;
use super::series::{self, SeriesPoint};
use super::time_series::TimeSeries;

pub use buy_hold::BuyHold;
pub use momentum::Momentum;

pub const DEFAULT_CAPITAL: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pnl {
    pub absolute: f64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub pnl: Pnl,
    pub annualized_volatility: f64,
    pub downside_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub var: f64,
    pub expected_shortfall: f64,
}

pub trait Strategy {
    fn name(&self) -> &str;

    fn ticker(&self) -> &str;

    fn capital(&self) -> f64;

    /// Simulated capital per date, starting at exactly `capital()`.
    fn equity_curve(&self) -> Vec<SeriesPoint>;

    /// Long/flat exposure per date, for strategies that trade.
    fn position_series(&self) -> Option<Vec<SeriesPoint>> {
        None
    }

    /// The strategy's own period returns (`equity.pct_change()`).
    fn period_returns(&self) -> Vec<f64> {
        series::values(&series::pct_change(&self.equity_curve()))
    }

    fn pnl(&self) -> Pnl {
        let equity = self.equity_curve();
        match (equity.first(), equity.last()) {
            (Some(first), Some(last)) if first.value != 0.0 => {
                let absolute = last.value - first.value;
                Pnl {
                    absolute,
                    pct: absolute / first.value,
                }
            }
            _ => Pnl {
                absolute: 0.0,
                pct: 0.0,
            },
        }
    }

    fn drawdown(&self) -> Vec<SeriesPoint> {
        metrics::drawdown(&self.equity_curve())
    }

    fn max_drawdown(&self) -> f64 {
        metrics::max_drawdown(&self.equity_curve())
    }

    fn annualized_volatility(&self) -> f64 {
        metrics::annualized_volatility(&self.period_returns())
    }

    fn downside_volatility(&self) -> f64 {
        metrics::downside_volatility(&self.period_returns())
    }

    fn sharpe(&self, risk_free_rate: f64) -> f64 {
        metrics::sharpe(&self.period_returns(), risk_free_rate)
    }

    fn sortino(&self, risk_free_rate: f64) -> f64 {
        metrics::sortino(&self.period_returns(), risk_free_rate)
    }

    fn historical_var(&self, confidence: f64) -> f64 {
        metrics::historical_var(&self.period_returns(), confidence)
    }

    fn historical_es(&self, confidence: f64) -> f64 {
        metrics::historical_es(&self.period_returns(), confidence)
    }

    fn summary(&self, risk_free_rate: f64, confidence: f64) -> PerformanceSummary {
        let equity = self.equity_curve();
        let returns = self.period_returns();
        PerformanceSummary {
            pnl: self.pnl(),
            annualized_volatility: metrics::annualized_volatility(&returns),
            downside_volatility: metrics::downside_volatility(&returns),
            sharpe_ratio: metrics::sharpe(&returns, risk_free_rate),
            sortino_ratio: metrics::sortino(&returns, risk_free_rate),
            max_drawdown: metrics::max_drawdown(&equity),
            max_drawdown_duration: metrics::max_drawdown_duration(&equity),
            var: metrics::historical_var(&returns, confidence),
            expected_shortfall: metrics::historical_es(&returns, confidence),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    BuyHold,
    Momentum,
}

impl StrategyKind {
    /// Build the strategy over an inclusive date range.
    pub fn build(
        self,
        series: &TimeSeries,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        capital: f64,
        momentum_window: usize,
    ) -> Box<dyn Strategy> {
        match self {
            StrategyKind::BuyHold => Box::new(BuyHold::new(series, start, end, capital)),
            StrategyKind::Momentum => Box::new(
                Momentum::new(series, start, end, capital).with_window(momentum_window),
            ),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy-hold" | "buy_hold" | "buyhold" => Ok(StrategyKind::BuyHold),
            "momentum" => Ok(StrategyKind::Momentum),
            other => Err(AnalyticsError::ConfigInvalid {
                section: "backtest".into(),
                key: "strategy".into(),
                reason: format!("unknown strategy '{other}' (expected buy-hold or momentum)"),
            }),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::BuyHold => f.write_str("buy-hold"),
            StrategyKind::Momentum => f.write_str("momentum"),
        }
    }
}
