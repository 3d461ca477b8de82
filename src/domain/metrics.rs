//! Risk and performance metrics over a return series or a value path.
//!
//! Volatilities are annualized with sqrt(252). Ratios whose denominator is
//! zero are reported as 0. VaR is the signed lower quantile of the daily
//! return distribution; ES is the mean of the returns at or below it.

use tracing::debug;

use super::series::SeriesPoint;
use super::stats;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Fewest losses the Hill estimator accepts.
pub const HILL_MIN_LOSSES: usize = 10;
/// Share of the loss sample used as the upper bound on `k`.
pub const HILL_TAIL_FRACTION: f64 = 0.2;

pub fn annualized_volatility(returns: &[f64]) -> f64 {
    stats::std_dev(returns).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR.sqrt()
}

pub fn downside_volatility(returns: &[f64]) -> f64 {
    let negative: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    stats::std_dev(&negative).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR.sqrt()
}

fn annualized_excess_return(returns: &[f64], risk_free_rate: f64) -> f64 {
    stats::mean(returns).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR - risk_free_rate
}

pub fn sharpe(returns: &[f64], risk_free_rate: f64) -> f64 {
    let vol = annualized_volatility(returns);
    if vol > 0.0 {
        annualized_excess_return(returns, risk_free_rate) / vol
    } else {
        0.0
    }
}

pub fn sortino(returns: &[f64], risk_free_rate: f64) -> f64 {
    let downside = downside_volatility(returns);
    if downside > 0.0 {
        annualized_excess_return(returns, risk_free_rate) / downside
    } else {
        0.0
    }
}

pub fn historical_var(returns: &[f64], confidence: f64) -> f64 {
    let sorted = stats::sorted(returns);
    stats::percentile(&sorted, 1.0 - confidence).unwrap_or(0.0)
}

pub fn historical_es(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let threshold = historical_var(returns, confidence);
    let tail: Vec<f64> = returns.iter().copied().filter(|&r| r <= threshold).collect();
    stats::mean(&tail).unwrap_or(threshold)
}

/// `(v - running_max) / running_max`, pointwise non-positive.
pub fn drawdown(values: &[SeriesPoint]) -> Vec<SeriesPoint> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|p| {
            peak = peak.max(p.value);
            let dd = if peak > 0.0 { (p.value - peak) / peak } else { 0.0 };
            SeriesPoint::new(p.date, dd)
        })
        .collect()
}

/// Most negative drawdown; 0 for an empty or never-declining path.
pub fn max_drawdown(values: &[SeriesPoint]) -> f64 {
    drawdown(values)
        .iter()
        .map(|p| p.value)
        .fold(0.0, f64::min)
}

/// Longest run of consecutive periods spent below a prior peak.
pub fn max_drawdown_duration(values: &[SeriesPoint]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0usize;
    let mut longest = 0usize;

    for p in values {
        if p.value >= peak {
            peak = p.value;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }

    longest
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HillPoint {
    pub k: usize,
    pub xi: f64,
}

/// Hill tail-index curve over the loss tail.
///
/// Losses are the magnitudes of the strictly negative returns, sorted
/// descending. For each `k` in `[2, floor(0.2 * n))`:
/// `xi(k) = mean(ln L[0..k]) - ln L[k]`, with `L[k]` the (k+1)-th largest loss
/// acting as threshold. Returns `None` when fewer than 10 losses exist; a
/// sample that clears that bar always yields `Some`, possibly empty.
pub fn hill_estimator(returns: &[f64]) -> Option<Vec<HillPoint>> {
    let mut losses: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).map(|r| -r).collect();
    let n = losses.len();
    if n < HILL_MIN_LOSSES {
        debug!(losses = n, "hill estimator skipped: not enough losses");
        return None;
    }
    losses.sort_by(|a, b| b.total_cmp(a));

    let log_losses: Vec<f64> = losses.iter().map(|l| l.ln()).collect();
    let upper = (HILL_TAIL_FRACTION * n as f64).floor() as usize;

    let curve = (2..upper)
        .map(|k| {
            let threshold = log_losses[k];
            let excess = log_losses[..k].iter().map(|l| l - threshold).sum::<f64>() / k as f64;
            HillPoint { k, xi: excess }
        })
        .collect();

    Some(curve)
}
