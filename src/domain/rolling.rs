//! Rolling-window statistics.
//!
//! MEAN(n)[i]  = sum(x[i-j] for j in 0..n) / n
//! STD(n)[i]   = sqrt(sum((x[i-j] - MEAN(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: the first (n-1) points are invalid. A window too small for the
//! statistic (0 for the mean, < 2 for the std) leaves every point invalid.

use super::series::{RollingPoint, SeriesPoint};
use super::stats;

pub fn rolling_mean(series: &[SeriesPoint], window: usize) -> Vec<RollingPoint> {
    rolling_apply(series, window, 1, stats::mean)
}

pub fn rolling_std(series: &[SeriesPoint], window: usize) -> Vec<RollingPoint> {
    rolling_apply(series, window, 2, stats::std_dev)
}

fn rolling_apply<F>(
    series: &[SeriesPoint],
    window: usize,
    min_window: usize,
    stat: F,
) -> Vec<RollingPoint>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let xs: Vec<f64> = series.iter().map(|p| p.value).collect();
    let warmup = window.saturating_sub(1);

    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let value = if window >= min_window && i >= warmup {
                stat(&xs[i + 1 - window..=i])
            } else {
                None
            };
            RollingPoint {
                date: point.date,
                valid: value.is_some(),
                value: value.unwrap_or(0.0),
            }
        })
        .collect()
}
