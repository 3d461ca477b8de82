//! Momentum: long while the price sits above its rolling mean, flat otherwise.
//!
//! The position held on date `t` is decided from the close and rolling mean of
//! `t-1`, so no trade ever uses information from its own period.

use chrono::NaiveDate;

use super::Strategy;
use crate::domain::rolling;
use crate::domain::series::{self, RollingPoint, SeriesPoint};
use crate::domain::time_series::TimeSeries;

pub const DEFAULT_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct Momentum {
    ticker: String,
    prices: Vec<SeriesPoint>,
    means: Vec<RollingPoint>,
    capital: f64,
    window: usize,
    full_prices: Vec<SeriesPoint>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl Momentum {
    pub fn new(
        series: &TimeSeries,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        capital: f64,
    ) -> Self {
        let full_prices = series.price().to_vec();
        let mut strategy = Self {
            ticker: series.ticker().to_string(),
            prices: Vec::new(),
            means: Vec::new(),
            capital,
            window: DEFAULT_WINDOW,
            full_prices,
            start,
            end,
        };
        strategy.recompute();
        strategy
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self.recompute();
        self
    }

    // Rolling mean over the full history, then cut to the range.
    fn recompute(&mut self) {
        let means = rolling::rolling_mean(&self.full_prices, self.window);
        self.prices = series::restrict(&self.full_prices, self.start, self.end);
        self.means = series::restrict(&means, self.start, self.end);
    }

    /// Long/flat position per date, values in {0, 1}; the first date is 0.
    pub fn positions(&self) -> Vec<SeriesPoint> {
        lagged_positions(&self.prices, &self.means)
    }
}

/// Raw crossing signal shifted forward one period.
///
/// `position[t] = 1` iff `price[t-1] > mean[t-1]` with a valid mean;
/// `position[0] = 0`. `prices` and `means` must share dates.
pub fn lagged_positions(prices: &[SeriesPoint], means: &[RollingPoint]) -> Vec<SeriesPoint> {
    debug_assert_eq!(prices.len(), means.len());

    let signal: Vec<f64> = prices
        .iter()
        .zip(means)
        .map(|(p, m)| match m.as_option() {
            Some(mean) if p.value > mean => 1.0,
            _ => 0.0,
        })
        .collect();

    prices
        .iter()
        .enumerate()
        .map(|(t, p)| {
            let held = if t == 0 { 0.0 } else { signal[t - 1] };
            SeriesPoint::new(p.date, held)
        })
        .collect()
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        "Momentum"
    }

    fn ticker(&self) -> &str {
        &self.ticker
    }

    fn capital(&self) -> f64 {
        self.capital
    }

    fn position_series(&self) -> Option<Vec<SeriesPoint>> {
        Some(self.positions())
    }

    /// `capital * prod(1 + position[t] * asset_return[t])`, first term 1.
    fn equity_curve(&self) -> Vec<SeriesPoint> {
        let positions = self.positions();
        let mut value = self.capital;

        self.prices
            .iter()
            .enumerate()
            .map(|(t, p)| {
                if t > 0 {
                    let prev = self.prices[t - 1].value;
                    let asset_return = if prev != 0.0 { p.value / prev - 1.0 } else { 0.0 };
                    value *= 1.0 + positions[t].value * asset_return;
                }
                SeriesPoint::new(p.date, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn make_series(prices: &[f64]) -> TimeSeries {
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                ticker: "TEST".into(),
                date: d((i + 1) as u32),
                open: close,
                high: close,
                low: close,
                close,
            })
            .collect();
        TimeSeries::new("TEST", bars).unwrap()
    }

    fn point(day: u32, value: f64) -> SeriesPoint {
        SeriesPoint::new(d(day), value)
    }

    fn mean(day: u32, value: Option<f64>) -> RollingPoint {
        RollingPoint {
            date: d(day),
            valid: value.is_some(),
            value: value.unwrap_or(0.0),
        }
    }

    #[test]
    fn lag_shifts_signal_by_one() {
        let prices = [point(1, 10.0), point(2, 12.0), point(3, 8.0), point(4, 9.0)];
        let means = [
            mean(1, Some(9.0)),
            mean(2, Some(11.0)),
            mean(3, Some(10.0)),
            mean(4, Some(8.5)),
        ];
        // raw signal: 1, 1, 0, 1
        let pos = series::values(&lagged_positions(&prices, &means));
        assert_eq!(pos, vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn invalid_mean_is_flat() {
        let prices = [point(1, 10.0), point(2, 12.0), point(3, 14.0)];
        let means = [mean(1, None), mean(2, None), mean(3, Some(12.0))];
        let pos = series::values(&lagged_positions(&prices, &means));
        assert_eq!(pos, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn equality_is_not_a_crossing() {
        let prices = [point(1, 10.0), point(2, 10.0)];
        let means = [mean(1, Some(10.0)), mean(2, Some(10.0))];
        assert_eq!(lagged_positions(&prices, &means)[1].value, 0.0);
    }

    #[test]
    fn first_position_is_zero_even_in_uptrend() {
        let ts = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let m = Momentum::new(&ts, Some(d(4)), None, 1000.0).with_window(2);
        let pos = m.positions();
        assert_eq!(pos[0].value, 0.0);
        assert_eq!(pos[0].date, d(4));
        assert!(pos[1..].iter().all(|p| p.value == 1.0));
    }

    #[test]
    fn equity_compounds_only_while_long() {
        let ts = make_series(&[10.0, 11.0, 12.0, 9.0, 10.0]);
        let m = Momentum::new(&ts, None, None, 1000.0).with_window(2);
        // means: -, 10.5, 11.5, 10.5, 9.5; signal: 0, 1, 1, 0, 1
        // positions: 0, 0, 1, 1, 0
        let pos = series::values(&m.positions());
        assert_eq!(pos, vec![0.0, 0.0, 1.0, 1.0, 0.0]);

        let eq = series::values(&m.equity_curve());
        assert_eq!(eq[0], 1000.0);
        assert_relative_eq!(eq[1], 1000.0);
        assert_relative_eq!(eq[2], 1000.0 * 12.0 / 11.0, epsilon = 1e-9);
        assert_relative_eq!(eq[3], 1000.0 * 12.0 / 11.0 * 0.75, epsilon = 1e-9);
        assert_relative_eq!(eq[4], eq[3]);
    }

    #[test]
    fn default_window() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        let ts = make_series(&closes);
        let default = Momentum::new(&ts, None, None, 1000.0);
        let explicit = Momentum::new(&ts, None, None, 1000.0).with_window(DEFAULT_WINDOW);
        assert_eq!(default.positions(), explicit.positions());
    }

    #[test]
    fn short_history_stays_flat() {
        let ts = make_series(&[5.0, 6.0, 7.0]);
        let m = Momentum::new(&ts, None, None, 1000.0);
        assert!(m.positions().iter().all(|p| p.value == 0.0));
        assert!(m.equity_curve().iter().all(|p| p.value == 1000.0));
    }

    #[test]
    fn pnl_from_equity() {
        let ts = make_series(&[10.0, 11.0, 12.0, 9.0, 10.0]);
        let m = Momentum::new(&ts, None, None, 1000.0).with_window(2);
        let pnl = m.pnl();
        assert_relative_eq!(pnl.absolute, 1000.0 * 12.0 / 11.0 * 0.75 - 1000.0, epsilon = 1e-9);
    }
}
