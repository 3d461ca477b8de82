//! Immutable price history for one instrument and its derived series.
//!
//! `price[t]` is the close, `return[t] = price[t]/price[t-1] - 1` and
//! `log_return[t] = ln(price[t]/price[t-1])`. Both return series start at the
//! second date and are therefore one element shorter than the price series.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::duration::Lookback;
use super::error::AnalyticsError;
use super::ohlcv::OhlcvBar;
use super::rolling;
use super::series::{self, RollingPoint, SeriesPoint};

/// Derived series that can be sliced by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesField {
    Price,
    Return,
    LogReturn,
}

impl FromStr for SeriesField {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "price" => Ok(SeriesField::Price),
            "return" | "returns" => Ok(SeriesField::Return),
            "log_return" | "log_returns" => Ok(SeriesField::LogReturn),
            _ => Err(AnalyticsError::UnknownField {
                field: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SeriesField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesField::Price => f.write_str("price"),
            SeriesField::Return => f.write_str("return"),
            SeriesField::LogReturn => f.write_str("log_return"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    ticker: String,
    history: Vec<OhlcvBar>,
    price: Vec<SeriesPoint>,
    returns: Vec<SeriesPoint>,
    log_returns: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// Build from raw rows in any order. Rows are sorted by date; a repeated
    /// date is rejected. An empty row set is a valid, empty history.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<OhlcvBar>) -> Result<Self, AnalyticsError> {
        let ticker = ticker.into();
        bars.sort_by_key(|b| b.date);

        if let Some(w) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(AnalyticsError::DuplicateDate {
                ticker,
                date: w[0].date,
            });
        }

        let price: Vec<SeriesPoint> = bars
            .iter()
            .map(|b| SeriesPoint::new(b.date, b.close))
            .collect();

        let returns = price
            .windows(2)
            .map(|w| SeriesPoint::new(w[1].date, w[1].value / w[0].value - 1.0))
            .collect();

        let log_returns = price
            .windows(2)
            .map(|w| SeriesPoint::new(w[1].date, (w[1].value / w[0].value).ln()))
            .collect();

        Ok(Self {
            ticker,
            history: bars,
            price,
            returns,
            log_returns,
        })
    }

    /// Build from the rows falling inside an inclusive `[start, end]` window.
    pub fn bounded(
        ticker: impl Into<String>,
        bars: Vec<OhlcvBar>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, AnalyticsError> {
        Self::new(ticker, series::restrict(&bars, start, end))
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn history(&self) -> &[OhlcvBar] {
        &self.history
    }

    pub fn price(&self) -> &[SeriesPoint] {
        &self.price
    }

    pub fn returns(&self) -> &[SeriesPoint] {
        &self.returns
    }

    pub fn log_returns(&self) -> &[SeriesPoint] {
        &self.log_returns
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.history.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.history.last().map(|b| b.date)
    }

    pub fn series(&self, field: SeriesField) -> &[SeriesPoint] {
        match field {
            SeriesField::Price => &self.price,
            SeriesField::Return => &self.returns,
            SeriesField::LogReturn => &self.log_returns,
        }
    }

    /// Named derived series restricted to an inclusive date range.
    pub fn slice(
        &self,
        field: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<SeriesPoint>, AnalyticsError> {
        let field: SeriesField = field.parse()?;
        Ok(series::restrict(self.series(field), start, end))
    }

    /// Raw OHLC rows restricted to an inclusive date range.
    pub fn slice_history(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<OhlcvBar> {
        series::restrict(&self.history, start, end)
    }

    /// Raw OHLC rows over the trailing lookback window.
    pub fn window_history(&self, lookback: Lookback) -> Vec<OhlcvBar> {
        lookback.apply(&self.history)
    }

    /// Rolling mean of the price, aligned to the price dates.
    pub fn rolling_mean(&self, window: usize) -> Vec<RollingPoint> {
        rolling::rolling_mean(&self.price, window)
    }

    /// Rolling standard deviation of log returns, aligned to the price dates.
    ///
    /// The first date has no log return, so it is always invalid.
    pub fn rolling_std(&self, window: usize) -> Vec<RollingPoint> {
        let Some(first) = self.first_date() else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(self.len());
        out.push(RollingPoint {
            date: first,
            valid: false,
            value: 0.0,
        });
        out.extend(rolling::rolling_std(&self.log_returns, window));
        out
    }
}
