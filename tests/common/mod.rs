#![allow(dead_code)]

use assetlab::domain::error::AnalyticsError;
pub use assetlab::domain::ohlcv::OhlcvBar;
use assetlab::domain::time_series::TimeSeries;
use assetlab::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_closes(self, ticker: &str, start: &str, closes: &[f64]) -> Self {
        let bars = bars_from_closes(ticker, start, closes);
        self.with_bars(ticker, bars)
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, AnalyticsError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(AnalyticsError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start.is_none_or(|s| b.date >= s) && end.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, AnalyticsError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(ticker: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        ticker: ticker.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
    }
}

/// One bar per calendar day starting at `start`.
pub fn bars_from_closes(ticker: &str, start: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            ticker: ticker.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
        })
        .collect()
}

pub fn make_series(ticker: &str, closes: &[f64]) -> TimeSeries {
    TimeSeries::new(ticker, bars_from_closes(ticker, "2024-01-01", closes)).unwrap()
}

/// Deterministic zig-zag price path with drift.
pub fn generate_closes(count: usize, start_price: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let swing = if i % 3 == 0 { -1.5 } else { 1.0 };
            start_price + i as f64 * 0.2 + swing
        })
        .collect()
}
