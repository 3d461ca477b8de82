//! Buy & Hold: fully invested for the whole range.

use chrono::NaiveDate;

use super::Strategy;
use crate::domain::series::{self, SeriesPoint};
use crate::domain::time_series::TimeSeries;

#[derive(Debug, Clone)]
pub struct BuyHold {
    ticker: String,
    prices: Vec<SeriesPoint>,
    capital: f64,
}

impl BuyHold {
    pub fn new(
        series: &TimeSeries,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        capital: f64,
    ) -> Self {
        Self {
            ticker: series.ticker().to_string(),
            prices: series::restrict(series.price(), start, end),
            capital,
        }
    }
}

impl Strategy for BuyHold {
    fn name(&self) -> &str {
        "Buy & Hold"
    }

    fn ticker(&self) -> &str {
        &self.ticker
    }

    fn capital(&self) -> f64 {
        self.capital
    }

    /// The price path rescaled so the first date is worth `capital`.
    fn equity_curve(&self) -> Vec<SeriesPoint> {
        let Some(base) = self.prices.first().map(|p| p.value) else {
            return Vec::new();
        };
        self.prices
            .iter()
            .map(|p| SeriesPoint::new(p.date, self.capital * (p.value / base)))
            .collect()
    }
}
