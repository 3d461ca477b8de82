//! Raw daily OHLC row as delivered by the market-data provider.

use chrono::NaiveDate;

use super::series::Dated;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Dated for OhlcvBar {
    fn date(&self) -> NaiveDate {
        self.date
    }
}
