//! Market-data provider port.

use crate::domain::error::AnalyticsError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily rows for `ticker` within the inclusive bounds, ascending by date.
    ///
    /// An unknown ticker yields an empty vector, not an error.
    fn fetch_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, AnalyticsError>;

    fn list_tickers(&self) -> Result<Vec<String>, AnalyticsError>;

    /// First date, last date and row count of the stored history.
    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AnalyticsError> {
        let bars = self.fetch_history(ticker, None, None)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
