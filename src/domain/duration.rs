//! Symbolic lookback windows ("1mo" … "5y", "max").

use chrono::Duration;
use std::fmt;
use std::str::FromStr;

use super::error::AnalyticsError;
use super::series::Dated;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookback {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    Max,
}

impl Lookback {
    pub const ALL: [Lookback; 7] = [
        Lookback::OneMonth,
        Lookback::ThreeMonths,
        Lookback::SixMonths,
        Lookback::OneYear,
        Lookback::TwoYears,
        Lookback::FiveYears,
        Lookback::Max,
    ];

    /// Calendar days spanned, `None` for the whole history.
    pub fn days(self) -> Option<i64> {
        match self {
            Lookback::OneMonth => Some(30),
            Lookback::ThreeMonths => Some(90),
            Lookback::SixMonths => Some(180),
            Lookback::OneYear => Some(365),
            Lookback::TwoYears => Some(730),
            Lookback::FiveYears => Some(1825),
            Lookback::Max => None,
        }
    }

    /// Suffix of `series` covering `[last - days, last]`.
    pub fn apply<T: Dated + Clone>(self, series: &[T]) -> Vec<T> {
        let (Some(days), Some(last)) = (self.days(), series.last()) else {
            return series.to_vec();
        };
        let cutoff = last.date() - Duration::days(days);
        let first = series.partition_point(|p| p.date() < cutoff);
        series[first..].to_vec()
    }
}

impl FromStr for Lookback {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Lookback::ALL
            .into_iter()
            .find(|lb| lb.to_string() == token)
            .ok_or_else(|| AnalyticsError::InvalidDuration {
                token: token.to_string(),
            })
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Lookback::OneMonth => "1mo",
            Lookback::ThreeMonths => "3mo",
            Lookback::SixMonths => "6mo",
            Lookback::OneYear => "1y",
            Lookback::TwoYears => "2y",
            Lookback::FiveYears => "5y",
            Lookback::Max => "max",
        };
        f.write_str(token)
    }
}

/// Window a date-ascending series by a duration token.
pub fn handle_duration<T: Dated + Clone>(series: &[T], token: &str) -> Result<Vec<T>, AnalyticsError> {
    let lookback: Lookback = token.parse()?;
    Ok(lookback.apply(series))
}
