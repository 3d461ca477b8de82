//! Date-indexed series primitives shared by every analytics component.
//!
//! - `SeriesPoint`: one defined observation of a numeric series
//! - `RollingPoint`: a point of a rolling-window series, invalid during warmup
//! - `Dated`: anything carrying a date (series points and OHLC rows alike)

use chrono::NaiveDate;

pub trait Dated {
    fn date(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

impl Dated for SeriesPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

impl RollingPoint {
    pub fn as_option(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

impl Dated for RollingPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Strip the dates off a series.
pub fn values(series: &[SeriesPoint]) -> Vec<f64> {
    series.iter().map(|p| p.value).collect()
}

/// Inclusive `[start, end]` restriction; `None` leaves that side open.
pub fn restrict<T: Dated + Clone>(
    series: &[T],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<T> {
    series
        .iter()
        .filter(|p| start.is_none_or(|s| p.date() >= s) && end.is_none_or(|e| p.date() <= e))
        .cloned()
        .collect()
}

/// Period-over-period change: `v[t] / v[t-1] - 1`, one element shorter than the input.
///
/// A zero previous value yields a zero change rather than an infinity.
pub fn pct_change(series: &[SeriesPoint]) -> Vec<SeriesPoint> {
    series
        .windows(2)
        .map(|w| {
            let prev = w[0].value;
            let change = if prev != 0.0 { w[1].value / prev - 1.0 } else { 0.0 };
            SeriesPoint::new(w[1].date, change)
        })
        .collect()
}
