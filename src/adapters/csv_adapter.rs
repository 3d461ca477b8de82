//! CSV price-history adapter and series writer.
//!
//! Reads `<base>/<TICKER>.csv` with a header row. Columns are looked up by
//! name (`date`, `open`, `high`, `low`, `close`, case-insensitive); any other
//! column is ignored. A missing file means the ticker has no history.
//! File names match tickers case-insensitively; tickers are listed upper-cased.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::AnalyticsError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::SeriesPoint;
use crate::ports::data_port::DataPort;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, path: &Path) -> Result<Self, AnalyticsError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| AnalyticsError::DataSource {
                    reason: format!("{}: missing {} column", path.display(), name),
                })
        };
        let close = find("close")?;
        Ok(Self {
            date: find("date")?,
            open: find("open").unwrap_or(close),
            high: find("high").unwrap_or(close),
            low: find("low").unwrap_or(close),
            close,
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> Option<PathBuf> {
        let exact = self.base_path.join(format!("{}.csv", ticker));
        if exact.exists() {
            return Some(exact);
        }
        fs::read_dir(&self.base_path)
            .ok()?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                is_csv(path)
                    && path
                        .file_stem()
                        .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case(ticker))
            })
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, AnalyticsError> {
    record
        .get(index)
        .ok_or_else(|| AnalyticsError::DataSource {
            reason: format!("missing {} value", name),
        })?
        .trim()
        .parse()
        .map_err(|e| AnalyticsError::DataSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn parse_date(raw: &str) -> Result<NaiveDate, AnalyticsError> {
    // Providers often export timestamps; only the calendar date matters.
    let day = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(day, DATE_FORMAT).map_err(|e| AnalyticsError::DataSource {
        reason: format!("invalid date '{}': {}", raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, AnalyticsError> {
        let Some(path) = self.csv_path(ticker) else {
            return Ok(Vec::new());
        };

        let content = fs::read_to_string(&path).map_err(|e| AnalyticsError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| AnalyticsError::DataSource {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();
        let cols = Columns::from_headers(&headers, &path)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| AnalyticsError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date = parse_date(record.get(cols.date).unwrap_or_default())?;
            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(OhlcvBar {
                ticker: ticker.to_string(),
                date,
                open: parse_field(&record, cols.open, "open")?,
                high: parse_field(&record, cols.high, "high")?,
                low: parse_field(&record, cols.low, "low")?,
                close: parse_field(&record, cols.close, "close")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, AnalyticsError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| AnalyticsError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AnalyticsError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if is_csv(&path) {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().to_uppercase());
                }
            }
        }

        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}

/// Write named series side by side, one row per date present in any of them.
/// A series without a value on a date leaves that cell empty.
pub fn write_series(path: &Path, columns: &[(&str, &[SeriesPoint])]) -> Result<(), AnalyticsError> {
    let mut table: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for (i, (_, points)) in columns.iter().enumerate() {
        for p in points.iter() {
            table.entry(p.date).or_insert_with(|| vec![None; columns.len()])[i] = Some(p.value);
        }
    }

    let csv_err = |e: csv::Error| AnalyticsError::DataSource {
        reason: format!("failed to write {}: {}", path.display(), e),
    };

    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    let mut header = vec!["date"];
    header.extend(columns.iter().map(|(name, _)| *name));
    wtr.write_record(&header).map_err(csv_err)?;

    for (date, row) in table {
        let mut record = vec![date.format(DATE_FORMAT).to_string()];
        record.extend(row.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        wtr.write_record(&record).map_err(csv_err)?;
    }

    wtr.flush()?;
    Ok(())
}
