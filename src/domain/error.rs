//! Domain error types.

use chrono::NaiveDate;

/// Weight-map and portfolio-state validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortfolioError {
    #[error("portfolio is empty")]
    EmptyPortfolio,

    #[error("missing weight for {ticker}")]
    MissingWeight { ticker: String },

    #[error("weight for {ticker} is not set")]
    UnsetWeight { ticker: String },

    #[error("weights sum to {total}, expected 1")]
    WeightSum { total: f64 },
}

/// Top-level error type for assetlab.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("unknown series field '{field}' (expected price, return or log_return)")]
    UnknownField { field: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("invalid duration '{token}' (expected 1mo, 3mo, 6mo, 1y, 2y, 5y or max)")]
    InvalidDuration { token: String },

    #[error("duplicate date {date} in history for {ticker}")]
    DuplicateDate { ticker: String, date: NaiveDate },

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AnalyticsError> for std::process::ExitCode {
    fn from(err: &AnalyticsError) -> Self {
        let code: u8 = match err {
            AnalyticsError::Io(_) => 1,
            AnalyticsError::ConfigParse { .. }
            | AnalyticsError::ConfigMissing { .. }
            | AnalyticsError::ConfigInvalid { .. } => 2,
            AnalyticsError::DataSource { .. } | AnalyticsError::DuplicateDate { .. } => 3,
            AnalyticsError::UnknownField { .. } | AnalyticsError::InvalidDuration { .. } => 4,
            AnalyticsError::Portfolio(_) => 5,
            AnalyticsError::NoData { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
