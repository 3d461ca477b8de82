//! CLI definition and dispatch.
//!
//! Each command loads and validates its config, then hands a [`DataPort`] to
//! a pipeline function that returns a report. Reports go to stdout, logs to
//! stderr.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

use crate::adapters::csv_adapter::{write_series, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::{
    AnalysisConfig, BacktestConfig, PortfolioConfig, DEFAULT_DATA_DIR, DEFAULT_ROLLING_WINDOW,
};
use crate::domain::config_validation::{
    check_capital, check_date_order, check_window, parse_date, validate_analysis_config,
    validate_backtest_config, validate_portfolio_config,
};
use crate::domain::duration::Lookback;
use crate::domain::error::AnalyticsError;
use crate::domain::metrics::{
    self, HillPoint, DEFAULT_CONFIDENCE, DEFAULT_RISK_FREE_RATE, TRADING_DAYS_PER_YEAR,
};
use crate::domain::portfolio::{
    CorrelationMatrix, Portfolio, WeightEntry, DEFAULT_NAME, DEFAULT_PORTFOLIO_CAPITAL,
};
use crate::domain::series::{self, RollingPoint, SeriesPoint};
use crate::domain::strategy::{momentum, PerformanceSummary, StrategyKind, DEFAULT_CAPITAL};
use crate::domain::time_series::TimeSeries;
use crate::domain::universe::{load_universe, parse_tickers, parse_weights};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "assetlab", about = "Price-history risk analytics and strategy backtests")]
pub struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Risk statistics for one ticker
    Stats {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        ticker: String,
        /// Lookback token: 1mo, 3mo, 6mo, 1y, 2y, 5y or max
        #[arg(short, long)]
        duration: Option<String>,
        #[arg(short, long)]
        window: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Simulate a strategy on one ticker
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        capital: Option<f64>,
        /// Momentum rolling-mean window
        #[arg(short, long)]
        window: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Aggregate a weighted portfolio
    Portfolio {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers
        #[arg(long)]
        tickers: Option<String>,
        /// TICKER:weight pairs, comma-separated
        #[arg(long)]
        weights: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List tickers available in the data directory
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Stats {
            config,
            ticker,
            duration,
            window,
            output,
        } => run_stats(&config, &ticker, duration.as_deref(), window, output.as_deref()),
        Command::Backtest {
            config,
            ticker,
            strategy,
            start,
            end,
            capital,
            window,
            output,
        } => {
            let overrides = BacktestOverrides {
                strategy,
                start,
                end,
                capital,
                window,
            };
            run_backtest(&config, &ticker, overrides, output.as_deref())
        }
        Command::Portfolio {
            config,
            tickers,
            weights,
            output,
        } => run_portfolio(&config, tickers.as_deref(), weights.as_deref(), output.as_deref()),
        Command::ListTickers { config } => run_list_tickers(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, AnalyticsError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, AnalyticsError> {
    validate_analysis_config(config)?;

    let lookback = match config.get_nonempty("analysis", "lookback") {
        Some(token) => token.parse::<Lookback>()?,
        None => Lookback::Max,
    };

    Ok(AnalysisConfig {
        data_dir: PathBuf::from(
            config
                .get_nonempty("data", "directory")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        ),
        risk_free_rate: config.get_double("analysis", "risk_free_rate", DEFAULT_RISK_FREE_RATE),
        confidence_level: config.get_double("analysis", "confidence_level", DEFAULT_CONFIDENCE),
        rolling_window: config.get_int("analysis", "rolling_window", DEFAULT_ROLLING_WINDOW as i64)
            as usize,
        lookback,
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, AnalyticsError> {
    validate_backtest_config(config)?;

    let strategy = match config.get_nonempty("backtest", "strategy") {
        Some(name) => name.parse::<StrategyKind>()?,
        None => StrategyKind::BuyHold,
    };

    Ok(BacktestConfig {
        strategy,
        start_date: parse_date(config, "start_date")?,
        end_date: parse_date(config, "end_date")?,
        initial_capital: config.get_double("backtest", "initial_capital", DEFAULT_CAPITAL),
        momentum_window: config.get_int(
            "backtest",
            "momentum_window",
            momentum::DEFAULT_WINDOW as i64,
        ) as usize,
    })
}

pub fn build_portfolio_config(config: &dyn ConfigPort) -> Result<PortfolioConfig, AnalyticsError> {
    validate_portfolio_config(config)?;

    let tickers = match config.get_nonempty("portfolio", "tickers") {
        Some(list) => parse_ticker_arg(&list)?,
        None => Vec::new(),
    };
    let weights = config
        .get_nonempty("portfolio", "weights")
        .map(|list| parse_weight_arg(&list))
        .transpose()?;

    Ok(PortfolioConfig {
        name: config
            .get_nonempty("portfolio", "name")
            .unwrap_or_else(|| DEFAULT_NAME.to_string()),
        tickers,
        weights,
        initial_capital: config.get_double("portfolio", "initial_capital", DEFAULT_PORTFOLIO_CAPITAL),
    })
}

fn parse_ticker_arg(list: &str) -> Result<Vec<String>, AnalyticsError> {
    parse_tickers(list).map_err(|e| AnalyticsError::ConfigInvalid {
        section: "portfolio".into(),
        key: "tickers".into(),
        reason: e.to_string(),
    })
}

fn parse_weight_arg(list: &str) -> Result<HashMap<String, f64>, AnalyticsError> {
    parse_weights(list).map_err(|e| AnalyticsError::ConfigInvalid {
        section: "portfolio".into(),
        key: "weights".into(),
        reason: e.to_string(),
    })
}

fn fetch_series(data_port: &dyn DataPort, ticker: &str) -> Result<TimeSeries, AnalyticsError> {
    let ticker = ticker.trim().to_uppercase();
    let bars = data_port.fetch_history(&ticker, None, None)?;
    if bars.is_empty() {
        return Err(AnalyticsError::NoData { ticker });
    }
    info!(ticker = %ticker, rows = bars.len(), "loaded history");
    TimeSeries::new(ticker, bars)
}

fn valid_points(points: &[RollingPoint]) -> Vec<SeriesPoint> {
    points
        .iter()
        .filter_map(|p| p.as_option().map(|v| SeriesPoint::new(p.date, v)))
        .collect()
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StatsReport {
    pub ticker: String,
    pub lookback: Lookback,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub observations: usize,
    pub total_return: f64,
    pub annualized_volatility: f64,
    pub downside_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub var: f64,
    pub expected_shortfall: f64,
    pub max_drawdown: f64,
    pub hill: Option<Vec<HillPoint>>,
    pub prices: Vec<SeriesPoint>,
    pub rolling_mean: Vec<RollingPoint>,
    pub rolling_std: Vec<RollingPoint>,
}

/// Single-asset risk profile over the configured lookback.
///
/// Rolling statistics are computed on the full history and then windowed,
/// so the first dates of a short lookback are not warm-up gaps.
pub fn run_stats_pipeline(
    data_port: &dyn DataPort,
    ticker: &str,
    config: &AnalysisConfig,
) -> Result<StatsReport, AnalyticsError> {
    let series = fetch_series(data_port, ticker)?;
    let lookback = config.lookback;

    let prices = lookback.apply(series.price());
    let returns = series::values(&lookback.apply(series.returns()));
    let rolling_mean = lookback.apply(&series.rolling_mean(config.rolling_window));
    let rolling_std = lookback.apply(&series.rolling_std(config.rolling_window));

    let total_return = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if first.value != 0.0 => last.value / first.value - 1.0,
        _ => 0.0,
    };

    let hill = metrics::hill_estimator(&returns);
    if hill.is_none() {
        debug!(ticker = %series.ticker(), "not enough losses for a tail estimate");
    }

    Ok(StatsReport {
        ticker: series.ticker().to_string(),
        lookback,
        first_date: prices.first().map(|p| p.date),
        last_date: prices.last().map(|p| p.date),
        observations: returns.len(),
        total_return,
        annualized_volatility: metrics::annualized_volatility(&returns),
        downside_volatility: metrics::downside_volatility(&returns),
        sharpe_ratio: metrics::sharpe(&returns, config.risk_free_rate),
        sortino_ratio: metrics::sortino(&returns, config.risk_free_rate),
        var: metrics::historical_var(&returns, config.confidence_level),
        expected_shortfall: metrics::historical_es(&returns, config.confidence_level),
        max_drawdown: metrics::max_drawdown(&prices),
        hill,
        prices,
        rolling_mean,
        rolling_std,
    })
}

fn run_stats(
    config_path: &Path,
    ticker: &str,
    duration: Option<&str>,
    window: Option<usize>,
    output: Option<&Path>,
) -> Result<(), AnalyticsError> {
    let adapter = load_config(config_path)?;
    let mut config = build_analysis_config(&adapter)?;
    if let Some(token) = duration {
        config.lookback = token.parse::<Lookback>()?;
    }
    if let Some(w) = window {
        check_window("analysis", "rolling_window", w as i64)?;
        config.rolling_window = w;
    }

    let data_port = CsvAdapter::new(config.data_dir.clone());
    let report = run_stats_pipeline(&data_port, ticker, &config)?;
    print_stats_report(&report, &config);

    if let Some(path) = output {
        write_series(
            path,
            &[
                ("price", report.prices.as_slice()),
                ("rolling_mean", valid_points(&report.rolling_mean).as_slice()),
                ("rolling_std", valid_points(&report.rolling_std).as_slice()),
            ],
        )?;
        info!(path = %path.display(), "series written");
    }
    Ok(())
}

pub fn print_stats_report(report: &StatsReport, config: &AnalysisConfig) {
    println!("=== {} ({}) ===", report.ticker, report.lookback);
    if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
        println!("Period:           {} to {}", first, last);
    }
    println!("Observations:     {}", report.observations);
    println!("Total Return:     {:.2}%", report.total_return * 100.0);
    println!("Volatility:       {:.2}%", report.annualized_volatility * 100.0);
    println!("Downside Vol:     {:.2}%", report.downside_volatility * 100.0);
    println!("Sharpe Ratio:     {:.2}", report.sharpe_ratio);
    println!("Sortino Ratio:    {:.2}", report.sortino_ratio);
    println!(
        "VaR ({:.0}%):        {:.2}%",
        config.confidence_level * 100.0,
        report.var * 100.0
    );
    println!("Exp. Shortfall:   {:.2}%", report.expected_shortfall * 100.0);
    println!("Max Drawdown:     {:.2}%", report.max_drawdown * 100.0);

    match &report.hill {
        None => println!("Hill Estimator:   not enough losses"),
        Some(curve) if curve.is_empty() => println!("Hill Estimator:   no tail points"),
        Some(curve) => {
            println!("Hill Estimator:   k = {}..={}", curve[0].k, curve[curve.len() - 1].k);
            for point in curve {
                println!("  k={:<4} xi={:.4}", point.k, point.xi);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// backtest
// ---------------------------------------------------------------------------

/// Command-line values that take precedence over `[backtest]`.
#[derive(Debug, Clone, Default)]
pub struct BacktestOverrides {
    pub strategy: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub capital: Option<f64>,
    pub window: Option<usize>,
}

impl BacktestOverrides {
    pub fn apply(self, config: &mut BacktestConfig) -> Result<(), AnalyticsError> {
        if let Some(name) = self.strategy {
            config.strategy = name.parse::<StrategyKind>()?;
        }
        if self.start.is_some() {
            config.start_date = self.start;
        }
        if self.end.is_some() {
            config.end_date = self.end;
        }
        if let Some(capital) = self.capital {
            check_capital("backtest", capital)?;
            config.initial_capital = capital;
        }
        if let Some(w) = self.window {
            check_window("backtest", "momentum_window", w as i64)?;
            config.momentum_window = w;
        }
        check_date_order(config.start_date, config.end_date)
    }
}

#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub ticker: String,
    pub strategy: StrategyKind,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub initial_capital: f64,
    pub final_value: f64,
    pub summary: PerformanceSummary,
    pub equity: Vec<SeriesPoint>,
    pub drawdown: Vec<SeriesPoint>,
    pub positions: Option<Vec<SeriesPoint>>,
}

/// Simulate the configured strategy on one ticker.
///
/// The full history is loaded so Momentum's rolling mean is warm on the first
/// date of the range. An empty range is reported as missing data.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    ticker: &str,
    analysis: &AnalysisConfig,
    config: &BacktestConfig,
) -> Result<BacktestReport, AnalyticsError> {
    let series = fetch_series(data_port, ticker)?;
    let strategy = config.strategy.build(
        &series,
        config.start_date,
        config.end_date,
        config.initial_capital,
        config.momentum_window,
    );

    let equity = strategy.equity_curve();
    let (Some(first), Some(last)) = (equity.first(), equity.last()) else {
        warn!(ticker = %strategy.ticker(), "no prices inside backtest range");
        return Err(AnalyticsError::NoData {
            ticker: strategy.ticker().to_string(),
        });
    };

    info!(
        ticker = %strategy.ticker(),
        strategy = strategy.name(),
        periods = equity.len(),
        "backtest complete"
    );

    Ok(BacktestReport {
        ticker: strategy.ticker().to_string(),
        strategy: config.strategy,
        first_date: first.date,
        last_date: last.date,
        initial_capital: config.initial_capital,
        final_value: last.value,
        summary: strategy.summary(analysis.risk_free_rate, analysis.confidence_level),
        drawdown: strategy.drawdown(),
        positions: strategy.position_series(),
        equity,
    })
}

fn run_backtest(
    config_path: &Path,
    ticker: &str,
    overrides: BacktestOverrides,
    output: Option<&Path>,
) -> Result<(), AnalyticsError> {
    let adapter = load_config(config_path)?;
    let analysis = build_analysis_config(&adapter)?;
    let mut config = build_backtest_config(&adapter)?;
    overrides.apply(&mut config)?;

    let data_port = CsvAdapter::new(analysis.data_dir.clone());
    let report = run_backtest_pipeline(&data_port, ticker, &analysis, &config)?;
    print_backtest_report(&report);

    if let Some(path) = output {
        let mut columns = vec![
            ("equity", report.equity.as_slice()),
            ("drawdown", report.drawdown.as_slice()),
        ];
        if let Some(positions) = &report.positions {
            columns.push(("position", positions.as_slice()));
        }
        write_series(path, &columns)?;
        info!(path = %path.display(), "series written");
    }
    Ok(())
}

pub fn print_backtest_report(report: &BacktestReport) {
    let s = &report.summary;
    println!("=== {} {} ===", report.strategy, report.ticker);
    println!("Period:           {} to {}", report.first_date, report.last_date);
    println!("Initial Capital:  {:.2}", report.initial_capital);
    println!("Final Value:      {:.2}", report.final_value);
    println!(
        "PnL:              {:.2} ({:.2}%)",
        s.pnl.absolute,
        s.pnl.pct * 100.0
    );
    println!("Volatility:       {:.2}%", s.annualized_volatility * 100.0);
    println!("Downside Vol:     {:.2}%", s.downside_volatility * 100.0);
    println!("Sharpe Ratio:     {:.2}", s.sharpe_ratio);
    println!("Sortino Ratio:    {:.2}", s.sortino_ratio);
    println!("Max Drawdown:     {:.2}%", s.max_drawdown * 100.0);
    println!("DD Duration:      {} periods", s.max_drawdown_duration);
    println!("VaR:              {:.2}%", s.var * 100.0);
    println!("Exp. Shortfall:   {:.2}%", s.expected_shortfall * 100.0);
    if let Some(positions) = &report.positions {
        let long = positions.iter().filter(|p| p.value > 0.0).count();
        println!("Days Long:        {} of {}", long, positions.len());
    }
}

// ---------------------------------------------------------------------------
// portfolio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PortfolioReport {
    pub name: String,
    pub weights: Vec<(String, f64)>,
    pub skipped: Vec<String>,
    pub observations: usize,
    pub annualized_volatility: f64,
    pub diversification_ratio: f64,
    pub correlation: CorrelationMatrix,
    pub initial_capital: f64,
    pub final_value: f64,
    pub returns: Vec<SeriesPoint>,
    pub value: Vec<SeriesPoint>,
}

/// Load every configured ticker, weight the survivors and aggregate.
///
/// Without explicit weights each loaded ticker gets `1/n`. Explicit weights
/// must still sum to 1 over the tickers that actually loaded.
pub fn run_portfolio_pipeline(
    data_port: &dyn DataPort,
    config: &PortfolioConfig,
) -> Result<PortfolioReport, AnalyticsError> {
    if config.tickers.is_empty() {
        return Err(AnalyticsError::ConfigMissing {
            section: "portfolio".into(),
            key: "tickers".into(),
        });
    }

    let universe = load_universe(data_port, &config.tickers, None, None)?;
    let mut portfolio = Portfolio::new(config.name.as_str());
    for series in universe.series {
        portfolio.add(series, None);
    }

    match &config.weights {
        Some(weights) => portfolio.set_weights(weights)?,
        None => portfolio.set_equal_weights()?,
    }

    let returns = portfolio.portfolio_returns()?;
    let value = portfolio.portfolio_value(config.initial_capital)?;
    let weights = portfolio
        .tickers()
        .into_iter()
        .filter_map(|t| match portfolio.weight(&t) {
            Some(WeightEntry::Value(w)) => Some((t, w)),
            _ => None,
        })
        .collect();

    info!(
        portfolio = %portfolio.name,
        holdings = portfolio.len(),
        dates = returns.len(),
        "portfolio aggregated"
    );

    Ok(PortfolioReport {
        name: portfolio.name.clone(),
        weights,
        skipped: universe.skipped,
        observations: returns.len(),
        annualized_volatility: portfolio.portfolio_volatility(TRADING_DAYS_PER_YEAR)?,
        diversification_ratio: portfolio.diversification_ratio(TRADING_DAYS_PER_YEAR)?,
        correlation: portfolio.correlation_matrix(),
        initial_capital: config.initial_capital,
        final_value: value.last().map_or(config.initial_capital, |p| p.value),
        returns,
        value,
    })
}

fn run_portfolio(
    config_path: &Path,
    tickers: Option<&str>,
    weights: Option<&str>,
    output: Option<&Path>,
) -> Result<(), AnalyticsError> {
    let adapter = load_config(config_path)?;
    let analysis = build_analysis_config(&adapter)?;
    let mut config = build_portfolio_config(&adapter)?;
    if let Some(list) = tickers {
        config.tickers = parse_ticker_arg(list)?;
    }
    if let Some(list) = weights {
        config.weights = Some(parse_weight_arg(list)?);
    }

    let data_port = CsvAdapter::new(analysis.data_dir.clone());
    let report = run_portfolio_pipeline(&data_port, &config)?;
    print_portfolio_report(&report);

    if let Some(path) = output {
        write_series(
            path,
            &[
                ("return", report.returns.as_slice()),
                ("value", report.value.as_slice()),
            ],
        )?;
        info!(path = %path.display(), "series written");
    }
    Ok(())
}

pub fn print_portfolio_report(report: &PortfolioReport) {
    println!("=== {} ===", report.name);
    for (ticker, weight) in &report.weights {
        println!("  {:<8} {:>6.2}%", ticker, weight * 100.0);
    }
    if !report.skipped.is_empty() {
        println!("Skipped (no data): {}", report.skipped.join(", "));
    }
    println!("Aligned Dates:    {}", report.observations);
    println!("Volatility:       {:.2}%", report.annualized_volatility * 100.0);
    println!("Diversification:  {:.3}", report.diversification_ratio);
    println!("Initial Capital:  {:.2}", report.initial_capital);
    println!("Final Value:      {:.2}", report.final_value);

    println!("\nCorrelation:");
    print!("{:<8}", "");
    for ticker in &report.correlation.tickers {
        print!(" {:>8}", ticker);
    }
    println!();
    for (ticker, row) in report.correlation.tickers.iter().zip(&report.correlation.values) {
        print!("{:<8}", ticker);
        for value in row {
            print!(" {:>8.3}", value);
        }
        println!();
    }
}

// ---------------------------------------------------------------------------
// list-tickers
// ---------------------------------------------------------------------------

fn run_list_tickers(config_path: &Path) -> Result<(), AnalyticsError> {
    let adapter = load_config(config_path)?;
    let analysis = build_analysis_config(&adapter)?;
    let data_port = CsvAdapter::new(analysis.data_dir.clone());

    let tickers = data_port.list_tickers()?;
    if tickers.is_empty() {
        warn!(dir = %analysis.data_dir.display(), "no ticker files found");
    }
    for ticker in &tickers {
        match data_port.data_range(ticker)? {
            Some((first, last, rows)) => println!("{ticker}: {rows} rows, {first} to {last}"),
            None => println!("{ticker}: no data"),
        }
    }
    Ok(())
}
