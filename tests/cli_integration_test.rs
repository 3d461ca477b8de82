//! CLI integration tests.
//!
//! Tests cover:
//! - Config builders (build_analysis_config, build_backtest_config,
//!   build_portfolio_config) over INI strings and files on disk
//! - Argument parsing with clap
//! - Full commands through `run` against a CSV data directory, checking
//!   exit codes and written series

mod common;

use assetlab::adapters::csv_adapter::CsvAdapter;
use assetlab::adapters::file_config_adapter::FileConfigAdapter;
use assetlab::cli::{self, Cli};
use assetlab::domain::config::AnalysisConfig;
use assetlab::domain::duration::Lookback;
use assetlab::domain::error::AnalyticsError;
use assetlab::domain::strategy::StrategyKind;
use assetlab::ports::data_port::DataPort;
use chrono::NaiveDate;
use clap::Parser;
use common::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[data]
directory = /srv/prices

[analysis]
risk_free_rate = 0.03
confidence_level = 0.99
rolling_window = 30
lookback = 6mo

[backtest]
strategy = momentum
start_date = 2020-01-01
end_date = 2024-12-31
initial_capital = 2500.0
momentum_window = 15

[portfolio]
name = Tech Basket
tickers = aapl, msft, nvda
weights = AAPL:0.5, MSFT:0.3, NVDA:0.2
initial_capital = 50000
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_analysis_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_analysis_config(&adapter).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/prices"));
        assert!((config.risk_free_rate - 0.03).abs() < f64::EPSILON);
        assert!((config.confidence_level - 0.99).abs() < f64::EPSILON);
        assert_eq!(config.rolling_window, 30);
        assert_eq!(config.lookback, Lookback::SixMonths);
    }

    #[test]
    fn build_analysis_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[analysis]\n").unwrap();
        let config = cli::build_analysis_config(&adapter).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!((config.risk_free_rate - 0.02).abs() < f64::EPSILON);
        assert!((config.confidence_level - 0.95).abs() < f64::EPSILON);
        assert_eq!(config.rolling_window, 20);
        assert_eq!(config.lookback, Lookback::Max);
    }

    #[test]
    fn build_analysis_config_rejects_bad_lookback() {
        let adapter = FileConfigAdapter::from_string("[analysis]\nlookback = forever\n").unwrap();
        let err = cli::build_analysis_config(&adapter).unwrap_err();
        assert!(matches!(err, AnalyticsError::ConfigInvalid { key, .. } if key == "lookback"));
    }

    #[test]
    fn build_analysis_config_rejects_non_numeric_values() {
        let ini = "[analysis]\nconfidence_level = 99%\nrolling_window = ten\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_analysis_config(&adapter).unwrap_err();
        assert!(
            matches!(err, AnalyticsError::ConfigInvalid { key, .. } if key == "confidence_level")
        );

        let adapter = FileConfigAdapter::from_string("[analysis]\nrolling_window = ten\n").unwrap();
        let err = cli::build_analysis_config(&adapter).unwrap_err();
        assert!(matches!(err, AnalyticsError::ConfigInvalid { key, .. } if key == "rolling_window"));
    }

    #[test]
    fn build_backtest_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert_eq!(config.strategy, StrategyKind::Momentum);
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert!((config.initial_capital - 2500.0).abs() < f64::EPSILON);
        assert_eq!(config.momentum_window, 15);
    }

    #[test]
    fn build_backtest_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert_eq!(config.strategy, StrategyKind::BuyHold);
        assert_eq!(config.start_date, None);
        assert_eq!(config.end_date, None);
        assert!((config.initial_capital - 1000.0).abs() < f64::EPSILON);
        assert_eq!(config.momentum_window, 10);
    }

    #[test]
    fn build_backtest_config_invalid_date_format() {
        let ini = "[backtest]\nstart_date = 2020/01/01\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, AnalyticsError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn build_backtest_config_unknown_strategy() {
        let ini = "[backtest]\nstrategy = pairs\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, AnalyticsError::ConfigInvalid { key, .. } if key == "strategy"));
    }

    #[test]
    fn build_portfolio_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_portfolio_config(&adapter).unwrap();

        assert_eq!(config.name, "Tech Basket");
        assert_eq!(config.tickers, vec!["AAPL", "MSFT", "NVDA"]);
        let weights = config.weights.unwrap();
        assert_eq!(weights.len(), 3);
        assert!((weights["MSFT"] - 0.3).abs() < f64::EPSILON);
        assert!((config.initial_capital - 50_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn build_portfolio_config_without_weights_means_equal() {
        let adapter = FileConfigAdapter::from_string("[portfolio]\ntickers = A,B\n").unwrap();
        let config = cli::build_portfolio_config(&adapter).unwrap();

        assert_eq!(config.name, "Default Portfolio");
        assert!(config.weights.is_none());
        assert!((config.initial_capital - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn build_portfolio_config_duplicate_ticker() {
        let adapter = FileConfigAdapter::from_string("[portfolio]\ntickers = A,B,a\n").unwrap();
        let err = cli::build_portfolio_config(&adapter).unwrap_err();
        assert!(
            matches!(err, AnalyticsError::ConfigInvalid { key, reason, .. } if key == "tickers" && reason.contains('A'))
        );
    }

    #[test]
    fn load_config_from_file() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();
        assert_eq!(config.momentum_window, 15);
    }

    #[test]
    fn load_config_missing_file() {
        let err = cli::load_config(Path::new("/nonexistent/assetlab.ini")).unwrap_err();
        assert!(matches!(err, AnalyticsError::ConfigParse { .. }));
        assert_eq!(ExitCode::from(&err), ExitCode::from(2));
    }
}

mod argument_parsing {
    use super::*;
    use assetlab::cli::Command;

    #[test]
    fn backtest_arguments() {
        let cli = Cli::parse_from([
            "assetlab",
            "backtest",
            "--config",
            "lab.ini",
            "--ticker",
            "ACME",
            "--strategy",
            "momentum",
            "--start",
            "2024-01-02",
            "--capital",
            "500",
            "-w",
            "7",
        ]);
        assert!(!cli.verbose);
        match cli.command {
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
                assert_eq!(config, PathBuf::from("lab.ini"));
                assert_eq!(ticker, "ACME");
                assert_eq!(strategy.as_deref(), Some("momentum"));
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 2));
                assert_eq!(end, None);
                assert_eq!(capital, Some(500.0));
                assert_eq!(window, Some(7));
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["assetlab", "list-tickers", "-c", "lab.ini", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::ListTickers { .. }));
    }

    #[test]
    fn invalid_date_is_rejected_by_parser() {
        let result = Cli::try_parse_from([
            "assetlab", "backtest", "-c", "lab.ini", "-t", "ACME", "--start", "yesterday",
        ]);
        assert!(result.is_err());
    }
}

mod commands {
    use super::*;

    struct Workspace {
        dir: TempDir,
        config: PathBuf,
    }

    impl Workspace {
        fn new(extra: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let data = dir.path().join("data");
            fs::create_dir(&data).unwrap();
            write_csv(&data, "ACME", &generate_closes(80, 100.0));
            write_csv(&data, "BETA", &generate_closes(80, 40.0));

            let config = dir.path().join("lab.ini");
            fs::write(
                &config,
                format!("[data]\ndirectory = {}\n\n{}", data.display(), extra),
            )
            .unwrap();
            Self { dir, config }
        }

        fn out(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn config(&self) -> &str {
            self.config.to_str().unwrap()
        }
    }

    fn write_csv(dir: &Path, ticker: &str, closes: &[f64]) {
        let mut content = String::from("date,close\n");
        for bar in bars_from_closes(ticker, "2024-01-01", closes) {
            content.push_str(&format!("{},{}\n", bar.date, bar.close));
        }
        fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
    }

    fn run(args: &[&str]) -> ExitCode {
        let mut argv = vec!["assetlab"];
        argv.extend_from_slice(args);
        cli::run(Cli::parse_from(argv))
    }

    #[test]
    fn stats_writes_price_and_rolling_columns() {
        let ws = Workspace::new("[analysis]\nrolling_window = 5\n");
        let out = ws.out("stats.csv");
        let code = run(&[
            "stats",
            "-c",
            ws.config(),
            "-t",
            "ACME",
            "-d",
            "1mo",
            "-o",
            out.to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::SUCCESS);

        let written = fs::read_to_string(&out).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("date,price,rolling_mean,rolling_std"));
        assert_eq!(lines.count(), 31);
    }

    #[test]
    fn stats_invalid_duration_exit_code() {
        let ws = Workspace::new("");
        let code = run(&["stats", "-c", ws.config(), "-t", "ACME", "-d", "10d"]);
        assert_eq!(code, ExitCode::from(4));
    }

    #[test]
    fn stats_unknown_ticker_exit_code() {
        let ws = Workspace::new("");
        let code = run(&["stats", "-c", ws.config(), "-t", "NOPE"]);
        assert_eq!(code, ExitCode::from(6));
    }

    #[test]
    fn backtest_momentum_writes_positions() {
        let ws = Workspace::new("[backtest]\nstrategy = momentum\nmomentum_window = 5\n");
        let out = ws.out("equity.csv");
        let code = run(&[
            "backtest",
            "-c",
            ws.config(),
            "-t",
            "ACME",
            "--start",
            "2024-02-01",
            "-o",
            out.to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::SUCCESS);

        let written = fs::read_to_string(&out).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("date,equity,drawdown,position"));
        assert_eq!(lines.next(), Some("2024-02-01,1000,0,0"));
    }

    #[test]
    fn backtest_strategy_flag_overrides_config() {
        let ws = Workspace::new("[backtest]\nstrategy = momentum\n");
        let out = ws.out("equity.csv");
        let code = run(&[
            "backtest",
            "-c",
            ws.config(),
            "-t",
            "ACME",
            "-s",
            "buy-hold",
            "-o",
            out.to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::SUCCESS);
        let header = fs::read_to_string(&out).unwrap();
        assert!(header.starts_with("date,equity,drawdown\n"));
    }

    #[test]
    fn backtest_invalid_config_exit_code() {
        let ws = Workspace::new("[backtest]\ninitial_capital = -1\n");
        let code = run(&["backtest", "-c", ws.config(), "-t", "ACME"]);
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn portfolio_with_cli_tickers_and_weights() {
        let ws = Workspace::new("[portfolio]\ntickers = ACME\n");
        let out = ws.out("portfolio.csv");
        let code = run(&[
            "portfolio",
            "-c",
            ws.config(),
            "--tickers",
            "ACME,BETA",
            "--weights",
            "ACME:0.6,BETA:0.4",
            "-o",
            out.to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::SUCCESS);

        let written = fs::read_to_string(&out).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("date,return,value"));
        assert_eq!(lines.count(), 79);
    }

    #[test]
    fn portfolio_bad_weight_sum_exit_code() {
        let ws = Workspace::new("[portfolio]\ntickers = ACME,BETA\nweights = ACME:0.6,BETA:0.6\n");
        let code = run(&["portfolio", "-c", ws.config()]);
        assert_eq!(code, ExitCode::from(5));
    }

    #[test]
    fn lowercase_data_file_resolves_for_stats() {
        let ws = Workspace::new("");
        let data = ws.dir.path().join("data");
        write_csv(&data, "aapl", &generate_closes(40, 180.0));

        let port = CsvAdapter::new(data);
        let tickers = port.list_tickers().unwrap();
        assert_eq!(tickers, vec!["AAPL", "ACME", "BETA"]);

        let report = cli::run_stats_pipeline(&port, "aapl", &AnalysisConfig::default()).unwrap();
        assert_eq!(report.ticker, "AAPL");
        assert_eq!(report.observations, 39);

        assert_eq!(run(&["stats", "-c", ws.config(), "-t", "aapl"]), ExitCode::SUCCESS);
    }

    #[test]
    fn list_tickers_succeeds() {
        let ws = Workspace::new("");
        assert_eq!(run(&["list-tickers", "-c", ws.config()]), ExitCode::SUCCESS);
    }

    #[test]
    fn missing_config_file_exit_code() {
        let code = run(&["list-tickers", "-c", "/nonexistent/lab.ini"]);
        assert_eq!(code, ExitCode::from(2));
    }
}
