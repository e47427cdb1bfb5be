//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::native_indicators::NativeIndicators;
use crate::domain::backtest::{
    BacktestConfig, BacktestResult, DEFAULT_INITIAL_CASH, RunOptions, RunStatus, run_backtest,
};
use crate::domain::config_validation::{
    optional_date, optional_number, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::BacktestError;
use crate::domain::execution::DEFAULT_COMMISSION_RATE;
use crate::domain::metrics::{StatsReport, summarize_run};
use crate::domain::ohlcv::Bar;
use crate::domain::params::{ParamOverrides, ParamSet, parse_overrides};
use crate::domain::registry;
use crate::domain::sweep::{self, RunRequest, SweepOutcome};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "stratbench", about = "Single-instrument strategy backtester")]
pub struct Cli {
    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy over one symbol
    Backtest {
        #[command(flatten)]
        run: RunArgs,
        /// Directory for run.csv, stats.csv, trades.csv and equity.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a parameter grid (or every strategy) in parallel and rank the results
    Sweep {
        #[command(flatten)]
        run: RunArgs,
        /// Parameter axis: `name=v1,v2,...` or `name=start..end:step`
        #[arg(short, long = "axis", value_name = "AXIS")]
        axes: Vec<String>,
        /// Run every available strategy instead of the configured one
        #[arg(long)]
        all: bool,
    },
    /// List the strategy catalog with parameter defaults
    Strategies,
    /// List the symbols available in a data directory
    Symbols {
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Validate a configuration file without running it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Options shared by `backtest` and `sweep`. Flags override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub symbol: Option<String>,
    #[arg(short, long)]
    pub strategy: Option<String>,
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,
    /// Parameter override, repeatable
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,
    #[arg(long)]
    pub cash: Option<f64>,
    #[arg(long)]
    pub commission: Option<f64>,
    /// First date to load (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last date to load (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

/// Everything a run needs once the config file and flags are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub strategy: Option<String>,
    pub symbol: String,
    pub data_dir: PathBuf,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub config: BacktestConfig,
    pub overrides: ParamOverrides,
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);
    match cli.command {
        Command::Backtest { run, output } => run_single(&run, output.as_deref()),
        Command::Sweep { run, axes, all } => run_sweep(&run, &axes, all),
        Command::Strategies => run_list_strategies(),
        Command::Symbols { data_dir } => run_list_symbols(data_dir),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Install the stderr subscriber. `RUST_LOG` applies unless `--verbose`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fail(err: BacktestError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// Merge an optional config file with command-line flags.
pub fn build_settings(
    args: &RunArgs,
    config: Option<&dyn ConfigPort>,
) -> Result<RunSettings, BacktestError> {
    let from_config = |section: &str, key: &str| {
        config
            .and_then(|c| c.get_string(section, key))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let symbol = args
        .symbol
        .clone()
        .or_else(|| from_config("backtest", "symbol"))
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        })?;

    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| from_config("backtest", "data_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let (file_cash, file_commission, file_start, file_end) = match config {
        Some(c) => (
            optional_number(c, "backtest", "initial_cash")?,
            optional_number(c, "backtest", "commission_rate")?,
            optional_date(c, "start")?,
            optional_date(c, "end")?,
        ),
        None => (None, None, None, None),
    };

    let mut overrides: ParamOverrides = config
        .map(|c| c.section_entries("params").into_iter().collect())
        .unwrap_or_default();
    let flags = parse_overrides(args.params.iter().map(String::as_str)).map_err(|reason| {
        BacktestError::ConfigInvalid {
            section: "params".into(),
            key: "--param".into(),
            reason,
        }
    })?;
    overrides.extend(flags);

    Ok(RunSettings {
        strategy: args.strategy.clone().or_else(|| from_config("strategy", "name")),
        symbol,
        data_dir,
        start: args.start.or(file_start),
        end: args.end.or(file_end),
        config: BacktestConfig {
            initial_cash: args.cash.or(file_cash).unwrap_or(DEFAULT_INITIAL_CASH),
            commission_rate: args
                .commission
                .or(file_commission)
                .unwrap_or(DEFAULT_COMMISSION_RATE),
        },
        overrides,
    })
}

/// Load the optional config file, validate it and merge it with the flags.
fn resolve_settings(args: &RunArgs, needs_strategy: bool) -> Result<RunSettings, ExitCode> {
    let adapter = match &args.config {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let adapter = load_config(path)?;
            validate_backtest_config(&adapter).map_err(fail)?;
            if needs_strategy && args.strategy.is_none() {
                validate_strategy_config(&adapter).map_err(fail)?;
            }
            Some(adapter)
        }
        None => None,
    };
    let config = adapter.as_ref().map(|a| a as &dyn ConfigPort);
    build_settings(args, config).map_err(fail)
}

fn load_bars(settings: &RunSettings) -> Result<Vec<Bar>, ExitCode> {
    let data = CsvAdapter::new(settings.data_dir.clone());
    let bars = data
        .fetch_bars(&settings.symbol, settings.start, settings.end)
        .map_err(fail)?;
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => eprintln!(
            "Loaded {} bars for {} ({} to {})",
            bars.len(),
            settings.symbol,
            first.timestamp.date(),
            last.timestamp.date()
        ),
        _ => eprintln!("warning: no bars for {} in the requested range", settings.symbol),
    }
    Ok(bars)
}

fn run_single(args: &RunArgs, output: Option<&Path>) -> ExitCode {
    // Stage 1: Config and flags
    let settings = match resolve_settings(args, true) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let Some(strategy_id) = settings.strategy.as_deref() else {
        return fail(BacktestError::ConfigMissing {
            section: "strategy".into(),
            key: "name".into(),
        });
    };

    // Stage 2: Strategy lookup before touching data
    let strategy = match registry::lookup(strategy_id) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    eprintln!("Strategy: {} ({})", strategy.id(), strategy.description());

    // Stage 3: Bars
    let bars = match load_bars(&settings) {
        Ok(b) => b,
        Err(code) => return code,
    };

    // Stage 4: Run
    let indicators = NativeIndicators::new();
    let result = match run_backtest(
        strategy,
        &bars,
        &settings.config,
        &settings.overrides,
        &indicators,
        &RunOptions::default(),
    ) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    // Stage 5: Summary
    let stats = summarize_run(&result, &bars);
    print_summary(&result, &stats);

    // Stage 6: Report
    if let Some(dir) = output {
        match CsvReportAdapter.write(&result, &stats, dir) {
            Ok(files) => {
                eprintln!("\nReport written to: {}", dir.display());
                for file in files {
                    eprintln!("  {}", file.display());
                }
            }
            Err(e) => return fail(e),
        }
    }

    match &result.status {
        RunStatus::Failed(_) => ExitCode::from(6),
        _ => ExitCode::SUCCESS,
    }
}

fn print_summary(result: &BacktestResult, stats: &StatsReport) {
    for warning in result.params.warnings() {
        eprintln!("warning: {}", warning);
    }

    eprintln!("\n=== {} ===", result.strategy);
    eprintln!("Parameters:       {}", result.params);
    eprintln!("Status:           {}", result.status.label());
    match &result.status {
        RunStatus::Failed(f) => eprintln!(
            "  failed at bar {} ({}): {}\n  statistics below cover the partial run and are not comparable",
            f.bar_index, f.timestamp, f.reason
        ),
        RunStatus::Cancelled { at_index } => eprintln!("  cancelled after bar {}", at_index),
        RunStatus::Completed => {}
    }
    match result.ready_index {
        Some(i) => eprintln!("Ready From Bar:   {}", i),
        None => eprintln!("Ready From Bar:   never"),
    }

    eprintln!("Final Equity:     {:.2}", stats.final_equity);
    eprintln!("Total Return:     {:.2}%", stats.total_return_pct);
    eprintln!("Buy & Hold:       {}", pct(stats.buy_and_hold_return_pct));
    eprintln!("CAGR:             {}", pct(stats.cagr_pct));
    eprintln!("Max Drawdown:     -{:.2}%", stats.max_drawdown_pct);
    eprintln!("Exposure:         {:.1}%", stats.exposure_pct);
    eprintln!("Total Trades:     {}", stats.trade_count);
    eprintln!("Win Rate:         {}", pct(stats.win_rate_pct));
    eprintln!("Profit Factor:    {}", ratio(Some(stats.profit_factor)));
    eprintln!("Sharpe Ratio:     {}", ratio(stats.sharpe_ratio));
    eprintln!("Sortino Ratio:    {}", ratio(stats.sortino_ratio));
    eprintln!("Calmar Ratio:     {}", ratio(stats.calmar_ratio));

    if let Some(pos) = &result.final_position {
        eprintln!(
            "Open Position:    {:?} {:.4} units from {} at {:.2}",
            pos.direction, pos.units, pos.entry_timestamp, pos.entry_price
        );
    }
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v))
}

fn ratio(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_infinite() => "inf".to_string(),
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

fn run_sweep(args: &RunArgs, axes: &[String], all: bool) -> ExitCode {
    let settings = match resolve_settings(args, !all) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let axes = match axes.iter().map(|a| sweep::parse_axis(a)).collect::<Result<Vec<_>, _>>() {
        Ok(a) => a,
        Err(reason) => {
            return fail(BacktestError::ConfigInvalid {
                section: "sweep".into(),
                key: "--axis".into(),
                reason,
            });
        }
    };

    let indicators = NativeIndicators::new();
    let strategies: Vec<String> = if all {
        registry::available(&indicators)
            .into_iter()
            .map(String::from)
            .collect()
    } else {
        match settings.strategy.clone() {
            Some(s) => vec![s],
            None => {
                return fail(BacktestError::ConfigMissing {
                    section: "strategy".into(),
                    key: "name".into(),
                });
            }
        }
    };

    let combos = sweep::grid(&settings.overrides, &axes);
    let requests: Vec<RunRequest> = strategies
        .iter()
        .flat_map(|s| combos.iter().map(move |o| RunRequest::new(s.clone(), o.clone())))
        .collect();

    let bars = match load_bars(&settings) {
        Ok(b) => b,
        Err(code) => return code,
    };

    eprintln!("Running {} backtests...", requests.len());
    let outcomes = sweep::run_many(
        requests,
        &bars,
        &settings.config,
        &indicators,
        &RunOptions::default(),
    );
    print_sweep(&outcomes, &bars);

    if outcomes.iter().any(|o| o.completed_equity().is_some()) {
        ExitCode::SUCCESS
    } else {
        match outcomes.iter().find_map(|o| o.result.as_ref().err()) {
            Some(e) => e.into(),
            None => ExitCode::from(6),
        }
    }
}

fn print_sweep(outcomes: &[SweepOutcome], bars: &[Bar]) {
    eprintln!(
        "\n{:<4} {:<22} {:>12} {:>10} {:>8} {:>10}  {}",
        "#", "strategy", "equity", "return", "trades", "max dd", "parameters"
    );
    for (rank, &i) in sweep::rank(outcomes).iter().enumerate() {
        let outcome = &outcomes[i];
        match &outcome.result {
            Ok(result) => {
                let stats = summarize_run(result, bars);
                let name = if result.is_trusted() {
                    result.strategy.to_string()
                } else {
                    format!("{} [{}]", result.strategy, result.status.label())
                };
                eprintln!(
                    "{:<4} {:<22} {:>12.2} {:>9.2}% {:>8} {:>9.2}%  {}",
                    rank + 1,
                    name,
                    stats.final_equity,
                    stats.total_return_pct,
                    stats.trade_count,
                    stats.max_drawdown_pct,
                    result.params
                );
            }
            Err(e) => eprintln!(
                "{:<4} {:<22} error: {}",
                rank + 1,
                outcome.request.strategy,
                e
            ),
        }
    }
}

fn run_list_strategies() -> ExitCode {
    let indicators = NativeIndicators::new();
    for strategy in registry::all() {
        let marker = match registry::missing_capability(*strategy, &indicators) {
            Some(kind) => format!("  (unavailable: needs {})", kind),
            None => String::new(),
        };
        println!("{}{}", strategy.id(), marker);
        println!("  {}", strategy.description());
        println!("  {}", ParamSet::defaults(strategy.schema()));
    }
    ExitCode::SUCCESS
}

fn run_list_symbols(data_dir: Option<PathBuf>) -> ExitCode {
    let dir = data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    match CsvAdapter::new(dir).list_symbols() {
        Ok(symbols) => {
            for symbol in symbols {
                println!("{}", symbol);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }

    let settings = match build_settings(&RunArgs::default(), Some(&adapter)) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let Some(strategy) = settings
        .strategy
        .as_deref()
        .and_then(|id| registry::lookup(id).ok())
    else {
        return fail(BacktestError::ConfigMissing {
            section: "strategy".into(),
            key: "name".into(),
        });
    };
    if let Err(e) = settings.config.validate() {
        return fail(e);
    }

    let params = ParamSet::resolve(strategy.schema(), &settings.overrides);
    eprintln!("  strategy:   {}", strategy.id());
    eprintln!("  symbol:     {}", settings.symbol);
    eprintln!("  data_dir:   {}", settings.data_dir.display());
    eprintln!("  cash:       {}", settings.config.initial_cash);
    eprintln!("  commission: {}", settings.config.commission_rate);
    eprintln!("  parameters: {}", params);
    for warning in params.warnings() {
        eprintln!("  warning: {}", warning);
    }
    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}
