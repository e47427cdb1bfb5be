//! CSV report adapter implementing ReportPort.
//!
//! Produces four tables a presentation layer can render directly:
//! `run.csv` (strategy, parameters and status), `stats.csv` (one row of
//! statistics), `trades.csv` (one row per trade, with its calendar duration)
//! and `equity.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::domain::backtest::{BacktestResult, RunStatus};
use crate::domain::error::BacktestError;
use crate::domain::metrics::StatsReport;
use crate::domain::position::{Direction, Trade};
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

#[derive(Serialize)]
struct RunRow<'a> {
    strategy: &'a str,
    params: String,
    status: &'static str,
    failed_at: Option<usize>,
    failed_timestamp: Option<NaiveDateTime>,
    failure: Option<&'a str>,
    trusted: bool,
    ready_index: Option<usize>,
}

#[derive(Serialize)]
struct TradeRow {
    direction: Direction,
    units: f64,
    size: f64,
    entry_index: usize,
    entry_timestamp: NaiveDateTime,
    entry_price: f64,
    exit_index: usize,
    exit_timestamp: NaiveDateTime,
    exit_price: f64,
    gross_pnl: f64,
    commission: f64,
    net_pnl: f64,
    return_pct: f64,
    bars_held: usize,
    duration_days: f64,
}

impl From<&Trade> for TradeRow {
    fn from(trade: &Trade) -> Self {
        TradeRow {
            direction: trade.direction,
            units: trade.units,
            size: trade.size,
            entry_index: trade.entry_index,
            entry_timestamp: trade.entry_timestamp,
            entry_price: trade.entry_price,
            exit_index: trade.exit_index,
            exit_timestamp: trade.exit_timestamp,
            exit_price: trade.exit_price,
            gross_pnl: trade.gross_pnl,
            commission: trade.commission,
            net_pnl: trade.net_pnl,
            return_pct: trade.return_pct,
            bars_held: trade.bars_held,
            duration_days: trade.duration().num_seconds() as f64 / 86_400.0,
        }
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<(), BacktestError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        stats: &StatsReport,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, BacktestError> {
        fs::create_dir_all(output_dir)?;

        let failure = match &result.status {
            RunStatus::Failed(f) => Some(f),
            _ => None,
        };
        let run = RunRow {
            strategy: result.strategy,
            params: result.params.to_string(),
            status: result.status.label(),
            failed_at: failure.map(|f| f.bar_index),
            failed_timestamp: failure.map(|f| f.timestamp),
            failure: failure.map(|f| f.reason.as_str()),
            trusted: result.is_trusted(),
            ready_index: result.ready_index,
        };

        let run_path = output_dir.join("run.csv");
        let stats_path = output_dir.join("stats.csv");
        let trades_path = output_dir.join("trades.csv");
        let equity_path = output_dir.join("equity.csv");

        write_rows(&run_path, [run])?;
        write_rows(&stats_path, [stats])?;
        write_rows(&trades_path, result.trades.iter().map(TradeRow::from))?;
        write_rows(&equity_path, &result.equity_curve)?;

        info!(dir = %output_dir.display(), "report written");
        Ok(vec![run_path, stats_path, trades_path, equity_path])
    }
}
