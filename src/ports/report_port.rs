//! Report generation port trait.

use std::path::{Path, PathBuf};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::metrics::StatsReport;

/// Sink for a finished run: the stats plus the raw trade log and equity curve.
pub trait ReportPort {
    /// Write the report under `output_dir`, returning the files produced.
    fn write(
        &self,
        result: &BacktestResult,
        stats: &StatsReport,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, BacktestError>;
}
