//! Backtest engine: the bar-by-bar event loop.
//!
//! One call to [`run_backtest`] owns all of its state (cash, position, trade
//! log, equity curve), so independent runs can execute concurrently.
//!
//! Orders fill at the close of the bar on which they are decided, using
//! indicator values that include that close. This matches the reference
//! numbers the catalog was tuned against but carries look-ahead bias versus
//! a next-open fill.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::BacktestError;
use super::execution::{DEFAULT_COMMISSION_RATE, ExecutionConfig, FillPoint, apply_intent};
use super::indicator::IndicatorCache;
use super::ohlcv::{Bar, validate_bars};
use super::params::{ParamOverrides, ParamSet};
use super::portfolio::{EquityPoint, Portfolio};
use super::position::{Position, Trade};
use super::registry;
use super::strategy::{DecisionContext, Strategy};
use crate::ports::indicator_port::IndicatorPort;

pub const DEFAULT_INITIAL_CASH: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub commission_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: DEFAULT_INITIAL_CASH,
            commission_rate: DEFAULT_COMMISSION_RATE,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(BacktestError::InvalidCash {
                value: self.initial_cash,
            });
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(BacktestError::InvalidCommission {
                value: self.commission_rate,
            });
        }
        Ok(())
    }

    fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_rate: self.commission_rate,
        }
    }
}

/// Shared stop signal. The loop checks it after each bar.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub cancel: Option<CancelFlag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFailure {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RunStatus {
    Completed,
    /// Stopped by the caller after processing bar `at_index`.
    Cancelled { at_index: usize },
    /// A bar's decision or fill failed; results stop at the previous bar.
    Failed(RunFailure),
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Cancelled { .. } => "cancelled",
            RunStatus::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy: &'static str,
    pub params: ParamSet,
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    /// Position still open after the last processed bar. It is marked to
    /// market in the curve but never force-closed.
    pub final_position: Option<Position>,
    pub final_cash: f64,
    /// First bar at which every indicator binding is defined; `None` if that
    /// never happens within the series.
    pub ready_index: Option<usize>,
    pub status: RunStatus,
}

impl BacktestResult {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Statistics from failed or cancelled runs are not comparable with
    /// completed ones.
    pub fn is_trusted(&self) -> bool {
        self.is_completed()
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_cash)
    }

    /// The part of the curve from the ready index onward.
    pub fn active_curve(&self) -> &[EquityPoint] {
        match self.ready_index {
            Some(i) => &self.equity_curve[i.min(self.equity_curve.len())..],
            None => &[],
        }
    }
}

/// Resolve parameters, initialise the strategy and walk every bar.
///
/// Returns `Err` only for problems detected before the loop starts: invalid
/// bars or config, or a missing indicator capability. A failure while
/// processing a bar yields `Ok` with [`RunStatus::Failed`] and the partial
/// curve; the failing bar's fills are rolled back so the result ends at the
/// last bar that completed.
pub fn run_backtest(
    strategy: &dyn Strategy,
    bars: &[Bar],
    config: &BacktestConfig,
    overrides: &ParamOverrides,
    indicators: &dyn IndicatorPort,
    options: &RunOptions,
) -> Result<BacktestResult, BacktestError> {
    validate_bars(bars)?;
    config.validate()?;
    registry::check_available(strategy, indicators)?;

    let params = ParamSet::resolve(strategy.schema(), overrides);
    info!(strategy = strategy.id(), params = %params, bars = bars.len(), "starting backtest");

    let mut cache = IndicatorCache::new(strategy.id(), bars, indicators);
    strategy.initialize(&params, &mut cache)?;
    let bindings = cache.into_bindings();
    let ready_index = bindings.ready_index();
    match ready_index {
        Some(index) => debug!(strategy = strategy.id(), ready_index = index, "indicators ready"),
        None => warn!(strategy = strategy.id(), "indicators never become available, no decisions will be made"),
    }

    let execution = config.execution();
    let mut portfolio = Portfolio::new(config.initial_cash);
    let mut status = RunStatus::Completed;

    for (index, bar) in bars.iter().enumerate() {
        let fill = FillPoint {
            index,
            timestamp: bar.timestamp,
            price: bar.close,
        };

        let checkpoint = portfolio.checkpoint();

        if ready_index.is_some_and(|ready| index >= ready) {
            let ctx = DecisionContext::new(bars, index, &bindings, &params, portfolio.side());
            let applied = strategy
                .decide(&ctx)
                .and_then(|intent| match intent {
                    Some(intent) => apply_intent(&mut portfolio, intent, fill, &execution).map(Some),
                    None => Ok(None),
                });
            match applied {
                Ok(Some(outcome)) => {
                    if let Some(trade) = &outcome.closed {
                        debug!(index, net_pnl = trade.net_pnl, "trade closed");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    portfolio.rollback(checkpoint);
                    status = fail(strategy, index, bar, err.to_string());
                    break;
                }
            }
        }

        let equity = portfolio.record_equity(bar.timestamp, bar.close);
        if !equity.is_finite() {
            portfolio.rollback(checkpoint);
            status = fail(strategy, index, bar, format!("equity became {}", equity));
            break;
        }

        if options.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            info!(strategy = strategy.id(), at_index = index, "backtest cancelled");
            status = RunStatus::Cancelled { at_index: index };
            break;
        }
    }

    let result = BacktestResult {
        strategy: strategy.id(),
        params,
        initial_cash: config.initial_cash,
        commission_rate: config.commission_rate,
        equity_curve: portfolio.equity_curve,
        trades: portfolio.trades,
        final_position: portfolio.position,
        final_cash: portfolio.cash,
        ready_index,
        status,
    };

    if result.is_completed() {
        info!(
            strategy = result.strategy,
            trades = result.trades.len(),
            final_equity = result.final_equity(),
            "backtest completed"
        );
    }
    Ok(result)
}

fn fail(strategy: &dyn Strategy, index: usize, bar: &Bar, reason: String) -> RunStatus {
    warn!(strategy = strategy.id(), bar_index = index, timestamp = %bar.timestamp, %reason, "backtest failed");
    RunStatus::Failed(RunFailure {
        bar_index: index,
        timestamp: bar.timestamp,
        reason,
    })
}

/// Look a strategy up by identifier and run it.
pub fn run_named(
    strategy_id: &str,
    bars: &[Bar],
    config: &BacktestConfig,
    overrides: &ParamOverrides,
    indicators: &dyn IndicatorPort,
    options: &RunOptions,
) -> Result<BacktestResult, BacktestError> {
    let strategy = registry::lookup(strategy_id)?;
    run_backtest(strategy, bars, config, overrides, indicators, options)
}
