//! Parallel execution of independent backtest runs.
//!
//! Each request runs on its own [`run_backtest`] call with its own state; a
//! failure in one request is reported alongside the others, never instead of
//! them.

use rayon::prelude::*;
use tracing::info;

use super::backtest::{BacktestConfig, BacktestResult, RunOptions, run_backtest};
use super::error::BacktestError;
use super::ohlcv::Bar;
use super::params::ParamOverrides;
use super::registry;
use crate::ports::indicator_port::IndicatorPort;

#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub strategy: String,
    pub overrides: ParamOverrides,
}

impl RunRequest {
    pub fn new(strategy: impl Into<String>, overrides: ParamOverrides) -> Self {
        Self {
            strategy: strategy.into(),
            overrides,
        }
    }
}

#[derive(Debug)]
pub struct SweepOutcome {
    pub request: RunRequest,
    pub result: Result<BacktestResult, BacktestError>,
}

impl SweepOutcome {
    /// Final equity of a completed run; `None` for errors and incomplete runs.
    pub fn completed_equity(&self) -> Option<f64> {
        match &self.result {
            Ok(r) if r.is_completed() => Some(r.final_equity()),
            _ => None,
        }
    }
}

/// One sweep axis: a parameter name and the values to try.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamAxis {
    pub name: String,
    pub values: Vec<String>,
}

/// Upper bound on the values a single range axis may expand to.
pub const MAX_AXIS_VALUES: usize = 10_000;

/// Parse `name=v1,v2,...` or `name=start..end:step` (end inclusive).
pub fn parse_axis(spec: &str) -> Result<ParamAxis, String> {
    let (name, values) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected name=values, got '{}'", spec))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty parameter name in '{}'", spec));
    }

    let values = match values.split_once("..") {
        Some((start, rest)) => {
            let (end, step) = rest.split_once(':').unwrap_or((rest, "1"));
            let parse = |s: &str| {
                s.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("bad number '{}' in '{}': {}", s, spec, e))
            };
            let (start, end, step) = (parse(start)?, parse(end)?, parse(step)?);
            if step <= 0.0 || end < start {
                return Err(format!("empty or unbounded range in '{}'", spec));
            }
            let count = ((end - start) / step + 1e-9).floor() + 1.0;
            if !count.is_finite() || count > MAX_AXIS_VALUES as f64 {
                return Err(format!(
                    "range in '{}' has more than {} values",
                    spec, MAX_AXIS_VALUES
                ));
            }
            let count = count as usize;
            (0..count).map(|i| (start + step * i as f64).to_string()).collect()
        }
        None => values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect::<Vec<_>>(),
    };

    if values.is_empty() {
        return Err(format!("no values in '{}'", spec));
    }
    Ok(ParamAxis {
        name: name.to_string(),
        values,
    })
}

/// Cartesian product of `axes`, each combination layered over `base`.
pub fn grid(base: &ParamOverrides, axes: &[ParamAxis]) -> Vec<ParamOverrides> {
    axes.iter().fold(vec![base.clone()], |combos, axis| {
        combos
            .iter()
            .flat_map(|combo| {
                axis.values.iter().map(move |value| {
                    let mut next = combo.clone();
                    next.insert(axis.name.clone(), value.clone());
                    next
                })
            })
            .collect()
    })
}

/// Run every request against the same bars, in parallel.
pub fn run_many(
    requests: Vec<RunRequest>,
    bars: &[Bar],
    config: &BacktestConfig,
    indicators: &dyn IndicatorPort,
    options: &RunOptions,
) -> Vec<SweepOutcome> {
    info!(runs = requests.len(), "starting sweep");
    requests
        .into_par_iter()
        .map(|request| {
            let result = registry::lookup(&request.strategy).and_then(|strategy| {
                run_backtest(strategy, bars, config, &request.overrides, indicators, options)
            });
            SweepOutcome { request, result }
        })
        .collect()
}

/// Indices of `outcomes` ordered best-first by completed final equity.
/// Failed, cancelled and erroring runs sort last in their original order.
pub fn rank(outcomes: &[SweepOutcome]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..outcomes.len()).collect();
    order.sort_by(|&a, &b| {
        match (outcomes[a].completed_equity(), outcomes[b].completed_equity()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
    order
}
