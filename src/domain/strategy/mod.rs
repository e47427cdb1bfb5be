//! Strategy contract and the built-in strategy catalog.
//!
//! A strategy is a stateless plug-in: `initialize` binds named indicator
//! series through the run's [`IndicatorCache`], `decide` reads those bindings
//! and the bar history up to the current index and returns at most one
//! [`OrderIntent`]. Everything run-specific lives in the [`ParamSet`] and the
//! bindings, so one strategy value can serve any number of concurrent runs.

pub mod bollinger_bands;
pub mod day_of_month;
pub mod day_of_week;
pub mod donchian_channel;
pub mod ichimoku;
pub mod lunar_phase;
pub mod macd;
pub mod rsi_oscillator;
pub mod sma_cross;
pub mod volatility_breakout;

use serde::Serialize;

use super::error::BacktestError;
use super::indicator::{Bindings, IndicatorCache, IndicatorKind};
use super::ohlcv::Bar;
use super::params::{ParamSet, ParamSpec};
use super::position::Side;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum OrderIntent {
    /// Go long with `size` of current equity; closes a short first.
    Buy { size: f64 },
    /// Go short with `size` of current equity; closes a long first.
    Sell { size: f64 },
    Close,
}

pub trait Strategy: Send + Sync {
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Ordered parameter schema; the first entry is always `trade_size`.
    fn schema(&self) -> &'static [ParamSpec];

    /// Indicator capabilities `initialize` will ask for.
    fn required_indicators(&self) -> &'static [IndicatorKind] {
        &[]
    }

    fn initialize(&self, params: &ParamSet, cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError>;

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError>;
}

/// Read-only view handed to [`Strategy::decide`] for one bar.
pub struct DecisionContext<'a> {
    bars: &'a [Bar],
    index: usize,
    bindings: &'a Bindings,
    params: &'a ParamSet,
    side: Side,
}

impl<'a> DecisionContext<'a> {
    /// `bars` may be the full run; only `..=index` is ever exposed.
    pub fn new(
        bars: &'a [Bar],
        index: usize,
        bindings: &'a Bindings,
        params: &'a ParamSet,
        side: Side,
    ) -> Self {
        Self {
            bars: &bars[..(index + 1).min(bars.len())],
            index,
            bindings,
            params,
            side,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bar(&self) -> &'a Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn bar_back(&self, back: usize) -> Option<&'a Bar> {
        self.index.checked_sub(back).and_then(|i| self.bars.get(i))
    }

    pub fn params(&self) -> &'a ParamSet {
        self.params
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    /// Value of binding `name` `back` bars before the current one.
    /// `Ok(None)` when that bar precedes the series or the value is not yet
    /// available; `Err` when nothing was bound under `name`.
    pub fn value(&self, name: &str, back: usize) -> Result<Option<f64>, BacktestError> {
        let series = self.bindings.get(name).ok_or_else(|| BacktestError::Computation {
            bar_index: self.index,
            timestamp: self.bar().timestamp,
            reason: format!("indicator '{}' was not bound at initialisation", name),
        })?;
        Ok(self.index.checked_sub(back).and_then(|i| series.get(i)))
    }

    /// `a` moved from strictly below `b` on the previous bar to strictly above
    /// it on this one.
    pub fn crossed_above(&self, a: &str, b: &str) -> Result<bool, BacktestError> {
        let (Some(a_prev), Some(a_now), Some(b_prev), Some(b_now)) = (
            self.value(a, 1)?,
            self.value(a, 0)?,
            self.value(b, 1)?,
            self.value(b, 0)?,
        ) else {
            return Ok(false);
        };
        Ok(a_prev < b_prev && a_now > b_now)
    }

    /// The shared entry rule: buy with `trade_size` unless already long.
    /// A short is closed first by the fill model.
    pub fn enter_long(&self) -> Result<Option<OrderIntent>, BacktestError> {
        if self.is_long() {
            return Ok(None);
        }
        Ok(Some(OrderIntent::Buy {
            size: self.params.trade_size()?,
        }))
    }

    /// The shared exit rule: close only a long position.
    pub fn exit_long(&self) -> Option<OrderIntent> {
        self.is_long().then_some(OrderIntent::Close)
    }
}
