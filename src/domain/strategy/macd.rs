//! MACD line / signal line crossover.

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{IndicatorCache, IndicatorKind, IndicatorType, OutputField};
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct Macd;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::period("fast_period", DEFAULT_FAST),
    ParamSpec::period("slow_period", DEFAULT_SLOW),
    ParamSpec::period("signal_period", DEFAULT_SIGNAL),
];

impl Strategy for Macd {
    fn id(&self) -> &'static str {
        "macd"
    }

    fn description(&self) -> &'static str {
        "Buy when the MACD line crosses above its signal line, close on the opposite cross"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn required_indicators(&self) -> &'static [IndicatorKind] {
        &[IndicatorKind::Macd]
    }

    fn initialize(&self, params: &ParamSet, cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        let macd = IndicatorType::Macd {
            fast: params.period("fast_period")?,
            slow: params.period("slow_period")?,
            signal: params.period("signal_period")?,
        };
        cache.bind_indicator("macd", macd.clone(), OutputField::MacdLine)?;
        cache.bind_indicator("signal", macd, OutputField::MacdSignal)
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        if ctx.crossed_above("macd", "signal")? {
            ctx.enter_long()
        } else if ctx.crossed_above("signal", "macd")? {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}
