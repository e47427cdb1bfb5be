//! RSI mean reversion: buy on a drop into oversold, close on a rise into
//! overbought.

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::{IndicatorCache, IndicatorKind, IndicatorType, OutputField};
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct RsiOscillator;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::period("rsi_period", 14),
    ParamSpec::range("upper_bound", 70.0, 0.0, 100.0),
    ParamSpec::range("lower_bound", 30.0, 0.0, 100.0),
];

impl Strategy for RsiOscillator {
    fn id(&self) -> &'static str {
        "rsi_oscillator"
    }

    fn description(&self) -> &'static str {
        "Buy when RSI crosses below lower_bound, close when it crosses above upper_bound"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn required_indicators(&self) -> &'static [IndicatorKind] {
        &[IndicatorKind::Rsi]
    }

    fn initialize(&self, params: &ParamSet, cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        cache.bind_indicator(
            "rsi",
            IndicatorType::Rsi(params.period("rsi_period")?),
            OutputField::Value,
        )
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        let (Some(now), Some(prev)) = (ctx.value("rsi", 0)?, ctx.value("rsi", 1)?) else {
            return Ok(None);
        };
        let upper = ctx.params().value("upper_bound")?;
        let lower = ctx.params().value("lower_bound")?;

        if now < lower && prev >= lower {
            ctx.enter_long()
        } else if now > upper && prev <= upper {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}
