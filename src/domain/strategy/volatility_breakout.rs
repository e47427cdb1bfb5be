//! ATR breakout above a moving-average base.

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::{IndicatorCache, IndicatorKind, IndicatorType, OutputField};
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct VolatilityBreakout;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::period("atr_period", 14),
    ParamSpec::period("ma_period", 20),
    ParamSpec::positive("atr_multiplier", 2.0),
];

impl Strategy for VolatilityBreakout {
    fn id(&self) -> &'static str {
        "volatility_breakout"
    }

    fn description(&self) -> &'static str {
        "Buy when close exceeds SMA + ATR * atr_multiplier, close when it falls below the SMA"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn required_indicators(&self) -> &'static [IndicatorKind] {
        &[IndicatorKind::Atr, IndicatorKind::Sma]
    }

    fn initialize(&self, params: &ParamSet, cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        cache.bind_indicator("atr", IndicatorType::Atr(params.period("atr_period")?), OutputField::Value)?;
        cache.bind_indicator("ma", IndicatorType::Sma(params.period("ma_period")?), OutputField::Value)
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        let (Some(ma), Some(atr)) = (ctx.value("ma", 0)?, ctx.value("atr", 0)?) else {
            return Ok(None);
        };
        let multiplier = ctx.params().value("atr_multiplier")?;
        let price = ctx.bar().close;

        if price > ma + atr * multiplier {
            ctx.enter_long()
        } else if price < ma {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}
