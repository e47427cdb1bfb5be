//! Moving-average crossover.

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::{IndicatorCache, IndicatorKind, IndicatorType, OutputField};
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct SmaCross;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::period("n1", 10),
    ParamSpec::period("n2", 30),
];

impl Strategy for SmaCross {
    fn id(&self) -> &'static str {
        "sma_cross"
    }

    fn description(&self) -> &'static str {
        "Buy when SMA(n1) crosses above SMA(n2), close when it crosses back below"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn required_indicators(&self) -> &'static [IndicatorKind] {
        &[IndicatorKind::Sma]
    }

    fn initialize(&self, params: &ParamSet, cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        cache.bind_indicator("fast", IndicatorType::Sma(params.period("n1")?), OutputField::Value)?;
        cache.bind_indicator("slow", IndicatorType::Sma(params.period("n2")?), OutputField::Value)
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        if ctx.crossed_above("fast", "slow")? {
            ctx.enter_long()
        } else if ctx.crossed_above("slow", "fast")? {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}
