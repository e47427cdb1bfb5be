//! Bollinger band mean reversion.

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::{IndicatorCache, IndicatorKind, IndicatorType, OutputField};
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct BollingerBands;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::period("bb_period", 20),
    ParamSpec::positive("bb_std_dev", 2.0),
];

impl Strategy for BollingerBands {
    fn id(&self) -> &'static str {
        "bollinger_bands"
    }

    fn description(&self) -> &'static str {
        "Buy at or below the lower band, close at or above the upper band"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn required_indicators(&self) -> &'static [IndicatorKind] {
        &[IndicatorKind::Bollinger]
    }

    fn initialize(&self, params: &ParamSet, cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        let bands = IndicatorType::bollinger(params.period("bb_period")?, params.value("bb_std_dev")?);
        cache.bind_indicator("upper", bands.clone(), OutputField::Upper)?;
        cache.bind_indicator("lower", bands, OutputField::Lower)
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        let (Some(upper), Some(lower)) = (ctx.value("upper", 0)?, ctx.value("lower", 0)?) else {
            return Ok(None);
        };
        let price = ctx.bar().close;

        if price <= lower {
            ctx.enter_long()
        } else if price >= upper {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}
