//! Donchian channel breakout. The channel is built from the bars before the
//! current one, so a close can actually break out of it.

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::{IndicatorCache, IndicatorKind, IndicatorType, OutputField, PriceField};
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct DonchianChannel;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::period("n_high", 20),
    ParamSpec::period("n_low", 20),
];

impl Strategy for DonchianChannel {
    fn id(&self) -> &'static str {
        "donchian_channel"
    }

    fn description(&self) -> &'static str {
        "Buy when close breaks the prior n_high-bar high, close when it breaks the prior n_low-bar low"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn required_indicators(&self) -> &'static [IndicatorKind] {
        &[IndicatorKind::RollingMax, IndicatorKind::RollingMin]
    }

    fn initialize(&self, params: &ParamSet, cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        let high = cache.series(
            &IndicatorType::RollingMax {
                field: PriceField::High,
                period: params.period("n_high")?,
            },
            OutputField::Value,
        )?;
        let low = cache.series(
            &IndicatorType::RollingMin {
                field: PriceField::Low,
                period: params.period("n_low")?,
            },
            OutputField::Value,
        )?;
        cache.bind("channel_high", high.shifted(1))?;
        cache.bind("channel_low", low.shifted(1))
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        let (Some(high), Some(low)) = (ctx.value("channel_high", 0)?, ctx.value("channel_low", 0)?) else {
            return Ok(None);
        };
        let price = ctx.bar().close;

        if price > high {
            ctx.enter_long()
        } else if price < low {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}
