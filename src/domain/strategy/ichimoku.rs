//! Ichimoku Kinko Hyo cloud strategy.
//!
//! Tenkan and kijun are high/low midpoints; the cloud spans senkou A
//! (tenkan/kijun average) and senkou B (long midpoint), both displaced
//! forward. Entry needs price above the cloud, a bullish tenkan/kijun cross
//! and a close above the close `chikou_period` bars ago; exit mirrors it.

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::{
    IndicatorCache, IndicatorKind, IndicatorSeries, IndicatorType, OutputField, PriceField,
};
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct Ichimoku;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::period("tenkan_period", 9),
    ParamSpec::period("kijun_period", 26),
    ParamSpec::period("senkou_b_period", 52),
    ParamSpec::period("chikou_period", 26),
    ParamSpec::period("senkou_displacement", 26),
];

fn midpoint(cache: &mut IndicatorCache<'_>, period: usize) -> Result<IndicatorSeries, BacktestError> {
    let high = cache.series(
        &IndicatorType::RollingMax {
            field: PriceField::High,
            period,
        },
        OutputField::Value,
    )?;
    let low = cache.series(
        &IndicatorType::RollingMin {
            field: PriceField::Low,
            period,
        },
        OutputField::Value,
    )?;
    Ok(high.zip_with(&low, |h, l| (h + l) / 2.0))
}

impl Strategy for Ichimoku {
    fn id(&self) -> &'static str {
        "ichimoku"
    }

    fn description(&self) -> &'static str {
        "Buy above the cloud on a bullish tenkan/kijun cross with chikou confirmation, close on the mirror"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn required_indicators(&self) -> &'static [IndicatorKind] {
        &[IndicatorKind::RollingMax, IndicatorKind::RollingMin]
    }

    fn initialize(&self, params: &ParamSet, cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        let displacement = params.period("senkou_displacement")?;
        let tenkan = midpoint(cache, params.period("tenkan_period")?)?;
        let kijun = midpoint(cache, params.period("kijun_period")?)?;
        let senkou_a = tenkan.zip_with(&kijun, |t, k| (t + k) / 2.0).shifted(displacement);
        let senkou_b = midpoint(cache, params.period("senkou_b_period")?)?.shifted(displacement);

        cache.bind("tenkan", tenkan)?;
        cache.bind("kijun", kijun)?;
        cache.bind("senkou_a", senkou_a)?;
        cache.bind("senkou_b", senkou_b)
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        let params = ctx.params();
        let warmup = params.period("kijun_period")?.max(params.period("senkou_b_period")?)
            + params.period("senkou_displacement")?;
        if ctx.index() < warmup {
            return Ok(None);
        }

        let (Some(tenkan), Some(kijun), Some(span_a), Some(span_b)) = (
            ctx.value("tenkan", 0)?,
            ctx.value("kijun", 0)?,
            ctx.value("senkou_a", 0)?,
            ctx.value("senkou_b", 0)?,
        ) else {
            return Ok(None);
        };
        let (Some(tenkan_prev), Some(kijun_prev)) = (ctx.value("tenkan", 1)?, ctx.value("kijun", 1)?) else {
            return Ok(None);
        };
        let Some(lagged) = ctx.bar_back(params.period("chikou_period")?) else {
            return Ok(None);
        };

        let price = ctx.bar().close;
        let above_cloud = price > span_a.max(span_b);
        let below_cloud = price < span_a.min(span_b);
        let bullish_cross = tenkan_prev <= kijun_prev && tenkan > kijun;
        let bearish_cross = tenkan_prev >= kijun_prev && tenkan < kijun;

        if above_cloud && bullish_cross && price > lagged.close {
            ctx.enter_long()
        } else if below_cloud && bearish_cross && price < lagged.close {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}
