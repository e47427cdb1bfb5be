//! Lunar cycle strategy: buy a few days after the new moon, close a few days
//! after the full moon. Needs the lunar-age capability from the indicator
//! library.

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::lunar::HALF_SYNODIC_MONTH_DAYS;
use crate::domain::indicator::{IndicatorCache, IndicatorKind, IndicatorType, OutputField};
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct LunarPhase;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::integer("days_after_new_moon_buy", 2, 0, 29),
    ParamSpec::integer("buy_window_days", 3, 1, 30),
    ParamSpec::integer("days_after_full_moon_sell", 2, 0, 29),
    ParamSpec::integer("sell_window_days", 3, 1, 30),
];

/// Half-open window `[start, start + len)` in whole days.
fn in_window(days: i64, start: i64, len: i64) -> bool {
    days >= start && days < start + len
}

impl Strategy for LunarPhase {
    fn id(&self) -> &'static str {
        "lunar_phase"
    }

    fn description(&self) -> &'static str {
        "Buy days_after_new_moon_buy days after the new moon, close days_after_full_moon_sell days after the full moon"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn required_indicators(&self) -> &'static [IndicatorKind] {
        &[IndicatorKind::LunarAge]
    }

    fn initialize(&self, _params: &ParamSet, cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        cache.bind_indicator("lunar_age", IndicatorType::LunarAge, OutputField::Value)
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        let Some(age) = ctx.value("lunar_age", 0)? else {
            return Ok(None);
        };
        let params = ctx.params();
        let buy_start = params.integer("days_after_new_moon_buy")?;
        let buy_len = params.integer("buy_window_days")?;
        let sell_start = params.integer("days_after_full_moon_sell")?;
        let sell_len = params.integer("sell_window_days")?;

        let since_new = age.floor() as i64;
        // no full moon yet this cycle
        let since_full = (age > HALF_SYNODIC_MONTH_DAYS)
            .then(|| (age - HALF_SYNODIC_MONTH_DAYS).floor() as i64);

        if in_window(since_new, buy_start, buy_len) {
            ctx.enter_long()
        } else if since_full.is_some_and(|days| in_window(days, sell_start, sell_len)) {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_half_open() {
        assert!(!in_window(1, 2, 3));
        assert!(in_window(2, 2, 3));
        assert!(in_window(4, 2, 3));
        assert!(!in_window(5, 2, 3));
    }
}
