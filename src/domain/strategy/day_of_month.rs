//! Calendar strategy keyed on day-of-month windows (inclusive bounds).

use chrono::Datelike;

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::IndicatorCache;
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct DayOfMonth;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::integer("buy_day_start", 1, 1, 31),
    ParamSpec::integer("buy_day_end", 5, 1, 31),
    ParamSpec::integer("sell_day_start", 14, 1, 31),
    ParamSpec::integer("sell_day_end", 18, 1, 31),
];

impl Strategy for DayOfMonth {
    fn id(&self) -> &'static str {
        "day_of_month"
    }

    fn description(&self) -> &'static str {
        "Buy on days buy_day_start..=buy_day_end of the month, close on sell_day_start..=sell_day_end"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn initialize(&self, _params: &ParamSet, _cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        Ok(())
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        let params = ctx.params();
        let day = ctx.bar().timestamp.day() as i64;
        let buy = params.integer("buy_day_start")?..=params.integer("buy_day_end")?;
        let sell = params.integer("sell_day_start")?..=params.integer("sell_day_end")?;

        if buy.contains(&day) {
            ctx.enter_long()
        } else if sell.contains(&day) {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}
