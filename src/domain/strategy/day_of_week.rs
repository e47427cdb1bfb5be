//! Calendar strategy keyed on the weekday (Monday = 0).

use chrono::Datelike;

use super::{DecisionContext, OrderIntent, Strategy};
use crate::domain::error::BacktestError;
use crate::domain::indicator::IndicatorCache;
use crate::domain::params::{ParamSet, ParamSpec, TRADE_SIZE};

pub struct DayOfWeek;

const SCHEMA: &[ParamSpec] = &[
    TRADE_SIZE,
    ParamSpec::integer("buy_day", 0, 0, 6),
    ParamSpec::integer("sell_day", 4, 0, 6),
];

impl Strategy for DayOfWeek {
    fn id(&self) -> &'static str {
        "day_of_week"
    }

    fn description(&self) -> &'static str {
        "Buy on weekday buy_day, close on weekday sell_day (Monday = 0)"
    }

    fn schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn initialize(&self, _params: &ParamSet, _cache: &mut IndicatorCache<'_>) -> Result<(), BacktestError> {
        Ok(())
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<OrderIntent>, BacktestError> {
        let weekday = ctx.bar().timestamp.weekday().num_days_from_monday() as i64;

        if weekday == ctx.params().integer("buy_day")? {
            ctx.enter_long()
        } else if weekday == ctx.params().integer("sell_day")? {
            Ok(ctx.exit_long())
        } else {
            Ok(None)
        }
    }
}
