//! Fill simulation against a single bar's close.
//!
//! Sizing is a fraction of current mark-to-market equity, with commission
//! reserved out of that budget so that notional plus entry commission equals
//! `equity * size`. Unit counts stay fractional.

use chrono::NaiveDateTime;
use tracing::debug;

use super::error::BacktestError;
use super::portfolio::Portfolio;
use super::position::{Direction, Position, Trade};
use super::strategy::OrderIntent;

pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: DEFAULT_COMMISSION_RATE,
        }
    }
}

/// Where and when a fill happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillPoint {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

pub fn calculate_commission(notional: f64, config: &ExecutionConfig) -> f64 {
    notional * config.commission_rate
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        units: f64,
        price: f64,
        commission: f64,
    },
    /// Equity was not positive, nothing to size against.
    InsufficientEquity,
}

/// Open a position while flat.
pub fn open_position(
    portfolio: &mut Portfolio,
    direction: Direction,
    size: f64,
    fill: FillPoint,
    config: &ExecutionConfig,
) -> EntryResult {
    let equity = portfolio.equity(fill.price);
    if equity <= 0.0 || !equity.is_finite() {
        return EntryResult::InsufficientEquity;
    }

    let units = equity * size / (fill.price * (1.0 + config.commission_rate));
    let notional = units * fill.price;
    let commission = calculate_commission(notional, config);

    match direction {
        Direction::Long => portfolio.cash -= notional + commission,
        Direction::Short => portfolio.cash += notional - commission,
    }

    portfolio.position = Some(Position {
        direction,
        units,
        size,
        entry_price: fill.price,
        entry_timestamp: fill.timestamp,
        entry_index: fill.index,
        entry_commission: commission,
    });

    EntryResult::Entered {
        units,
        price: fill.price,
        commission,
    }
}

/// Close the open position, if any, and append the realised trade.
pub fn close_position(
    portfolio: &mut Portfolio,
    fill: FillPoint,
    config: &ExecutionConfig,
) -> Option<Trade> {
    let position = portfolio.position.take()?;
    let notional = position.notional(fill.price);
    let commission = calculate_commission(notional, config);

    match position.direction {
        Direction::Long => portfolio.cash += notional - commission,
        Direction::Short => portfolio.cash -= notional + commission,
    }

    let trade = Trade::close(&position, fill.index, fill.timestamp, fill.price, commission);
    portfolio.record_trade(trade.clone());
    Some(trade)
}

/// What applying one intent did to the portfolio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntentOutcome {
    pub closed: Option<Trade>,
    pub opened: Option<Direction>,
}

/// Apply an order intent at `fill`.
///
/// A reversal closes the existing position (emitting its trade) before the
/// new side opens, so the position passes through flat within the bar.
pub fn apply_intent(
    portfolio: &mut Portfolio,
    intent: OrderIntent,
    fill: FillPoint,
    config: &ExecutionConfig,
) -> Result<IntentOutcome, BacktestError> {
    let (direction, size) = match intent {
        OrderIntent::Close => {
            return Ok(IntentOutcome {
                closed: close_position(portfolio, fill, config),
                opened: None,
            });
        }
        OrderIntent::Buy { size } => (Direction::Long, size),
        OrderIntent::Sell { size } => (Direction::Short, size),
    };

    if !(size > 0.0 && size <= 1.0) {
        return Err(BacktestError::Computation {
            bar_index: fill.index,
            timestamp: fill.timestamp,
            reason: format!("order size {} is outside (0, 1]", size),
        });
    }

    let mut outcome = IntentOutcome::default();
    match portfolio.position.as_ref().map(|p| p.direction) {
        Some(current) if current == direction => return Ok(outcome),
        Some(_) => outcome.closed = close_position(portfolio, fill, config),
        None => {}
    }

    match open_position(portfolio, direction, size, fill, config) {
        EntryResult::Entered { units, price, .. } => {
            debug!(index = fill.index, ?direction, units, price, "position opened");
            outcome.opened = Some(direction);
        }
        EntryResult::InsufficientEquity => {
            debug!(index = fill.index, ?direction, "entry skipped, equity not positive");
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Side;
    use chrono::NaiveDate;

    fn fill(index: usize, price: f64) -> FillPoint {
        FillPoint {
            index,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1 + index as u32)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            price,
        }
    }

    fn no_commission() -> ExecutionConfig {
        ExecutionConfig {
            commission_rate: 0.0,
        }
    }

    #[test]
    fn default_commission() {
        let config = ExecutionConfig::default();
        assert!((config.commission_rate - 0.001).abs() < f64::EPSILON);
        assert!((calculate_commission(10_000.0, &config) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn open_long_uses_fraction_of_equity() {
        let mut portfolio = Portfolio::new(10_000.0);
        let result = open_position(&mut portfolio, Direction::Long, 0.5, fill(0, 100.0), &no_commission());
        match result {
            EntryResult::Entered { units, .. } => assert!((units - 50.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
        assert!((portfolio.cash - 5_000.0).abs() < 1e-9);
        assert!((portfolio.equity(100.0) - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn open_long_reserves_commission() {
        let config = ExecutionConfig {
            commission_rate: 0.01,
        };
        let mut portfolio = Portfolio::new(10_100.0);
        open_position(&mut portfolio, Direction::Long, 1.0, fill(0, 100.0), &config);
        let pos = portfolio.position.as_ref().unwrap();
        // 10100 / (100 * 1.01) = 100 units, notional 10000, commission 100
        assert!((pos.units - 100.0).abs() < 1e-9);
        assert!((pos.entry_commission - 100.0).abs() < 1e-9);
        assert!(portfolio.cash.abs() < 1e-9);
    }

    #[test]
    fn round_trip_long_with_commission() {
        let config = ExecutionConfig {
            commission_rate: 0.01,
        };
        let mut portfolio = Portfolio::new(10_100.0);
        open_position(&mut portfolio, Direction::Long, 1.0, fill(0, 100.0), &config);
        let trade = close_position(&mut portfolio, fill(3, 110.0), &config).unwrap();

        assert!((trade.gross_pnl - 1_000.0).abs() < 1e-9);
        // 100 entry + 110 exit
        assert!((trade.commission - 210.0).abs() < 1e-9);
        assert!((trade.net_pnl - 790.0).abs() < 1e-9);
        assert!((portfolio.cash - (10_100.0 + 790.0)).abs() < 1e-9);
        assert!(portfolio.is_flat());
        assert_eq!(portfolio.trades.len(), 1);
    }

    #[test]
    fn short_round_trip() {
        let mut portfolio = Portfolio::new(10_000.0);
        open_position(&mut portfolio, Direction::Short, 1.0, fill(0, 100.0), &no_commission());
        assert!((portfolio.cash - 20_000.0).abs() < 1e-9);
        assert!((portfolio.equity(90.0) - 11_000.0).abs() < 1e-9);

        let trade = close_position(&mut portfolio, fill(1, 90.0), &no_commission()).unwrap();
        assert!((trade.net_pnl - 1_000.0).abs() < 1e-9);
        assert!((portfolio.cash - 11_000.0).abs() < 1e-9);
    }

    #[test]
    fn close_when_flat_is_noop() {
        let mut portfolio = Portfolio::new(10_000.0);
        let outcome = apply_intent(&mut portfolio, OrderIntent::Close, fill(0, 100.0), &no_commission()).unwrap();
        assert_eq!(outcome, IntentOutcome::default());
        assert!((portfolio.cash - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn buy_when_long_is_noop() {
        let mut portfolio = Portfolio::new(10_000.0);
        apply_intent(&mut portfolio, OrderIntent::Buy { size: 0.5 }, fill(0, 100.0), &no_commission()).unwrap();
        let cash = portfolio.cash;
        let outcome = apply_intent(&mut portfolio, OrderIntent::Buy { size: 0.5 }, fill(1, 120.0), &no_commission()).unwrap();
        assert_eq!(outcome.opened, None);
        assert!(outcome.closed.is_none());
        assert!((portfolio.cash - cash).abs() < f64::EPSILON);
    }

    #[test]
    fn buy_when_short_reverses_through_flat() {
        let mut portfolio = Portfolio::new(10_000.0);
        apply_intent(&mut portfolio, OrderIntent::Sell { size: 1.0 }, fill(0, 100.0), &no_commission()).unwrap();
        assert_eq!(portfolio.side(), Side::Short);

        let outcome = apply_intent(&mut portfolio, OrderIntent::Buy { size: 1.0 }, fill(1, 90.0), &no_commission()).unwrap();
        let trade = outcome.closed.expect("short closed");
        assert_eq!(trade.direction, Direction::Short);
        assert!((trade.net_pnl - 1_000.0).abs() < 1e-9);
        assert_eq!(outcome.opened, Some(Direction::Long));
        assert_eq!(portfolio.side(), Side::Long);
        // new long sized off post-close equity of 11000
        assert!((portfolio.position.as_ref().unwrap().units - 11_000.0 / 90.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_size_is_computation_error() {
        let mut portfolio = Portfolio::new(10_000.0);
        let err = apply_intent(&mut portfolio, OrderIntent::Buy { size: 1.5 }, fill(4, 100.0), &no_commission()).unwrap_err();
        assert!(matches!(err, BacktestError::Computation { bar_index: 4, .. }));
        assert!(portfolio.is_flat());
    }

    #[test]
    fn no_entry_without_equity() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.cash = -1.0;
        let result = open_position(&mut portfolio, Direction::Long, 1.0, fill(0, 100.0), &no_commission());
        assert_eq!(result, EntryResult::InsufficientEquity);
        assert!(portfolio.is_flat());
    }
}
