//! Run-scoped account state: cash, at most one open position, trade log and
//! equity curve.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::position::{Position, Side, Trade};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
    pub cash: f64,
    pub side: Side,
}

/// Account state at the start of a bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    cash: f64,
    position: Option<Position>,
    trades: usize,
    curve: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_cash: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Portfolio {
            cash: initial_cash,
            initial_cash,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        Side::from(self.position.as_ref().map(|p| p.direction))
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Mark-to-market account value: cash plus signed position value.
    pub fn equity(&self, price: f64) -> f64 {
        match &self.position {
            Some(pos) => self.cash + pos.signed_units() * price,
            None => self.cash,
        }
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            cash: self.cash,
            position: self.position.clone(),
            trades: self.trades.len(),
            curve: self.equity_curve.len(),
        }
    }

    /// Undo every fill and curve point recorded since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.cash = checkpoint.cash;
        self.position = checkpoint.position;
        self.trades.truncate(checkpoint.trades);
        self.equity_curve.truncate(checkpoint.curve);
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime, price: f64) -> f64 {
        let equity = self.equity(price);
        self.equity_curve.push(EquityPoint {
            timestamp,
            equity,
            cash: self.cash,
            side: self.side(),
        });
        equity
    }
}
