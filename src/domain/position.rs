//! Open position and closed-trade records.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// Position side as observed at a bar: flat or holding one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Flat,
    Long,
    Short,
}

impl From<Option<Direction>> for Side {
    fn from(direction: Option<Direction>) -> Self {
        match direction {
            None => Side::Flat,
            Some(Direction::Long) => Side::Long,
            Some(Direction::Short) => Side::Short,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub direction: Direction,
    /// Always positive; the direction carries the sign.
    pub units: f64,
    /// Fraction of equity requested at entry.
    pub size: f64,
    pub entry_price: f64,
    pub entry_timestamp: NaiveDateTime,
    pub entry_index: usize,
    pub entry_commission: f64,
}

impl Position {
    pub fn signed_units(&self) -> f64 {
        self.direction.sign() * self.units
    }

    pub fn notional(&self, price: f64) -> f64 {
        self.units * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.signed_units() * (price - self.entry_price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub direction: Direction,
    pub units: f64,
    pub size: f64,
    pub entry_index: usize,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub gross_pnl: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub net_pnl: f64,
    /// Net P&L as a percentage of entry notional.
    pub return_pct: f64,
    pub bars_held: usize,
}

impl Trade {
    /// Realise `position` at `exit_price`.
    pub fn close(
        position: &Position,
        exit_index: usize,
        exit_timestamp: NaiveDateTime,
        exit_price: f64,
        exit_commission: f64,
    ) -> Self {
        let gross_pnl = position.unrealized_pnl(exit_price);
        let commission = position.entry_commission + exit_commission;
        let net_pnl = gross_pnl - commission;
        let entry_notional = position.notional(position.entry_price);
        let return_pct = if entry_notional > 0.0 {
            net_pnl / entry_notional * 100.0
        } else {
            0.0
        };

        Trade {
            direction: position.direction,
            units: position.units,
            size: position.size,
            entry_index: position.entry_index,
            entry_timestamp: position.entry_timestamp,
            entry_price: position.entry_price,
            exit_index,
            exit_timestamp,
            exit_price,
            gross_pnl,
            commission,
            net_pnl,
            return_pct,
            bars_held: exit_index - position.entry_index,
        }
    }

    pub fn duration(&self) -> Duration {
        self.exit_timestamp - self.entry_timestamp
    }

    pub fn is_win(&self) -> bool {
        self.net_pnl > 0.0
    }
}
