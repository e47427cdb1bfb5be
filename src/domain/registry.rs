//! Static strategy registry: identifier to strategy value.

use super::error::BacktestError;
use super::indicator::IndicatorKind;
use super::strategy::bollinger_bands::BollingerBands;
use super::strategy::day_of_month::DayOfMonth;
use super::strategy::day_of_week::DayOfWeek;
use super::strategy::donchian_channel::DonchianChannel;
use super::strategy::ichimoku::Ichimoku;
use super::strategy::lunar_phase::LunarPhase;
use super::strategy::macd::Macd;
use super::strategy::rsi_oscillator::RsiOscillator;
use super::strategy::sma_cross::SmaCross;
use super::strategy::volatility_breakout::VolatilityBreakout;
use super::strategy::Strategy;
use crate::ports::indicator_port::IndicatorPort;

static STRATEGIES: [&(dyn Strategy); 10] = [
    &SmaCross,
    &RsiOscillator,
    &Macd,
    &BollingerBands,
    &VolatilityBreakout,
    &DonchianChannel,
    &Ichimoku,
    &DayOfWeek,
    &DayOfMonth,
    &LunarPhase,
];

pub fn all() -> &'static [&'static dyn Strategy] {
    &STRATEGIES
}

pub fn lookup(id: &str) -> Result<&'static dyn Strategy, BacktestError> {
    STRATEGIES
        .iter()
        .copied()
        .find(|s| s.id() == id)
        .ok_or_else(|| BacktestError::UnknownStrategy { name: id.to_string() })
}

/// First required capability the library lacks, if any.
pub fn missing_capability(strategy: &dyn Strategy, library: &dyn IndicatorPort) -> Option<IndicatorKind> {
    strategy
        .required_indicators()
        .iter()
        .copied()
        .find(|&kind| !library.provides(kind))
}

/// Fail with `IndicatorUnavailable` unless `library` covers the strategy.
pub fn check_available(strategy: &dyn Strategy, library: &dyn IndicatorPort) -> Result<(), BacktestError> {
    match missing_capability(strategy, library) {
        Some(kind) => Err(BacktestError::IndicatorUnavailable {
            strategy: strategy.id().to_string(),
            indicator: kind.to_string(),
        }),
        None => Ok(()),
    }
}

/// Identifiers of the strategies `library` can run.
pub fn available(library: &dyn IndicatorPort) -> Vec<&'static str> {
    STRATEGIES
        .iter()
        .filter(|s| missing_capability(**s, library).is_none())
        .map(|s| s.id())
        .collect()
}
