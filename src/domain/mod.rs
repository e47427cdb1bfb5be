//! Core domain types and logic: bars, indicators, strategies and the engine.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_helpers;
pub mod params;
pub mod strategy;
pub mod registry;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod error;
pub mod config_validation;
