//! Indicator library port.
//!
//! Strategies never reach for indicator functions directly; they receive a
//! handle implementing this trait through [`crate::domain::indicator::IndicatorCache`].

use crate::domain::indicator::{IndicatorKind, IndicatorOutput, IndicatorType};
use crate::domain::ohlcv::Bar;

pub trait IndicatorPort: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    fn provides(&self, kind: IndicatorKind) -> bool;

    /// Compute an indicator over the whole bar sequence. Every returned series
    /// must have one entry per bar. `None` if the library lacks the capability.
    fn compute(&self, indicator: &IndicatorType, bars: &[Bar]) -> Option<IndicatorOutput>;
}
