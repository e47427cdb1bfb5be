//! Built-in indicator library implementing [`IndicatorPort`].

use std::collections::HashSet;

use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::lunar::calculate_lunar_age;
use crate::domain::indicator::macd::calculate_macd;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorKind, IndicatorOutput, IndicatorType, PriceField};
use crate::domain::indicator_helpers::{calc_atr, price_column, rolling_max, rolling_min};
use crate::domain::ohlcv::Bar;
use crate::ports::indicator_port::IndicatorPort;

const ALL_KINDS: [IndicatorKind; 9] = [
    IndicatorKind::Sma,
    IndicatorKind::Ema,
    IndicatorKind::Rsi,
    IndicatorKind::Atr,
    IndicatorKind::Macd,
    IndicatorKind::Bollinger,
    IndicatorKind::RollingMax,
    IndicatorKind::RollingMin,
    IndicatorKind::LunarAge,
];

#[derive(Debug, Clone)]
pub struct NativeIndicators {
    enabled: HashSet<IndicatorKind>,
}

impl Default for NativeIndicators {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeIndicators {
    pub fn new() -> Self {
        Self {
            enabled: ALL_KINDS.into_iter().collect(),
        }
    }

    /// A library restricted to the given capabilities. Used to model a
    /// deployment where an optional indicator family is not installed.
    pub fn with_kinds(kinds: &[IndicatorKind]) -> Self {
        Self {
            enabled: kinds.iter().copied().collect(),
        }
    }

    pub fn without(mut self, kind: IndicatorKind) -> Self {
        self.enabled.remove(&kind);
        self
    }
}

impl IndicatorPort for NativeIndicators {
    fn name(&self) -> &str {
        "native"
    }

    fn provides(&self, kind: IndicatorKind) -> bool {
        self.enabled.contains(&kind)
    }

    fn compute(&self, indicator: &IndicatorType, bars: &[Bar]) -> Option<IndicatorOutput> {
        if !self.provides(indicator.kind()) {
            return None;
        }
        let closes = || price_column(bars, PriceField::Close);

        let output = match indicator {
            IndicatorType::Sma(period) => IndicatorOutput::Single(calculate_sma(&closes(), *period)),
            IndicatorType::Ema(period) => IndicatorOutput::Single(calculate_ema(&closes(), *period)),
            IndicatorType::Rsi(period) => IndicatorOutput::Single(calculate_rsi(&closes(), *period)),
            IndicatorType::Atr(period) => IndicatorOutput::Single(calc_atr(bars, *period)),
            IndicatorType::Macd { fast, slow, signal } => {
                calculate_macd(&closes(), *fast, *slow, *signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => calculate_bollinger(&closes(), *period, *stddev_mult_x100),
            IndicatorType::RollingMax { field, period } => {
                IndicatorOutput::Single(rolling_max(&price_column(bars, *field), *period))
            }
            IndicatorType::RollingMin { field, period } => {
                IndicatorOutput::Single(rolling_min(&price_column(bars, *field), *period))
            }
            IndicatorType::LunarAge => {
                let timestamps: Vec<_> = bars.iter().map(|b| b.timestamp).collect();
                IndicatorOutput::Single(calculate_lunar_age(&timestamps))
            }
        };
        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::OutputField;
    use chrono::NaiveDate;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn provides_everything_by_default() {
        let lib = NativeIndicators::new();
        for kind in ALL_KINDS {
            assert!(lib.provides(kind), "{kind} missing");
        }
    }

    #[test]
    fn without_removes_capability() {
        let lib = NativeIndicators::new().without(IndicatorKind::LunarAge);
        assert!(!lib.provides(IndicatorKind::LunarAge));
        let bars = bars(&[1.0, 2.0]);
        assert!(lib.compute(&IndicatorType::LunarAge, &bars).is_none());
    }

    #[test]
    fn outputs_align_with_bars() {
        let lib = NativeIndicators::new();
        let closes: Vec<f64> = (1..=40).map(|x| x as f64).collect();
        let bars = bars(&closes);
        let types = [
            IndicatorType::Sma(5),
            IndicatorType::Ema(5),
            IndicatorType::Rsi(14),
            IndicatorType::Atr(14),
            IndicatorType::LunarAge,
            IndicatorType::RollingMax {
                field: PriceField::High,
                period: 10,
            },
        ];
        for t in types {
            let out = lib.compute(&t, &bars).unwrap();
            assert_eq!(out.select(OutputField::Value).unwrap().len(), 40, "{t}");
        }
    }

    #[test]
    fn rolling_max_reads_requested_field() {
        let lib = NativeIndicators::new();
        let bars = bars(&[10.0, 12.0, 11.0]);
        let out = lib
            .compute(
                &IndicatorType::RollingMax {
                    field: PriceField::High,
                    period: 2,
                },
                &bars,
            )
            .unwrap();
        let series = out.select(OutputField::Value).unwrap();
        assert_eq!(series.values, vec![None, Some(13.0), Some(13.0)]);
    }

    #[test]
    fn restricted_library() {
        let lib = NativeIndicators::with_kinds(&[IndicatorKind::Sma]);
        assert!(lib.provides(IndicatorKind::Sma));
        assert!(!lib.provides(IndicatorKind::Macd));
    }
}
