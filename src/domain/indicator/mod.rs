//! Technical indicator types and implementations.
//!
//! - `IndicatorType`: indicator identity + parameters (serves as cache key)
//! - `IndicatorKind`: the capability an `IndicatorType` needs from a library
//! - `IndicatorSeries`: one output aligned 1:1 with the bars, `None` during warmup
//! - `IndicatorOutput`: the shape a computation returns (single, MACD, bands)

pub mod bollinger;
pub mod cache;
pub mod ema;
pub mod lunar;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use cache::{Bindings, IndicatorCache};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma,
    Ema,
    Rsi,
    Atr,
    Macd,
    Bollinger,
    RollingMax,
    RollingMin,
    LunarAge,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Atr => "ATR",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Bollinger => "BOLLINGER",
            IndicatorKind::RollingMax => "MAX",
            IndicatorKind::RollingMin => "MIN",
            IndicatorKind::LunarAge => "LUNAR_AGE",
        };
        f.write_str(name)
    }
}

/// Which price column an indicator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    RollingMax {
        field: PriceField,
        period: usize,
    },
    RollingMin {
        field: PriceField,
        period: usize,
    },
    LunarAge,
}

impl IndicatorType {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorType::Sma(_) => IndicatorKind::Sma,
            IndicatorType::Ema(_) => IndicatorKind::Ema,
            IndicatorType::Rsi(_) => IndicatorKind::Rsi,
            IndicatorType::Atr(_) => IndicatorKind::Atr,
            IndicatorType::Macd { .. } => IndicatorKind::Macd,
            IndicatorType::Bollinger { .. } => IndicatorKind::Bollinger,
            IndicatorType::RollingMax { .. } => IndicatorKind::RollingMax,
            IndicatorType::RollingMin { .. } => IndicatorKind::RollingMin,
            IndicatorType::LunarAge => IndicatorKind::LunarAge,
        }
    }

    pub fn bollinger(period: usize, stddev_mult: f64) -> Self {
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100: (stddev_mult * 100.0).round().max(0.0) as u32,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::RollingMax { field, period } => {
                write!(f, "MAX({:?},{})", field, period)
            }
            IndicatorType::RollingMin { field, period } => {
                write!(f, "MIN({:?},{})", field, period)
            }
            IndicatorType::LunarAge => write!(f, "LUNAR_AGE"),
        }
    }
}

/// A derived series aligned with the bars. `None` marks "not yet available".
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Index of the first defined value, if any.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(|v| v.is_some())
    }

    /// Values shifted forward by `periods`; the first `periods` slots become `None`.
    pub fn shifted(&self, periods: usize) -> Self {
        let n = self.values.len();
        let values = (0..n)
            .map(|i| if i >= periods { self.values[i - periods] } else { None })
            .collect();
        Self { values }
    }

    /// Element-wise combination; `None` wherever either side is undefined.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some(f(*a, *b)),
                _ => None,
            })
            .collect();
        Self { values }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorOutput {
    Single(IndicatorSeries),
    Macd {
        line: IndicatorSeries,
        signal: IndicatorSeries,
        histogram: IndicatorSeries,
    },
    Bands {
        upper: IndicatorSeries,
        middle: IndicatorSeries,
        lower: IndicatorSeries,
    },
}

/// Selects one series out of an `IndicatorOutput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputField {
    Value,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    Upper,
    Middle,
    Lower,
}

impl IndicatorOutput {
    pub fn select(&self, field: OutputField) -> Option<&IndicatorSeries> {
        match (self, field) {
            (IndicatorOutput::Single(s), OutputField::Value) => Some(s),
            (IndicatorOutput::Macd { line, .. }, OutputField::MacdLine) => Some(line),
            (IndicatorOutput::Macd { signal, .. }, OutputField::MacdSignal) => Some(signal),
            (IndicatorOutput::Macd { histogram, .. }, OutputField::MacdHistogram) => {
                Some(histogram)
            }
            (IndicatorOutput::Bands { upper, .. }, OutputField::Upper) => Some(upper),
            (IndicatorOutput::Bands { middle, .. }, OutputField::Middle) => Some(middle),
            (IndicatorOutput::Bands { lower, .. }, OutputField::Lower) => Some(lower),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        assert_eq!(IndicatorType::bollinger(20, 2.0).to_string(), "BOLLINGER(20,2)");
        assert_eq!(IndicatorType::bollinger(20, 2.5).to_string(), "BOLLINGER(20,2.5)");
    }

    #[test]
    fn indicator_type_kind() {
        assert_eq!(IndicatorType::Atr(14).kind(), IndicatorKind::Atr);
        assert_eq!(
            IndicatorType::RollingMax {
                field: PriceField::High,
                period: 20
            }
            .kind(),
            IndicatorKind::RollingMax
        );
    }

    #[test]
    fn indicator_type_hash_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(IndicatorType::Sma(20), "sma20");
        map.insert(IndicatorType::Sma(50), "sma50");

        assert_eq!(map.get(&IndicatorType::Sma(20)), Some(&"sma20"));
        assert_eq!(map.get(&IndicatorType::Sma(50)), Some(&"sma50"));
        assert_eq!(map.get(&IndicatorType::Ema(20)), None);
    }

    #[test]
    fn series_first_defined_and_get() {
        let s = IndicatorSeries::new(vec![None, None, Some(1.0), Some(2.0)]);
        assert_eq!(s.first_defined(), Some(2));
        assert_eq!(s.get(0), None);
        assert_eq!(s.get(3), Some(2.0));
        assert_eq!(s.get(10), None);
    }

    #[test]
    fn series_shifted() {
        let s = IndicatorSeries::new(vec![Some(1.0), Some(2.0), Some(3.0)]);
        let shifted = s.shifted(2);
        assert_eq!(shifted.values, vec![None, None, Some(1.0)]);
    }

    #[test]
    fn series_zip_with_propagates_none() {
        let a = IndicatorSeries::new(vec![None, Some(2.0), Some(4.0)]);
        let b = IndicatorSeries::new(vec![Some(1.0), None, Some(2.0)]);
        let sum = a.zip_with(&b, |x, y| x + y);
        assert_eq!(sum.values, vec![None, None, Some(6.0)]);
    }

    #[test]
    fn output_select() {
        let s = IndicatorSeries::new(vec![Some(1.0)]);
        let out = IndicatorOutput::Single(s.clone());
        assert_eq!(out.select(OutputField::Value), Some(&s));
        assert_eq!(out.select(OutputField::Upper), None);
    }
}
