//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line is defined from max(fast, slow) - 1, the signal and
//! histogram from max(fast, slow) - 1 + signal - 1.

use super::ema::{calculate_ema, ema_of};
use super::IndicatorOutput;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> IndicatorOutput {
    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let line = ema_fast.zip_with(&ema_slow, |f, s| f - s);
    let signal_line = ema_of(&line.values, signal);
    let histogram = line.zip_with(&signal_line, |l, s| l - s);

    IndicatorOutput::Macd {
        line,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::OutputField;

    fn closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect()
    }

    #[test]
    fn macd_warmup_default() {
        let out = calculate_macd(&closes(60), DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL);
        let line = out.select(OutputField::MacdLine).unwrap();
        let signal = out.select(OutputField::MacdSignal).unwrap();
        let hist = out.select(OutputField::MacdHistogram).unwrap();

        assert_eq!(line.first_defined(), Some(25));
        assert_eq!(signal.first_defined(), Some(33));
        assert_eq!(hist.first_defined(), Some(33));
    }

    #[test]
    fn macd_constant_prices_are_zero() {
        let out = calculate_macd(&[50.0; 40], 3, 6, 4);
        let line = out.select(OutputField::MacdLine).unwrap();
        for v in line.values.iter().flatten() {
            assert!(v.abs() < 1e-12);
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let out = calculate_macd(&closes(50), 5, 10, 4);
        let line = out.select(OutputField::MacdLine).unwrap();
        let signal = out.select(OutputField::MacdSignal).unwrap();
        let hist = out.select(OutputField::MacdHistogram).unwrap();
        for i in 0..50 {
            if let (Some(l), Some(s), Some(h)) = (line.get(i), signal.get(i), hist.get(i)) {
                assert!((h - (l - s)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn macd_rising_prices_positive_line() {
        let rising: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let out = calculate_macd(&rising, 3, 8, 3);
        let line = out.select(OutputField::MacdLine).unwrap();
        assert!(line.get(39).unwrap() > 0.0);
    }
}
