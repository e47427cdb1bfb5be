//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) values are undefined. Leading undefined inputs are
//! skipped, so the EMA of a series that itself has a warmup starts later.

use super::IndicatorSeries;

pub fn calculate_ema(values: &[f64], period: usize) -> IndicatorSeries {
    let input: Vec<Option<f64>> = values.iter().map(|&v| Some(v)).collect();
    ema_of(&input, period)
}

/// EMA over a series that may start with undefined values.
pub fn ema_of(values: &[Option<f64>], period: usize) -> IndicatorSeries {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return IndicatorSeries::new(out);
    }

    let start = match values.iter().position(|v| v.is_some()) {
        Some(s) => s,
        None => return IndicatorSeries::new(out),
    };

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (offset, i) in (start..values.len()).enumerate() {
        let v = match values[i] {
            Some(v) => v,
            None => break,
        };
        if offset < period - 1 {
            sum += v;
        } else if offset == period - 1 {
            sum += v;
            ema = sum / period as f64;
            out[i] = Some(ema);
        } else {
            ema = v * k + ema * (1.0 - k);
            out[i] = Some(ema);
        }
    }

    IndicatorSeries::new(out)
}
