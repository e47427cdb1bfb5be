//! Bollinger Bands indicator.
//!
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is population standard deviation (divides by N, not N-1).
//! Warmup: first (period-1) values are undefined.

use super::sma::calculate_sma;
use super::stddev::calculate_stddev;
use super::IndicatorOutput;

pub fn calculate_bollinger(closes: &[f64], period: usize, stddev_mult_x100: u32) -> IndicatorOutput {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let middle = calculate_sma(closes, period);
    let stddev = calculate_stddev(closes, period);

    let upper = middle.zip_with(&stddev, |m, sd| m + mult * sd);
    let lower = middle.zip_with(&stddev, |m, sd| m - mult * sd);

    IndicatorOutput::Bands {
        upper,
        middle,
        lower,
    }
}
