//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]), computed with a running sum.
//! Warmup: first (n-1) values are undefined.

use super::IndicatorSeries;

pub fn calculate_sma(values: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::new(vec![None; values.len()]);
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }

    IndicatorSeries::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let series = calculate_sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(series.values[0], None);
        assert_eq!(series.values[1], None);
        assert!(series.values[2].is_some());
        assert_eq!(series.first_defined(), Some(2));
    }

    #[test]
    fn sma_values() {
        let series = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(series.get(1), Some(1.5));
        assert_eq!(series.get(2), Some(2.5));
        assert_eq!(series.get(4), Some(4.5));
    }

    #[test]
    fn sma_period_longer_than_input() {
        let series = calculate_sma(&[1.0, 2.0], 5);
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_defined(), None);
    }

    #[test]
    fn sma_period_zero_is_never_defined() {
        let series = calculate_sma(&[1.0, 2.0, 3.0], 0);
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_defined(), None);
    }
}
