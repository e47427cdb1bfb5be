//! Shared helpers for indicators that read more than the close column.

use crate::domain::indicator::{IndicatorSeries, PriceField};
use crate::domain::ohlcv::Bar;

pub fn price_column(bars: &[Bar], field: PriceField) -> Vec<f64> {
    bars.iter()
        .map(|b| match field {
            PriceField::Open => b.open,
            PriceField::High => b.high,
            PriceField::Low => b.low,
            PriceField::Close => b.close,
        })
        .collect()
}

/// Wilder ATR: seed with the mean true range of the first n bars, then
/// ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n. The first bar's TR is high - low.
pub fn calc_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    let mut values = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return IndicatorSeries::new(values);
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut atr = tr_values[..period].iter().sum::<f64>() / period as f64;
    values[period - 1] = Some(atr);

    for i in period..bars.len() {
        atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
        values[i] = Some(atr);
    }

    IndicatorSeries::new(values)
}

/// Highest value over the trailing window ending at each index (inclusive).
pub fn rolling_max(values: &[f64], period: usize) -> IndicatorSeries {
    rolling(values, period, f64::max)
}

/// Lowest value over the trailing window ending at each index (inclusive).
pub fn rolling_min(values: &[f64], period: usize) -> IndicatorSeries {
    rolling(values, period, f64::min)
}

fn rolling(values: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::new(vec![None; values.len()]);
    }
    let out = (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                values[i + 1 - period..=i].iter().copied().reduce(pick)
            }
        })
        .collect();
    IndicatorSeries::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn atr_basic() {
        let bars: Vec<Bar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calc_atr(&bars, 3);
        assert_eq!(series.len(), 5);
        assert_eq!(series.first_defined(), Some(2));
        assert!((series.get(4).unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn atr_seed_is_average() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 120.0, 110.0, 115.0),
        ];
        let series = calc_atr(&bars, 3);
        // TR: 10, max(10, 10, 0)=10, max(10, 10, 0)=10
        assert!((series.get(2).unwrap() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 110.0, 100.0, 105.0),
            make_bar(3, 140.0, 100.0, 130.0),
        ];
        let series = calc_atr(&bars, 2);
        // seed = 10, TR[2] = max(40, 35, 5) = 40 → (10 + 40) / 2
        assert!((series.get(2).unwrap() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars = vec![make_bar(1, 110.0, 100.0, 105.0)];
        let series = calc_atr(&bars, 3);
        assert_eq!(series.len(), 1);
        assert_eq!(series.first_defined(), None);
    }

    #[test]
    fn rolling_extremes() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        let max = rolling_max(&values, 3);
        let min = rolling_min(&values, 3);
        assert_eq!(max.values, vec![None, None, Some(4.0), Some(4.0), Some(5.0)]);
        assert_eq!(min.values, vec![None, None, Some(1.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn price_column_selects_field() {
        let bars = vec![make_bar(1, 110.0, 90.0, 100.0)];
        assert_eq!(price_column(&bars, PriceField::High), vec![110.0]);
        assert_eq!(price_column(&bars, PriceField::Low), vec![90.0]);
        assert_eq!(price_column(&bars, PriceField::Close), vec![100.0]);
    }
}
