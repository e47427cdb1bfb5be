//! OHLCV bar representation and input validation.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::error::BacktestError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Timestamps must strictly increase and every price must be finite and positive.
pub fn validate_bars(bars: &[Bar]) -> Result<(), BacktestError> {
    if bars.is_empty() {
        return Err(BacktestError::EmptySeries);
    }

    for (index, bar) in bars.iter().enumerate() {
        for (field, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BacktestError::InvalidPrice {
                    index,
                    timestamp: bar.timestamp,
                    field,
                    value,
                });
            }
        }

        if !bar.volume.is_finite() || bar.volume < 0.0 {
            return Err(BacktestError::InvalidVolume {
                index,
                timestamp: bar.timestamp,
                value: bar.volume,
            });
        }

        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(BacktestError::NonIncreasingTimestamp {
                index,
                previous: bars[index - 1].timestamp,
                current: bar.timestamp,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: ts(day),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close,
            volume: 50_000.0,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar(15, 105.0);
        // high-low=20, |high-100|=10, |low-100|=10 → 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar(15, 105.0);
        // |110-70|=40 dominates
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar(15, 105.0);
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn accepts_valid_bars() {
        assert!(validate_bars(&[sample_bar(1, 100.0), sample_bar(2, 101.0)]).is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(validate_bars(&[]), Err(BacktestError::EmptySeries)));
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let err = validate_bars(&[sample_bar(1, 100.0), sample_bar(1, 101.0)]).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::NonIncreasingTimestamp { index: 1, .. }
        ));
    }

    #[test]
    fn rejects_decreasing_timestamp() {
        let err = validate_bars(&[sample_bar(3, 100.0), sample_bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, BacktestError::NonIncreasingTimestamp { .. }));
    }

    #[test]
    fn rejects_nan_close() {
        let err = validate_bars(&[sample_bar(1, f64::NAN)]).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::InvalidPrice { field: "close", .. }
        ));
    }

    #[test]
    fn rejects_zero_close() {
        let err = validate_bars(&[sample_bar(1, 0.0)]).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidPrice { .. }));
    }

    #[test]
    fn rejects_negative_volume() {
        let mut bar = sample_bar(1, 100.0);
        bar.volume = -1.0;
        let err = validate_bars(&[bar]).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidVolume { index: 0, .. }));
    }
}
