//! Domain error types.
//!
//! Parameter problems are not errors here: they fall back to the declared
//! default and are recorded as [`crate::domain::params::ParamWarning`].

use chrono::NaiveDateTime;

/// Top-level error type for stratbench.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("bar series is empty")]
    EmptySeries,

    #[error("bar {index}: timestamp {current} is not after previous {previous}")]
    NonIncreasingTimestamp {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("bar {index} ({timestamp}): {field} is {value}, expected a finite positive price")]
    InvalidPrice {
        index: usize,
        timestamp: NaiveDateTime,
        field: &'static str,
        value: f64,
    },

    #[error("bar {index} ({timestamp}): volume {value} must be finite and non-negative")]
    InvalidVolume {
        index: usize,
        timestamp: NaiveDateTime,
        value: f64,
    },

    #[error("initial cash must be positive, got {value}")]
    InvalidCash { value: f64 },

    #[error("commission rate must be in [0, 1), got {value}")]
    InvalidCommission { value: f64 },

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("parameter '{name}' is not declared by the strategy schema")]
    MissingParam { name: String },

    #[error("strategy {strategy} requires {indicator}, which the indicator library does not provide")]
    IndicatorUnavailable {
        strategy: String,
        indicator: String,
    },

    #[error("computation failed at bar {bar_index} ({timestamp}): {reason}")]
    Computation {
        bar_index: usize,
        timestamp: NaiveDateTime,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    /// True for errors that reject the input before any bar is processed.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BacktestError::EmptySeries
                | BacktestError::NonIncreasingTimestamp { .. }
                | BacktestError::InvalidPrice { .. }
                | BacktestError::InvalidVolume { .. }
                | BacktestError::InvalidCash { .. }
                | BacktestError::InvalidCommission { .. }
        )
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Csv(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::Data { .. } => 3,
            BacktestError::UnknownStrategy { .. }
            | BacktestError::MissingParam { .. }
            | BacktestError::IndicatorUnavailable { .. } => 4,
            BacktestError::EmptySeries
            | BacktestError::NonIncreasingTimestamp { .. }
            | BacktestError::InvalidPrice { .. }
            | BacktestError::InvalidVolume { .. }
            | BacktestError::InvalidCash { .. }
            | BacktestError::InvalidCommission { .. } => 5,
            BacktestError::Computation { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
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

    #[test]
    fn input_errors_are_classified() {
        assert!(BacktestError::EmptySeries.is_input_error());
        assert!(BacktestError::InvalidCash { value: 0.0 }.is_input_error());
        assert!(
            !BacktestError::Computation {
                bar_index: 3,
                timestamp: ts(4),
                reason: "x".into(),
            }
            .is_input_error()
        );
        assert!(!BacktestError::UnknownStrategy { name: "x".into() }.is_input_error());
    }

    #[test]
    fn timestamp_error_message_names_both_bars() {
        let err = BacktestError::NonIncreasingTimestamp {
            index: 2,
            previous: ts(5),
            current: ts(5),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("bar 2:"));
        assert!(msg.contains("2024-01-05"));
    }

    #[test]
    fn indicator_unavailable_message() {
        let err = BacktestError::IndicatorUnavailable {
            strategy: "macd".into(),
            indicator: "MACD".into(),
        };
        assert_eq!(
            err.to_string(),
            "strategy macd requires MACD, which the indicator library does not provide"
        );
    }
}
