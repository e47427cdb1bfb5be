//! Configuration validation.
//!
//! Runs before any data is loaded so a bad file fails fast with the offending
//! section and key.

use crate::domain::error::BacktestError;
use crate::domain::registry;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_initial_cash(config)?;
    validate_commission(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("strategy", "name") {
        Some(name) if !name.trim().is_empty() => registry::lookup(name.trim()).map(|_| ()),
        _ => Err(BacktestError::ConfigMissing {
            section: "strategy".to_string(),
            key: "name".to_string(),
        }),
    }
}

/// Parse an optional numeric key, rejecting text that is not a number.
pub fn optional_number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, BacktestError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| BacktestError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a number", raw),
        }),
    }
}

pub fn optional_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, BacktestError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| BacktestError::ConfigInvalid {
                section: "backtest".to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }),
    }
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = optional_number(config, "backtest", "initial_cash")? {
        if !value.is_finite() || value <= 0.0 {
            return Err(BacktestError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "initial_cash".to_string(),
                reason: "initial_cash must be positive".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = optional_number(config, "backtest", "commission_rate")? {
        if !(0.0..1.0).contains(&value) {
            return Err(BacktestError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "commission_rate".to_string(),
                reason: "commission_rate must be in [0, 1)".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start = optional_date(config, "start")?;
    let end = optional_date(config, "end")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(BacktestError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start".to_string(),
                reason: "start must not be after end".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            "[backtest]\ninitial_cash = 10000\ncommission_rate = 0.001\nstart = 2020-01-01\nend = 2020-12-31\n",
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn empty_backtest_section_uses_defaults() {
        assert!(validate_backtest_config(&make_config("[backtest]\n")).is_ok());
    }

    #[test]
    fn initial_cash_zero_fails() {
        let config = make_config("[backtest]\ninitial_cash = 0\n");
        assert!(matches!(
            validate_backtest_config(&config),
            Err(BacktestError::ConfigInvalid { key, .. }) if key == "initial_cash"
        ));
    }

    #[test]
    fn initial_cash_not_a_number_fails() {
        let config = make_config("[backtest]\ninitial_cash = lots\n");
        assert!(matches!(
            validate_backtest_config(&config),
            Err(BacktestError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn commission_of_one_fails() {
        let config = make_config("[backtest]\ncommission_rate = 1.0\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn negative_commission_fails() {
        let config = make_config("[backtest]\ncommission_rate = -0.01\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config("[backtest]\nstart = 01/02/2020\n");
        assert!(matches!(
            validate_backtest_config(&config),
            Err(BacktestError::ConfigInvalid { key, .. }) if key == "start"
        ));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config("[backtest]\nstart = 2021-01-01\nend = 2020-01-01\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn strategy_name_required() {
        let config = make_config("[strategy]\n");
        assert!(matches!(
            validate_strategy_config(&config),
            Err(BacktestError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn unknown_strategy_name_fails() {
        let config = make_config("[strategy]\nname = coin_flip\n");
        assert!(matches!(
            validate_strategy_config(&config),
            Err(BacktestError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn known_strategy_passes() {
        let config = make_config("[strategy]\nname = ichimoku\n");
        assert!(validate_strategy_config(&config).is_ok());
    }
}
