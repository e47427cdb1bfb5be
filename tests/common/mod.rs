#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use stratbench::domain::backtest::BacktestConfig;
use stratbench::domain::error::BacktestError;
pub use stratbench::domain::ohlcv::Bar;
use stratbench::domain::params::ParamOverrides;
use stratbench::ports::data_port::DataPort;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Closes that move SMA(3) above SMA(10) at bar 15 and back below at bar 30.
pub const CROSSING_CLOSES: [f64; 40] = [
    100.0, 99.0, 98.0, 97.0, 96.0, 95.0, 94.0, 93.0, 92.0, 91.0, 90.0, 89.0, 90.0, 91.0, 92.0,
    93.0, 94.0, 95.0, 96.0, 97.0, 98.0, 99.0, 100.0, 101.0, 102.0, 103.0, 104.0, 103.0, 102.0,
    101.0, 100.0, 99.0, 98.0, 97.0, 96.0, 95.0, 94.0, 93.0, 92.0, 91.0,
];

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, BacktestError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).ok_or_else(|| BacktestError::Data {
            reason: format!("no data for {}", symbol),
        })?;
        Ok(bars
            .iter()
            .filter(|b| start.is_none_or(|s| b.timestamp.date() >= s))
            .filter(|b| end.is_none_or(|e| b.timestamp.date() <= e))
            .cloned()
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
}

pub fn make_bar(timestamp: NaiveDateTime, close: f64) -> Bar {
    Bar {
        timestamp,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000.0,
    }
}

/// One bar per calendar day starting 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = midnight(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + Duration::days(i as i64), c))
        .collect()
}

/// A gently oscillating series: enough swings to trigger most strategies.
pub fn generate_bars(count: usize, base_price: f64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let t = i as f64;
            base_price + 10.0 * (t / 7.0).sin() + 4.0 * (t / 2.3).cos() + t * 0.05
        })
        .collect();
    bars_from_closes(&closes)
}

pub fn zero_commission(initial_cash: f64) -> BacktestConfig {
    BacktestConfig {
        initial_cash,
        commission_rate: 0.0,
    }
}

pub fn overrides(pairs: &[(&str, &str)]) -> ParamOverrides {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Write `bars` as `<dir>/<symbol>.csv` in the format the CSV adapter reads.
pub fn write_csv(dir: &Path, symbol: &str, bars: &[Bar]) {
    let mut file = std::fs::File::create(dir.join(format!("{}.csv", symbol))).unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    for b in bars {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            b.timestamp.date(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        )
        .unwrap();
    }
}
