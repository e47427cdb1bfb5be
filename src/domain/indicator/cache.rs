//! Run-scoped indicator cache and named bindings.
//!
//! Computations are requested lazily during strategy initialisation, always
//! over the full bar sequence, and memoised by `IndicatorType` so a series two
//! bindings share is computed once per run.

use std::collections::HashMap;

use tracing::debug;

use super::{IndicatorOutput, IndicatorSeries, IndicatorType, OutputField};
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use crate::ports::indicator_port::IndicatorPort;

pub struct IndicatorCache<'a> {
    strategy: &'a str,
    bars: &'a [Bar],
    library: &'a dyn IndicatorPort,
    computed: HashMap<IndicatorType, IndicatorOutput>,
    bindings: HashMap<&'static str, IndicatorSeries>,
}

impl<'a> IndicatorCache<'a> {
    pub fn new(strategy: &'a str, bars: &'a [Bar], library: &'a dyn IndicatorPort) -> Self {
        Self {
            strategy,
            bars,
            library,
            computed: HashMap::new(),
            bindings: HashMap::new(),
        }
    }

    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    /// Number of distinct computations performed so far.
    pub fn computed_count(&self) -> usize {
        self.computed.len()
    }

    pub fn output(&mut self, indicator: &IndicatorType) -> Result<&IndicatorOutput, BacktestError> {
        if !self.computed.contains_key(indicator) {
            let output = self.library.compute(indicator, self.bars).ok_or_else(|| {
                BacktestError::IndicatorUnavailable {
                    strategy: self.strategy.to_string(),
                    indicator: indicator.to_string(),
                }
            })?;
            debug!(indicator = %indicator, library = self.library.name(), "computed indicator");
            self.computed.insert(indicator.clone(), output);
        }
        Ok(&self.computed[indicator])
    }

    pub fn series(
        &mut self,
        indicator: &IndicatorType,
        field: OutputField,
    ) -> Result<IndicatorSeries, BacktestError> {
        let strategy = self.strategy.to_string();
        let output = self.output(indicator)?;
        output
            .select(field)
            .cloned()
            .ok_or_else(|| BacktestError::IndicatorUnavailable {
                strategy,
                indicator: format!("{} {:?}", indicator, field),
            })
    }

    /// Bind a single-valued indicator under `name`.
    pub fn bind_indicator(
        &mut self,
        name: &'static str,
        indicator: IndicatorType,
        field: OutputField,
    ) -> Result<(), BacktestError> {
        let series = self.series(&indicator, field)?;
        self.bind(name, series)
    }

    /// Bind a derived series under `name`. The series must align with the bars.
    pub fn bind(&mut self, name: &'static str, series: IndicatorSeries) -> Result<(), BacktestError> {
        if series.len() != self.bars.len() {
            return Err(BacktestError::Computation {
                bar_index: 0,
                timestamp: self.bars.first().map(|b| b.timestamp).unwrap_or_default(),
                reason: format!(
                    "indicator '{}' has {} values for {} bars",
                    name,
                    series.len(),
                    self.bars.len()
                ),
            });
        }
        self.bindings.insert(name, series);
        Ok(())
    }

    pub fn into_bindings(self) -> Bindings {
        Bindings::new(self.bindings)
    }
}

/// Named indicator series a strategy reads during `decide`.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    series: HashMap<&'static str, IndicatorSeries>,
}

impl Bindings {
    pub fn new(series: HashMap<&'static str, IndicatorSeries>) -> Self {
        Self { series }
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorSeries> {
        self.series.get(name)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// First bar index at which every binding is defined. `Some(0)` with no
    /// bindings; `None` if some binding never becomes available.
    pub fn ready_index(&self) -> Option<usize> {
        self.series
            .values()
            .map(|s| s.first_defined())
            .try_fold(0usize, |acc, first| first.map(|f| acc.max(f)))
    }
}
