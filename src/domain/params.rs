//! Strategy parameter schemas and run-scoped parameter records.
//!
//! A schema is a `'static` slice of [`ParamSpec`]; resolving it against raw
//! overrides yields an immutable [`ParamSet`]. Bad values never abort a run:
//! they fall back to the declared default and leave a [`ParamWarning`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::error::BacktestError;

/// Raw `name -> value` overrides as they arrive from config files or the CLI.
pub type ParamOverrides = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// Integer lookback, at least 1.
    Period,
    Integer { min: i64, max: i64 },
    Positive,
    Range { min: f64, max: f64 },
    /// Fraction of equity in (0, 1].
    Fraction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: f64,
    pub kind: ParamKind,
}

pub const TRADE_SIZE: ParamSpec = ParamSpec::fraction("trade_size", 0.95);

/// Alternative override names, as `(alias, canonical)`. The canonical name
/// wins when both are given.
pub const PARAM_ALIASES: &[(&str, &str)] = &[("trade_size_percent", "trade_size")];

fn canonical_name(name: &str) -> &str {
    PARAM_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(name, |&(_, canonical)| canonical)
}

impl ParamSpec {
    pub const fn period(name: &'static str, default: usize) -> Self {
        Self {
            name,
            default: default as f64,
            kind: ParamKind::Period,
        }
    }

    pub const fn integer(name: &'static str, default: i64, min: i64, max: i64) -> Self {
        Self {
            name,
            default: default as f64,
            kind: ParamKind::Integer { min, max },
        }
    }

    pub const fn positive(name: &'static str, default: f64) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Positive,
        }
    }

    pub const fn range(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Range { min, max },
        }
    }

    pub const fn fraction(name: &'static str, default: f64) -> Self {
        Self {
            name,
            default,
            kind: ParamKind::Fraction,
        }
    }

    /// Coerce a parsed value into this parameter's domain.
    pub fn coerce(&self, value: f64) -> Result<f64, String> {
        if !value.is_finite() {
            return Err("value is not finite".into());
        }
        match self.kind {
            ParamKind::Period => {
                let v = value.trunc();
                if v < 1.0 {
                    return Err(format!("period must be >= 1, got {}", value));
                }
                Ok(v)
            }
            ParamKind::Integer { min, max } => {
                let v = value.trunc();
                if v < min as f64 || v > max as f64 {
                    return Err(format!("must be an integer in [{}, {}], got {}", min, max, value));
                }
                Ok(v)
            }
            ParamKind::Positive => {
                if value <= 0.0 {
                    return Err(format!("must be positive, got {}", value));
                }
                Ok(value)
            }
            ParamKind::Range { min, max } => {
                if value < min || value > max {
                    return Err(format!("must be in [{}, {}], got {}", min, max, value));
                }
                Ok(value)
            }
            ParamKind::Fraction => {
                if value <= 0.0 || value > 1.0 {
                    return Err(format!("must be a fraction in (0, 1], got {}", value));
                }
                Ok(value)
            }
        }
    }
}

/// A parameter override that was not applied as given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamWarning {
    pub name: String,
    pub raw: String,
    pub reason: String,
    /// The value used instead; `None` when the name was unknown and ignored.
    pub fallback: Option<f64>,
}

impl fmt::Display for ParamWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fallback {
            Some(v) => write!(
                f,
                "parameter {}='{}' rejected ({}), using default {}",
                self.name, self.raw, self.reason, v
            ),
            None => write!(f, "unknown parameter {}='{}' ignored", self.name, self.raw),
        }
    }
}

/// Resolved, typed parameter values for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSet {
    values: Vec<(&'static str, f64)>,
    warnings: Vec<ParamWarning>,
}

impl ParamSet {
    /// Resolve `schema` against raw overrides. Missing names take the
    /// default silently; unparseable or out-of-domain values take the default
    /// with a warning; names outside the schema are ignored with a warning.
    pub fn resolve(schema: &[ParamSpec], overrides: &ParamOverrides) -> Self {
        let mut values = Vec::with_capacity(schema.len());
        let mut warnings = Vec::new();

        for spec in schema {
            let raw = overrides.get(spec.name).or_else(|| {
                PARAM_ALIASES
                    .iter()
                    .filter(|(_, canonical)| *canonical == spec.name)
                    .find_map(|(alias, _)| overrides.get(*alias))
            });
            let value = match raw {
                None => spec.default,
                Some(raw) => {
                    let parsed = raw
                        .trim()
                        .parse::<f64>()
                        .map_err(|e| format!("not a number: {}", e))
                        .and_then(|v| spec.coerce(v));
                    match parsed {
                        Ok(v) => v,
                        Err(reason) => {
                            warn!(param = spec.name, raw = %raw, %reason, fallback = spec.default, "parameter falls back to default");
                            warnings.push(ParamWarning {
                                name: spec.name.to_string(),
                                raw: raw.clone(),
                                reason,
                                fallback: Some(spec.default),
                            });
                            spec.default
                        }
                    }
                }
            };
            values.push((spec.name, value));
        }

        for (name, raw) in overrides {
            if !schema.iter().any(|s| s.name == canonical_name(name)) {
                warn!(param = %name, raw = %raw, "unknown parameter ignored");
                warnings.push(ParamWarning {
                    name: name.clone(),
                    raw: raw.clone(),
                    reason: "unknown parameter".into(),
                    fallback: None,
                });
            }
        }

        Self { values, warnings }
    }

    pub fn defaults(schema: &[ParamSpec]) -> Self {
        Self::resolve(schema, &ParamOverrides::new())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn value(&self, name: &str) -> Result<f64, BacktestError> {
        self.get(name).ok_or_else(|| BacktestError::MissingParam {
            name: name.to_string(),
        })
    }

    /// Integer-valued parameter as a lookback length.
    pub fn period(&self, name: &str) -> Result<usize, BacktestError> {
        Ok(self.value(name)?.max(0.0) as usize)
    }

    pub fn integer(&self, name: &str) -> Result<i64, BacktestError> {
        Ok(self.value(name)? as i64)
    }

    pub fn trade_size(&self) -> Result<f64, BacktestError> {
        self.value(TRADE_SIZE.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.values.iter().copied()
    }

    pub fn warnings(&self) -> &[ParamWarning] {
        &self.warnings
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Parse `name=value` pairs as given on the command line.
pub fn parse_overrides<'a>(
    pairs: impl IntoIterator<Item = &'a str>,
) -> Result<ParamOverrides, String> {
    let mut out = ParamOverrides::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected name=value, got '{}'", pair))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("empty parameter name in '{}'", pair));
        }
        out.insert(name.to_string(), value.trim().to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &[ParamSpec] = &[
        TRADE_SIZE,
        ParamSpec::period("n1", 10),
        ParamSpec::range("upper", 70.0, 0.0, 100.0),
        ParamSpec::integer("day", 0, 0, 6),
        ParamSpec::positive("mult", 2.0),
    ];

    fn overrides(pairs: &[(&str, &str)]) -> ParamOverrides {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_no_overrides() {
        let set = ParamSet::defaults(SCHEMA);
        assert!((set.trade_size().unwrap() - 0.95).abs() < f64::EPSILON);
        assert_eq!(set.period("n1").unwrap(), 10);
        assert!(set.warnings().is_empty());
    }

    #[test]
    fn valid_override_applied() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("n1", "5"), ("mult", "1.5")]));
        assert_eq!(set.period("n1").unwrap(), 5);
        assert!((set.value("mult").unwrap() - 1.5).abs() < f64::EPSILON);
        assert!(set.warnings().is_empty());
    }

    #[test]
    fn period_truncates_toward_zero() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("n1", "7.9")]));
        assert_eq!(set.period("n1").unwrap(), 7);
    }

    #[test]
    fn unparseable_falls_back_with_warning() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("n1", "ten")]));
        assert_eq!(set.period("n1").unwrap(), 10);
        assert_eq!(set.warnings().len(), 1);
        let w = &set.warnings()[0];
        assert_eq!(w.name, "n1");
        assert_eq!(w.raw, "ten");
        assert_eq!(w.fallback, Some(10.0));
    }

    #[test]
    fn out_of_range_fraction_falls_back() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("trade_size", "1.5")]));
        assert!((set.trade_size().unwrap() - 0.95).abs() < f64::EPSILON);
        assert_eq!(set.warnings().len(), 1);

        let set = ParamSet::resolve(SCHEMA, &overrides(&[("trade_size", "0")]));
        assert!((set.trade_size().unwrap() - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn fraction_upper_bound_inclusive() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("trade_size", "1.0")]));
        assert!((set.trade_size().unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(set.warnings().is_empty());
    }

    #[test]
    fn integer_bounds_enforced() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("day", "7")]));
        assert_eq!(set.integer("day").unwrap(), 0);
        assert_eq!(set.warnings().len(), 1);
    }

    #[test]
    fn zero_period_rejected() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("n1", "0")]));
        assert_eq!(set.period("n1").unwrap(), 10);
    }

    #[test]
    fn nan_rejected() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("mult", "NaN")]));
        assert!((set.value("mult").unwrap() - 2.0).abs() < f64::EPSILON);
        assert_eq!(set.warnings().len(), 1);
    }

    #[test]
    fn unknown_name_ignored_with_warning() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("bogus", "3")]));
        assert_eq!(set.warnings().len(), 1);
        assert_eq!(set.warnings()[0].fallback, None);
        assert_eq!(set.get("bogus"), None);
        assert!(set.warnings()[0].to_string().contains("unknown parameter bogus"));
    }

    #[test]
    fn trade_size_percent_is_accepted() {
        let set = ParamSet::resolve(SCHEMA, &overrides(&[("trade_size_percent", "0.5")]));
        assert!((set.trade_size().unwrap() - 0.5).abs() < f64::EPSILON);
        assert!(set.warnings().is_empty());

        let set = ParamSet::resolve(
            SCHEMA,
            &overrides(&[("trade_size", "0.25"), ("trade_size_percent", "0.5")]),
        );
        assert!((set.trade_size().unwrap() - 0.25).abs() < f64::EPSILON);

        let set = ParamSet::resolve(SCHEMA, &overrides(&[("trade_size_percent", "2")]));
        assert!((set.trade_size().unwrap() - 0.95).abs() < f64::EPSILON);
        assert_eq!(set.warnings()[0].name, "trade_size");
    }

    #[test]
    fn alias_without_target_in_schema_is_unknown() {
        let set = ParamSet::resolve(&[ParamSpec::period("n1", 10)], &overrides(&[("trade_size_percent", "0.5")]));
        assert_eq!(set.warnings().len(), 1);
        assert_eq!(set.warnings()[0].fallback, None);
    }

    #[test]
    fn missing_param_is_error() {
        let set = ParamSet::defaults(SCHEMA);
        assert!(matches!(
            set.value("nope"),
            Err(BacktestError::MissingParam { .. })
        ));
    }

    #[test]
    fn display_in_schema_order() {
        let set = ParamSet::defaults(&SCHEMA[..2]);
        assert_eq!(set.to_string(), "trade_size=0.95, n1=10");
    }

    #[test]
    fn parse_overrides_pairs() {
        let parsed = parse_overrides(["n1=5", " n2 = 30 "]).unwrap();
        assert_eq!(parsed.get("n1").map(String::as_str), Some("5"));
        assert_eq!(parsed.get("n2").map(String::as_str), Some("30"));
        assert!(parse_overrides(["n1"]).is_err());
        assert!(parse_overrides(["=3"]).is_err());
    }
}
