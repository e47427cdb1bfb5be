//! Lunar age: days elapsed since the most recent true new moon.
//!
//! New moons come from the mean lunation plus the largest periodic
//! correction terms of the lunar and solar anomalies (Meeus, *Astronomical
//! Algorithms*, ch. 49), which lands within a few minutes of the true
//! conjunction. Terrestrial time and universal time are treated as equal.

use chrono::NaiveDateTime;

use super::IndicatorSeries;

pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_861;

/// Offset of the full moon from the preceding new moon.
pub const HALF_SYNODIC_MONTH_DAYS: f64 = 14.765;

/// Julian day of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Mean new moon of lunation 0 (2000-01-06).
const LUNATION_ZERO_JD: f64 = 2_451_550.097_66;

/// Julian day of the new moon of lunation `k` (0 = January 2000).
pub fn new_moon_jd(k: i64) -> f64 {
    let k = k as f64;
    let t = k / 1_236.85;
    let t2 = t * t;

    let mean = LUNATION_ZERO_JD + SYNODIC_MONTH_DAYS * k + 0.000_154_37 * t2
        - 0.000_000_150 * t2 * t
        + 0.000_000_000_73 * t2 * t2;
    let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t2;
    let m = (2.5534 + 29.105_356_70 * k - 0.000_001_4 * t2).to_radians();
    let mp = (201.5643 + 385.816_935_28 * k + 0.010_758_2 * t2).to_radians();
    let f = (160.7108 + 390.670_502_84 * k - 0.001_611_8 * t2).to_radians();
    let omega = (124.7746 - 1.563_755_88 * k + 0.002_067_2 * t2).to_radians();

    let correction = -0.40720 * mp.sin()
        + 0.17241 * e * m.sin()
        + 0.01608 * (2.0 * mp).sin()
        + 0.01039 * (2.0 * f).sin()
        + 0.00739 * e * (mp - m).sin()
        - 0.00514 * e * (mp + m).sin()
        + 0.00208 * e * e * (2.0 * m).sin()
        - 0.00111 * (mp - 2.0 * f).sin()
        - 0.00057 * (mp + 2.0 * f).sin()
        + 0.00056 * e * (2.0 * mp + m).sin()
        - 0.00042 * (3.0 * mp).sin()
        + 0.00042 * e * (m + 2.0 * f).sin()
        + 0.00038 * e * (m - 2.0 * f).sin()
        - 0.00024 * e * (2.0 * mp - m).sin()
        - 0.00017 * omega.sin();

    mean + correction
}

fn julian_day(timestamp: NaiveDateTime) -> f64 {
    timestamp.and_utc().timestamp() as f64 / 86_400.0 + UNIX_EPOCH_JD
}

pub fn lunar_age(timestamp: NaiveDateTime) -> f64 {
    let jd = julian_day(timestamp);
    let mut k = ((jd - LUNATION_ZERO_JD) / SYNODIC_MONTH_DAYS).floor() as i64;
    // corrections move a new moon by well under a day, one step either way suffices
    if new_moon_jd(k) > jd {
        k -= 1;
    } else if new_moon_jd(k + 1) <= jd {
        k += 1;
    }
    jd - new_moon_jd(k)
}

pub fn calculate_lunar_age(timestamps: &[NaiveDateTime]) -> IndicatorSeries {
    IndicatorSeries::new(timestamps.iter().map(|&t| Some(lunar_age(t))).collect())
}
