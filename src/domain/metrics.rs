//! Statistics aggregator: reduces an equity curve and trade log to a report.
//!
//! Zero-denominator rules:
//! - profit factor: `+inf` with profit and no loss, `0` with neither
//! - win rate, average/best/worst trade, average duration: `None` without trades
//! - CAGR: `None` when the curve spans no time
//! - Sharpe/Sortino: `None` when returns have no (downside) volatility
//! - Calmar: `None` without drawdown

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::Serialize;

use super::backtest::BacktestResult;
use super::ohlcv::Bar;
use super::portfolio::EquityPoint;
use super::position::{Side, Trade};

const DAYS_PER_YEAR: f64 = 365.25;
const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub duration_days: f64,
    pub bars: usize,
    pub exposure_pct: f64,
    pub final_equity: f64,
    pub peak_equity: f64,
    pub total_return_pct: f64,
    pub buy_and_hold_return_pct: Option<f64>,
    pub cagr_pct: Option<f64>,
    pub max_drawdown_pct: f64,
    pub max_drawdown_duration_bars: usize,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: Option<f64>,
    pub avg_trade_pct: Option<f64>,
    pub best_trade_pct: Option<f64>,
    pub worst_trade_pct: Option<f64>,
    pub avg_trade_duration_bars: Option<f64>,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub profit_factor: f64,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub calmar_ratio: Option<f64>,
}

pub fn summarize(equity_curve: &[EquityPoint], trades: &[Trade], initial_cash: f64) -> StatsReport {
    let start = equity_curve.first().map(|p| p.timestamp);
    let end = equity_curve.last().map(|p| p.timestamp);
    let duration_days = match (start, end) {
        (Some(s), Some(e)) => (e - s).num_seconds() as f64 / SECONDS_PER_DAY,
        _ => 0.0,
    };

    let final_equity = equity_curve.last().map(|p| p.equity).unwrap_or(initial_cash);
    let peak_equity = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold(initial_cash, f64::max);

    let total_return = if initial_cash > 0.0 {
        (final_equity - initial_cash) / initial_cash
    } else {
        0.0
    };

    let years = duration_days / DAYS_PER_YEAR;
    let cagr = if years > 0.0 {
        if final_equity > 0.0 {
            Some((final_equity / initial_cash).powf(1.0 / years) - 1.0)
        } else {
            Some(-1.0)
        }
    } else {
        None
    };

    let exposed = equity_curve.iter().filter(|p| p.side != Side::Flat).count();
    let exposure_pct = if equity_curve.is_empty() {
        0.0
    } else {
        exposed as f64 / equity_curve.len() as f64 * 100.0
    };

    let (max_drawdown, max_drawdown_duration_bars) = compute_drawdown(equity_curve);
    let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve);
    let calmar_ratio = match cagr {
        Some(c) if max_drawdown > 0.0 => Some(c / max_drawdown),
        _ => None,
    };

    let mut winning_trades = 0usize;
    let mut losing_trades = 0usize;
    let mut gross_profit = 0.0_f64;
    let mut gross_loss = 0.0_f64;
    let mut best: Option<f64> = None;
    let mut worst: Option<f64> = None;
    let mut total_pct = 0.0_f64;
    let mut total_bars = 0usize;

    for trade in trades {
        let pnl = trade.net_pnl;
        if trade.is_win() {
            winning_trades += 1;
            gross_profit += pnl;
        } else if pnl < 0.0 {
            losing_trades += 1;
            gross_loss += pnl.abs();
        }
        best = Some(best.map_or(trade.return_pct, |b| b.max(trade.return_pct)));
        worst = Some(worst.map_or(trade.return_pct, |w| w.min(trade.return_pct)));
        total_pct += trade.return_pct;
        total_bars += trade.bars_held;
    }

    let trade_count = trades.len();
    let per_trade = |total: f64| (trade_count > 0).then(|| total / trade_count as f64);

    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    StatsReport {
        start,
        end,
        duration_days,
        bars: equity_curve.len(),
        exposure_pct,
        final_equity,
        peak_equity,
        total_return_pct: total_return * 100.0,
        buy_and_hold_return_pct: None,
        cagr_pct: cagr.map(|c| c * 100.0),
        max_drawdown_pct: max_drawdown * 100.0,
        max_drawdown_duration_bars,
        trade_count,
        winning_trades,
        losing_trades,
        win_rate_pct: per_trade(winning_trades as f64 * 100.0),
        avg_trade_pct: per_trade(total_pct),
        best_trade_pct: best,
        worst_trade_pct: worst,
        avg_trade_duration_bars: per_trade(total_bars as f64),
        gross_profit,
        gross_loss,
        profit_factor,
        sharpe_ratio,
        sortino_ratio,
        calmar_ratio,
    }
}

/// [`summarize`] plus the buy-and-hold benchmark over the same bars.
pub fn summarize_run(result: &BacktestResult, bars: &[Bar]) -> StatsReport {
    let mut report = summarize(&result.equity_curve, &result.trades, result.initial_cash);
    let covered = &bars[..result.equity_curve.len().min(bars.len())];
    report.buy_and_hold_return_pct = buy_and_hold_return_pct(covered);
    report
}

pub fn buy_and_hold_return_pct(bars: &[Bar]) -> Option<f64> {
    let first = bars.first()?.close;
    let last = bars.last()?.close;
    Some((last - first) / first * 100.0)
}

/// Largest peak-to-trough decline as a fraction of the peak, and the longest
/// run of bars spent below a previous peak.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            duration = 0;
        } else {
            duration += 1;
            max_duration = max_duration.max(duration);
            if peak > 0.0 {
                max_dd = max_dd.max((peak - point.equity) / peak);
            }
        }
    }

    (max_dd, max_duration)
}

/// Annualisation factor from the median spacing between bars.
pub fn bars_per_year(equity_curve: &[EquityPoint]) -> Option<f64> {
    let mut gaps: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| (w[1].timestamp - w[0].timestamp).num_seconds() as f64)
        .filter(|s| *s > 0.0)
        .collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_by(f64::total_cmp);
    let median_days = gaps[gaps.len() / 2] / SECONDS_PER_DAY;

    let factor = if median_days < 1.0 {
        TRADING_DAYS_PER_YEAR / median_days
    } else if median_days < 2.0 {
        let has_weekends = equity_curve
            .iter()
            .any(|p| matches!(p.timestamp.weekday(), Weekday::Sat | Weekday::Sun));
        if has_weekends { 365.0 } else { TRADING_DAYS_PER_YEAR }
    } else if (6.0..=8.0).contains(&median_days) {
        52.0
    } else if (28.0..=31.0).contains(&median_days) {
        12.0
    } else {
        DAYS_PER_YEAR / median_days
    };
    Some(factor)
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint]) -> (Option<f64>, Option<f64>) {
    let Some(annualise) = bars_per_year(equity_curve).map(f64::sqrt) else {
        return (None, None);
    };

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 { (w[1].equity - prev) / prev } else { 0.0 }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    let downside = (returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / n).sqrt();

    let sharpe = (std_dev > 0.0).then(|| mean / std_dev * annualise);
    let sortino = (downside > 0.0).then(|| mean / downside * annualise);
    (sharpe, sortino)
}
