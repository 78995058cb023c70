//! Performance metrics computed from a trade ledger and equity curve.
//!
//! All metrics are computed post-hoc from the finished run. Each metric is a
//! pure function that can be tested independently. An empty ledger reports
//! zero for every metric.

use replaylab_core::domain::ClosedTrade;
use serde::{Deserialize, Serialize};

/// Annualization factor applied to the per-bar Sharpe ratio.
pub const ANNUALIZATION: f64 = 252.0;

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// `(final − initial) / initial`, as a fraction.
    pub total_return: f64,
    pub sharpe_ratio: f64,
    /// Most negative peak-to-trough move, as a fraction (≤ 0).
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    /// Magnitude of the mean non-positive pnl (≥ 0).
    pub avg_loss: f64,
    pub profit_factor: f64,
}

impl PerformanceMetrics {
    pub fn compute(
        initial_capital: f64,
        final_capital: f64,
        trades: &[ClosedTrade],
        equity_curve: &[f64],
    ) -> Self {
        if trades.is_empty() {
            return Self::default();
        }
        Self {
            total_return: total_return(initial_capital, final_capital),
            sharpe_ratio: sharpe(equity_curve),
            max_drawdown: max_drawdown(equity_curve),
            win_rate: win_rate(trades),
            avg_win: avg_win(trades),
            avg_loss: avg_loss(trades),
            profit_factor: profit_factor(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn total_return(initial_capital: f64, final_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    (final_capital - initial_capital) / initial_capital
}

/// Annualized Sharpe ratio of per-bar equity returns (zero risk-free rate).
///
/// Uses the population standard deviation. Returns 0.0 when there are no
/// returns or they have zero variance.
pub fn sharpe(equity_curve: &[f64]) -> f64 {
    let returns = step_returns(equity_curve);
    if returns.is_empty() {
        return 0.0;
    }
    let sd = population_std_dev(&returns);
    if sd == 0.0 {
        return 0.0;
    }
    mean_f64(&returns) / sd * ANNUALIZATION.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if the curve never falls below its running peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Fraction of trades with strictly positive pnl.
pub fn win_rate(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

pub fn avg_win(trades: &[ClosedTrade]) -> f64 {
    let wins: Vec<f64> = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).collect();
    mean_f64(&wins)
}

/// Magnitude of the mean pnl over trades with `pnl <= 0`; breakeven trades count.
pub fn avg_loss(trades: &[ClosedTrade]) -> f64 {
    let losses: Vec<f64> = trades.iter().filter(|t| !t.is_winner()).map(|t| t.pnl).collect();
    mean_f64(&losses).abs()
}

/// Gross profit over gross loss; 0.0 when nothing was lost.
pub fn profit_factor(trades: &[ClosedTrade]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss == 0.0 {
        return 0.0;
    }
    gross_profit / gross_loss
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Bar-to-bar returns; steps from a non-positive value are skipped.
pub fn step_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
