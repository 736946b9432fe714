//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: strategy returns, equity curve or trade list
//! in, scalar out. Degenerate inputs (empty series, zero variance) resolve to 0
//! rather than erroring.

use crate::domain::{Trade, TradeStatus};
use serde::{Deserialize, Serialize};

/// Trading-days-per-year convention for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Per-bar standard deviations below this are treated as zero variance.
pub const ZERO_VARIANCE_EPSILON: f64 = 1e-15;

// ─── Return/risk metrics ────────────────────────────────────────────

/// Total return as a fraction: `final_equity / initial_capital - 1`.
pub fn total_return(equity_curve: &[f64], initial_capital: f64) -> f64 {
    match equity_curve.last() {
        Some(final_eq) if initial_capital > 0.0 => final_eq / initial_capital - 1.0,
        _ => 0.0,
    }
}

/// Geometric annualized return: `(Π(1 + r))^(252 / n) - 1`.
///
/// Returns 0.0 for an empty series and -1.0 once the growth factor reaches zero or below.
pub fn annualized_return(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(TRADING_DAYS_PER_YEAR / returns.len() as f64) - 1.0
}

/// Annualized volatility: population standard deviation × sqrt(252).
///
/// A series whose values are all equal has zero volatility exactly, whatever
/// rounding `population_std` picks up on it.
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    if is_constant(returns) {
        return 0.0;
    }
    let std = population_std(returns);
    if std < ZERO_VARIANCE_EPSILON {
        return 0.0;
    }
    std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Sharpe ratio with a zero risk-free rate: `mean × 252 / annualized volatility`.
///
/// 0.0 when the series is empty or has zero variance.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    let vol = annualized_volatility(returns);
    if vol == 0.0 {
        return 0.0;
    }
    mean_f64(returns) * TRADING_DAYS_PER_YEAR / vol
}

/// Maximum drawdown as a non-positive fraction (e.g. -0.15 = 15% below the running peak).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = eq / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

// ─── Trade statistics ───────────────────────────────────────────────

/// Ledger statistics used by reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    /// Fraction of CLOSED trades with a positive return.
    pub win_rate: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub completed_trades: usize,
    pub open_trades: usize,
}

impl TradeStats {
    /// `None` for an empty ledger.
    pub fn compute(trades: &[Trade]) -> Option<Self> {
        if trades.is_empty() {
            return None;
        }
        let completed_trades = trades
            .iter()
            .filter(|t| t.status == TradeStatus::Closed)
            .count();
        let closed_winners = trades
            .iter()
            .filter(|t| t.status == TradeStatus::Closed && t.is_winner())
            .count();
        let win_rate = if completed_trades == 0 {
            0.0
        } else {
            closed_winners as f64 / completed_trades as f64
        };

        Some(Self {
            win_rate,
            best_trade: trades
                .iter()
                .map(|t| t.return_pct)
                .fold(f64::NEG_INFINITY, f64::max),
            worst_trade: trades
                .iter()
                .map(|t| t.return_pct)
                .fold(f64::INFINITY, f64::min),
            completed_trades,
            open_trades: trades.len() - completed_trades,
        })
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(&first) => values.iter().all(|&v| v == first),
        None => true,
    }
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with denominator `n`.
pub(crate) fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
