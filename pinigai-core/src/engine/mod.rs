//! Backtest engine — turns a price series plus a signal into equity, trades and metrics.
//!
//! One `run` call is a pure computation over its own copy of the input:
//!
//! 1. Validate capital and prices, stable-sort bars by date
//! 2. Ask the strategy for one target position per bar (exactly once)
//! 3. Lag the signal by one bar, multiply by close-to-close returns, compound
//! 4. Reconstruct the trade ledger from position changes
//! 5. Compute summary metrics and assemble [`BacktestResult`]
//!
//! All validation happens before step 3; a run either fails eagerly or returns
//! a complete result.

pub mod returns;
pub mod trade_ledger;

pub use returns::{equity_curve, lag_positions, pct_change, position_changes, strategy_returns};
pub use trade_ledger::reconstruct_trades;

use crate::domain::{BarDate, PriceBar, Trade};
use crate::error::InvalidInputError;
use crate::metrics;
use crate::signals::SignalSource;
use serde::{Deserialize, Serialize};

/// Starting capital used when none is given.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

/// Stateless backtest runner. Holds only the starting capital.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestEngine {
    initial_capital: f64,
}

impl Default for BacktestEngine {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
        }
    }
}

impl BacktestEngine {
    /// Capital is checked when `run` is called, not here.
    pub fn new(initial_capital: f64) -> Self {
        Self { initial_capital }
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    /// Run a full backtest of `strategy` over `prices`.
    ///
    /// `prices` may arrive unsorted; the engine works on a date-sorted copy and the
    /// strategy sees that sorted copy. The returned series are aligned to it.
    pub fn run(
        &self,
        prices: &[PriceBar],
        strategy: &dyn SignalSource,
    ) -> Result<BacktestResult, InvalidInputError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(InvalidInputError::InvalidCapital(self.initial_capital));
        }
        validate_prices(prices)?;

        let mut bars = prices.to_vec();
        // Vec::sort_by is stable: equal dates keep their input order.
        bars.sort_by(|a, b| a.date.cmp(&b.date));

        let signals = strategy.generate_signals(&bars);
        if signals.len() != bars.len() {
            return Err(InvalidInputError::SignalLengthMismatch {
                signals: signals.len(),
                prices: bars.len(),
            });
        }
        if let Some(bar) = signals.iter().position(|s| !s.is_finite()) {
            return Err(InvalidInputError::NonFiniteSignal { bar });
        }

        // ── Returns & equity ──
        let closes: Vec<f64> = bars.iter().map(|b| b.close.unwrap_or(f64::NAN)).collect();
        let price_returns = pct_change(&closes);
        let positions = lag_positions(&signals);
        let daily_returns = strategy_returns(&positions, &price_returns);
        let equity = equity_curve(&daily_returns, self.initial_capital);

        // ── Ledger ──
        let trades = reconstruct_trades(&positions, &bars);

        // ── Metrics ──
        let total_return = metrics::total_return(&equity, self.initial_capital);
        let annualized_return = metrics::annualized_return(&daily_returns);
        let volatility = metrics::annualized_volatility(&daily_returns);
        let sharpe_ratio = metrics::sharpe_ratio(&daily_returns);
        let max_drawdown = metrics::max_drawdown(&equity);

        tracing::debug!(
            bars = bars.len(),
            trades = trades.len(),
            total_return,
            sharpe_ratio,
            max_drawdown,
            "backtest complete"
        );

        Ok(BacktestResult {
            dates: bars.iter().map(|b| b.date).collect(),
            equity_curve: equity,
            trades,
            signals,
            positions,
            daily_returns,
            initial_capital: self.initial_capital,
            total_return,
            annualized_return,
            volatility,
            sharpe_ratio,
            max_drawdown,
        })
    }
}

fn validate_prices(prices: &[PriceBar]) -> Result<(), InvalidInputError> {
    let Some(first) = prices.first() else {
        return Err(InvalidInputError::EmptyPrices);
    };

    for (bar, price) in prices.iter().enumerate() {
        match price.close {
            None => return Err(InvalidInputError::MissingClose { bar }),
            Some(close) if !close.is_finite() || close <= 0.0 => {
                return Err(InvalidInputError::InvalidClose { bar, close })
            }
            Some(_) => {}
        }
        if let Some(open) = price.open {
            if !open.is_finite() || open <= 0.0 {
                return Err(InvalidInputError::InvalidOpen { bar, open });
            }
        }
    }

    let calendar = first.date.is_calendar();
    if prices.iter().any(|p| p.date.is_calendar() != calendar) {
        return Err(InvalidInputError::MixedDateAxis);
    }
    Ok(())
}

/// Everything one backtest produced. Every per-bar series is aligned with `dates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Bar dates in ascending order.
    pub dates: Vec<BarDate>,
    pub equity_curve: Vec<f64>,
    /// Ordered by `entry_date`.
    pub trades: Vec<Trade>,
    /// Raw strategy output, before the execution lag.
    pub signals: Vec<f64>,
    /// Position held through each bar (signal lagged by one bar).
    pub positions: Vec<f64>,
    /// Strategy return per bar.
    pub daily_returns: Vec<f64>,
    pub initial_capital: f64,

    // ── Summary ──
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

impl BacktestResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .copied()
            .unwrap_or(self.initial_capital)
    }

    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| !t.is_open())
    }

    pub fn open_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_open())
    }

    pub fn bar_count(&self) -> usize {
        self.dates.len()
    }
}
