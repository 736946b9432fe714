//! Pinigai Core — backtest accounting engine, domain types, signals, metrics.
//!
//! This crate is pure computation with no I/O:
//! - Domain types (price bars, date axis, trades)
//! - Return/equity accounting with a one-bar execution lag
//! - Trade ledger reconstruction with open-position handling
//! - Risk/return metrics (total, annualized, volatility, Sharpe, drawdown)
//! - Signal sources (EMA crossover, buy-and-hold, precomputed)

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod signals;

pub use domain::{BarDate, PriceBar, PriceColumn, Trade, TradeStatus};
pub use engine::{BacktestEngine, BacktestResult, DEFAULT_INITIAL_CAPITAL};
pub use error::InvalidInputError;
pub use metrics::TradeStats;
pub use signals::{BuyAndHold, MovingAverageCrossover, PrecomputedSignal, SignalSource};
