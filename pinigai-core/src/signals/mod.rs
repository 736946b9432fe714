//! Signal sources — anything that maps a price series to per-bar target positions.
//!
//! Signals never see account state. They describe "what position do I want after
//! this bar?", the engine decides when that position is realized.

pub mod fixed;
pub mod ma_crossover;

pub use fixed::{BuyAndHold, PrecomputedSignal};
pub use ma_crossover::MovingAverageCrossover;

use crate::domain::PriceBar;

/// Produces one target position per bar.
///
/// # Invariants
/// - The returned vector has exactly `prices.len()` entries (the engine rejects anything else)
/// - Values are unrestricted reals; 0.0 = flat, 1.0 = fully long is the usual domain
/// - Must be deterministic for the same price slice
pub trait SignalSource: Send + Sync {
    fn generate_signals(&self, prices: &[PriceBar]) -> Vec<f64>;
}

/// Plain functions and closures qualify as signal sources.
impl<F> SignalSource for F
where
    F: Fn(&[PriceBar]) -> Vec<f64> + Send + Sync,
{
    fn generate_signals(&self, prices: &[PriceBar]) -> Vec<f64> {
        self(prices)
    }
}
