//! Exponential moving average crossover — long while the fast EMA is above the slow EMA.

use super::SignalSource;
use crate::domain::PriceBar;
use crate::error::InvalidInputError;
use crate::indicators::ema_of_closes;
use serde::{Deserialize, Serialize};

/// EMA crossover on close.
///
/// Emits a target position per bar: `1.0` where `ema(fast) > ema(slow)`, else `0.0`.
/// Both EMAs are seeded with the first close, so there is no warmup gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovingAverageCrossover {
    fast_window: usize,
    slow_window: usize,
}

impl MovingAverageCrossover {
    pub const DEFAULT_FAST: usize = 12;
    pub const DEFAULT_SLOW: usize = 26;

    pub fn new(fast_window: usize, slow_window: usize) -> Result<Self, InvalidInputError> {
        if fast_window == 0 || slow_window == 0 || fast_window >= slow_window {
            return Err(InvalidInputError::InvalidWindows {
                fast: fast_window,
                slow: slow_window,
            });
        }
        Ok(Self {
            fast_window,
            slow_window,
        })
    }

    pub fn fast_window(&self) -> usize {
        self.fast_window
    }

    pub fn slow_window(&self) -> usize {
        self.slow_window
    }
}

impl Default for MovingAverageCrossover {
    fn default() -> Self {
        Self {
            fast_window: Self::DEFAULT_FAST,
            slow_window: Self::DEFAULT_SLOW,
        }
    }
}

impl SignalSource for MovingAverageCrossover {
    fn generate_signals(&self, prices: &[PriceBar]) -> Vec<f64> {
        let fast = ema_of_closes(prices, self.fast_window);
        let slow = ema_of_closes(prices, self.slow_window);

        // NaN comparisons are false, so tainted bars stay flat.
        fast.iter()
            .zip(&slow)
            .map(|(f, s)| if f > s { 1.0 } else { 0.0 })
            .collect()
    }
}
