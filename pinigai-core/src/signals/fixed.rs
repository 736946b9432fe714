//! Signal sources that ignore prices.

use super::SignalSource;
use crate::domain::PriceBar;

/// Long from the first bar to the last.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl SignalSource for BuyAndHold {
    fn generate_signals(&self, prices: &[PriceBar]) -> Vec<f64> {
        vec![1.0; prices.len()]
    }
}

/// Replays a signal computed elsewhere, aligned by position on the sorted series.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedSignal {
    values: Vec<f64>,
}

impl PrecomputedSignal {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Flat everywhere except `value` on bars `[start, end)`.
    pub fn window(len: usize, start: usize, end: usize, value: f64) -> Self {
        let values = (0..len)
            .map(|i| if i >= start && i < end { value } else { 0.0 })
            .collect();
        Self { values }
    }
}

impl SignalSource for PrecomputedSignal {
    fn generate_signals(&self, _prices: &[PriceBar]) -> Vec<f64> {
        self.values.clone()
    }
}
