//! Input validation errors raised by the engine before any simulation step.

use thiserror::Error;

/// Rejected engine input. Every variant is detected eagerly; nothing is partially computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("price data is empty")]
    EmptyPrices,

    #[error("bar {bar} has no close price")]
    MissingClose { bar: usize },

    #[error("bar {bar} has close {close}; closes must be finite and positive")]
    InvalidClose { bar: usize, close: f64 },

    #[error("bar {bar} has open {open}; opens must be finite and positive when present")]
    InvalidOpen { bar: usize, open: f64 },

    #[error("price dates mix calendar dates and integer indices")]
    MixedDateAxis,

    #[error("signals length ({signals}) must match prices length ({prices})")]
    SignalLengthMismatch { signals: usize, prices: usize },

    #[error("signal at bar {bar} is not finite")]
    NonFiniteSignal { bar: usize },

    #[error("initial capital must be finite and positive, got {0}")]
    InvalidCapital(f64),

    #[error("window lengths must be positive and fast < slow (fast={fast}, slow={slow})")]
    InvalidWindows { fast: usize, slow: usize },
}
