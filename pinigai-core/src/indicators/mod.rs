//! Indicator implementations used by the bundled signal sources.

pub mod ema;

pub use ema::{ema_of_closes, ema_of_series};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for numeric tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
