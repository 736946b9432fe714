//! Exponential Moving Average (EMA), non-adjusted form.
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//! Seed: EMA[0] = x[0]. No warmup gap, every index carries a value.

use crate::domain::PriceBar;

/// EMA over the close column of `bars`. Missing closes are treated as NaN.
pub fn ema_of_closes(bars: &[PriceBar], span: usize) -> Vec<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close.unwrap_or(f64::NAN)).collect();
    ema_of_series(&closes, span)
}

/// Compute EMA values from a pre-extracted f64 slice.
///
/// `span == 0` yields all NaN. A NaN input taints that index and every later one.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n == 0 || span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);

    let mut prev = values[0];
    if prev.is_nan() {
        return result;
    }
    result[0] = prev;

    for i in 1..n {
        if values[i].is_nan() {
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}
