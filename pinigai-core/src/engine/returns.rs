//! Per-bar return accounting: price returns, execution lag, strategy returns, equity.
//!
//! All functions are pure and length-preserving.

/// Simple percentage change of `closes`; the first bar's return is 0.
pub fn pct_change(closes: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return returns;
    }
    returns.push(0.0);
    returns.extend(closes.windows(2).map(|w| w[1] / w[0] - 1.0));
    returns
}

/// Shift `signal` forward by one bar, flat before the first bar.
///
/// The position held through bar `i` is the one decided at the close of bar `i - 1`.
pub fn lag_positions(signal: &[f64]) -> Vec<f64> {
    let mut positions = Vec::with_capacity(signal.len());
    if signal.is_empty() {
        return positions;
    }
    positions.push(0.0);
    positions.extend_from_slice(&signal[..signal.len() - 1]);
    positions
}

/// Element-wise `position[i] * price_return[i]`.
pub fn strategy_returns(positions: &[f64], price_returns: &[f64]) -> Vec<f64> {
    debug_assert_eq!(positions.len(), price_returns.len());
    positions
        .iter()
        .zip(price_returns)
        .map(|(p, r)| p * r)
        .collect()
}

/// Compound `(1 + r)` cumulatively, scaled by `initial_capital`.
pub fn equity_curve(returns: &[f64], initial_capital: f64) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth * initial_capital
        })
        .collect()
}

/// `change[i] = position[i] - position[i - 1]`, `change[0] = position[0]`.
pub fn position_changes(positions: &[f64]) -> Vec<f64> {
    let mut prev = 0.0;
    positions
        .iter()
        .map(|&p| {
            let change = p - prev;
            prev = p;
            change
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn pct_change_first_bar_zero() {
        let r = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 3);
        assert_eq!(r[0], 0.0);
        assert_approx(r[1], 0.1, DEFAULT_EPSILON);
        assert_approx(r[2], -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_empty_and_single() {
        assert!(pct_change(&[]).is_empty());
        assert_eq!(pct_change(&[42.0]), vec![0.0]);
    }

    #[test]
    fn lag_shifts_by_one_bar() {
        assert_eq!(lag_positions(&[1.0, 0.0, 2.0]), vec![0.0, 1.0, 0.0]);
        assert!(lag_positions(&[]).is_empty());
        assert_eq!(lag_positions(&[1.0]), vec![0.0]);
    }

    #[test]
    fn strategy_returns_scale_by_position() {
        let r = strategy_returns(&[0.0, 1.0, 0.5, -1.0], &[0.0, 0.1, 0.2, 0.05]);
        assert_eq!(r, vec![0.0, 0.1, 0.1, -0.05]);
    }

    #[test]
    fn equity_compounds() {
        let eq = equity_curve(&[0.0, 0.1, -0.5], 1_000.0);
        assert_approx(eq[0], 1_000.0, DEFAULT_EPSILON);
        assert_approx(eq[1], 1_100.0, DEFAULT_EPSILON);
        assert_approx(eq[2], 550.0, DEFAULT_EPSILON);
    }

    #[test]
    fn changes_treat_first_position_as_entry() {
        assert_eq!(
            position_changes(&[1.0, 1.0, 0.0, 2.0]),
            vec![1.0, 0.0, -1.0, 2.0]
        );
        assert!(position_changes(&[]).is_empty());
    }
}
