//! Parameter sweep over EMA crossover windows.

use pinigai_core::domain::PriceBar;
use pinigai_core::engine::BacktestEngine;
use pinigai_core::error::InvalidInputError;
use pinigai_core::signals::MovingAverageCrossover;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("parameter grid has no valid (fast < slow) window pairs")]
    EmptyGrid,

    #[error("backtest failed for fast={fast}, slow={slow}: {source}")]
    Backtest {
        fast: usize,
        slow: usize,
        #[source]
        source: InvalidInputError,
    },
}

/// Window ranges to sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub fast_windows: Vec<usize>,
    pub slow_windows: Vec<usize>,
}

impl ParamGrid {
    pub fn new(fast_windows: Vec<usize>, slow_windows: Vec<usize>) -> Self {
        Self {
            fast_windows,
            slow_windows,
        }
    }

    /// Every `(fast, slow)` with `0 < fast < slow`, in grid order.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for &fast in &self.fast_windows {
            for &slow in &self.slow_windows {
                // Skip invalid combinations (fast >= slow)
                if fast == 0 || fast >= slow {
                    continue;
                }
                pairs.push((fast, slow));
            }
        }
        pairs
    }

    /// Number of valid pairs.
    pub fn size(&self) -> usize {
        self.pairs().len()
    }
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            fast_windows: vec![5, 8, 12],
            slow_windows: vec![20, 26, 50],
        }
    }
}

/// Headline metrics for one window pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub fast_window: usize,
    pub slow_window: usize,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub trade_count: usize,
}

/// Run one backtest per grid pair in parallel.
///
/// Entries are sorted by Sharpe ratio descending, ties broken by total return
/// descending, then by window pair.
pub fn run_sweep(
    prices: &[PriceBar],
    grid: &ParamGrid,
    initial_capital: f64,
) -> Result<Vec<SweepEntry>, SweepError> {
    let pairs = grid.pairs();
    if pairs.is_empty() {
        return Err(SweepError::EmptyGrid);
    }
    tracing::info!(pairs = pairs.len(), bars = prices.len(), "running parameter sweep");

    let engine = BacktestEngine::new(initial_capital);
    let mut entries = pairs
        .par_iter()
        .map(|&(fast, slow)| {
            let backtest = |source| SweepError::Backtest { fast, slow, source };
            let strategy = MovingAverageCrossover::new(fast, slow).map_err(backtest)?;
            let result = engine.run(prices, &strategy).map_err(backtest)?;
            Ok(SweepEntry {
                fast_window: fast,
                slow_window: slow,
                total_return: result.total_return,
                annualized_return: result.annualized_return,
                volatility: result.volatility,
                sharpe_ratio: result.sharpe_ratio,
                max_drawdown: result.max_drawdown,
                trade_count: result.trades.len(),
            })
        })
        .collect::<Result<Vec<_>, SweepError>>()?;

    entries.sort_by(|a, b| {
        b.sharpe_ratio
            .total_cmp(&a.sharpe_ratio)
            .then_with(|| b.total_return.total_cmp(&a.total_return))
            .then_with(|| (a.fast_window, a.slow_window).cmp(&(b.fast_window, b.slow_window)))
    });
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn trending_bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| PriceBar::from_close(i as i64, 100.0 + i as f64 * 0.5 + (i as f64 / 4.0).sin() * 3.0))
            .collect()
    }

    #[test]
    fn grid_filters_invalid_combinations() {
        let grid = ParamGrid::new(vec![10, 50, 100], vec![50, 100]);
        // Valid: (10,50), (10,100), (50,100)
        assert_eq!(grid.pairs(), vec![(10, 50), (10, 100), (50, 100)]);
        assert_eq!(grid.size(), 3);
    }

    #[test]
    fn grid_skips_zero_windows() {
        let grid = ParamGrid::new(vec![0, 2], vec![5]);
        assert_eq!(grid.pairs(), vec![(2, 5)]);
    }

    #[test]
    fn empty_grid_is_error() {
        let grid = ParamGrid::new(vec![30], vec![10, 20]);
        assert!(matches!(
            run_sweep(&trending_bars(50), &grid, 10_000.0),
            Err(SweepError::EmptyGrid)
        ));
    }

    #[test]
    fn sweep_returns_one_entry_per_pair_sorted_by_sharpe() {
        let grid = ParamGrid::default();
        let entries = run_sweep(&trending_bars(120), &grid, 10_000.0).unwrap();

        assert_eq!(entries.len(), grid.size());
        assert!(entries
            .windows(2)
            .all(|w| w[0].sharpe_ratio >= w[1].sharpe_ratio));
    }

    #[test]
    fn sweep_matches_single_run() {
        let prices = trending_bars(80);
        let grid = ParamGrid::new(vec![3], vec![10]);
        let entries = run_sweep(&prices, &grid, 5_000.0).unwrap();

        let single = BacktestEngine::new(5_000.0)
            .run(&prices, &MovingAverageCrossover::new(3, 10).unwrap())
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total_return, single.total_return);
        assert_eq!(entries[0].sharpe_ratio, single.sharpe_ratio);
        assert_eq!(entries[0].trade_count, single.trades.len());
    }

    #[test]
    fn engine_errors_are_reported_with_pair() {
        let grid = ParamGrid::new(vec![2], vec![4]);
        let err = run_sweep(&[], &grid, 10_000.0).unwrap_err();
        assert!(matches!(
            err,
            SweepError::Backtest {
                fast: 2,
                slow: 4,
                source: InvalidInputError::EmptyPrices
            }
        ));
    }

    proptest! {
        #[test]
        fn grid_pairs_are_ordered_and_complete(
            fast in prop::collection::vec(0usize..60, 0..6),
            slow in prop::collection::vec(0usize..60, 0..6),
        ) {
            let grid = ParamGrid::new(fast.clone(), slow.clone());
            let pairs = grid.pairs();
            prop_assert!(pairs.iter().all(|&(f, s)| f > 0 && f < s));

            let expected = fast
                .iter()
                .flat_map(|&f| slow.iter().map(move |&s| (f, s)))
                .filter(|&(f, s)| f > 0 && f < s)
                .count();
            prop_assert_eq!(pairs.len(), expected);
        }
    }
}
