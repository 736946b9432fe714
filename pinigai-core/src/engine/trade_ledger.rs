//! Trade ledger — converts the lagged position series into entry/exit trades.
//!
//! Post-processes positions after returns are computed. Pure function:
//! positions + sorted bars → trades ordered by entry date.
//!
//! Entries are bars where the position rises, exits are bars where it falls.
//! The k-th entry pairs with the k-th exit. Entries left without an exit are
//! marked to market at the final bar and reported as `OPEN`.

use super::returns::position_changes;
use crate::domain::{PriceBar, PriceColumn, Trade, TradeStatus};

/// One side of a trade: where it happened and at what price.
#[derive(Debug, Clone, Copy)]
struct Fill {
    bar: usize,
    price: f64,
}

/// Reconstruct the trade ledger.
///
/// `positions` must be index-aligned with `bars`, and `bars` sorted by date.
/// Execution prices come from the open column when every bar has one, else from close.
pub fn reconstruct_trades(positions: &[f64], bars: &[PriceBar]) -> Vec<Trade> {
    debug_assert_eq!(positions.len(), bars.len());
    let Some(last_bar) = bars.len().checked_sub(1) else {
        return Vec::new();
    };

    let column = PriceColumn::preferred(bars);
    let mut entries = Vec::new();
    let mut exits = Vec::new();

    for (bar, change) in position_changes(positions).into_iter().enumerate() {
        if change > 0.0 {
            entries.push(Fill {
                bar,
                price: column.price(&bars[bar]),
            });
        } else if change < 0.0 {
            exits.push(Fill {
                bar,
                price: column.price(&bars[bar]),
            });
        }
    }

    // Every unmatched entry shares the same final-bar snapshot.
    let final_snapshot = Fill {
        bar: last_bar,
        price: column.price(&bars[last_bar]),
    };

    let mut trades: Vec<Trade> = entries
        .iter()
        .enumerate()
        .map(|(k, entry)| match exits.get(k) {
            Some(exit) => build_trade(bars, entry, exit, TradeStatus::Closed),
            None => build_trade(bars, entry, &final_snapshot, TradeStatus::Open),
        })
        .collect();

    trades.sort_by(|a, b| a.entry_date.cmp(&b.entry_date));
    trades
}

fn build_trade(bars: &[PriceBar], entry: &Fill, exit: &Fill, status: TradeStatus) -> Trade {
    let entry_date = bars[entry.bar].date;
    let exit_date = bars[exit.bar].date;

    Trade {
        entry_bar: entry.bar,
        entry_date,
        entry_price: entry.price,
        exit_bar: exit.bar,
        exit_date,
        exit_price: exit.price,
        return_pct: exit.price / entry.price - 1.0,
        holding_period: exit_date.periods_since(&entry_date).unwrap_or_default(),
        status,
    }
}
