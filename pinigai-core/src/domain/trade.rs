//! Trade — one contiguous holding interval reconstructed from the position series.

use super::bar::BarDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a trade was exited inside the series or is still held at the final bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Closed,
    /// Marked to market at the final bar.
    Open,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Closed => f.write_str("CLOSED"),
            TradeStatus::Open => f.write_str("OPEN"),
        }
    }
}

/// A ledger row: entry → exit (or final-bar snapshot for open trades).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_bar: usize,
    pub entry_date: BarDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_date: BarDate,
    pub exit_price: f64,

    // ── Outcome ──
    /// `exit_price / entry_price - 1`.
    pub return_pct: f64,
    /// Calendar days for dated series, bars for index-axis series.
    pub holding_period: i64,
    pub status: TradeStatus,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    pub fn is_winner(&self) -> bool {
        self.return_pct > 0.0
    }
}
