//! PriceBar — one row of the daily price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Position of a bar on the date axis.
///
/// A series is either calendar-dated (holding periods measured in days) or
/// indexed by plain integers (holding periods measured in bars). The engine
/// rejects series that mix the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BarDate {
    Calendar(NaiveDate),
    Index(i64),
}

impl BarDate {
    /// Distance from `earlier` to `self` in the axis unit.
    ///
    /// Returns `None` when the two dates live on different axes.
    pub fn periods_since(&self, earlier: &BarDate) -> Option<i64> {
        match (self, earlier) {
            (BarDate::Calendar(a), BarDate::Calendar(b)) => Some((*a - *b).num_days()),
            (BarDate::Index(a), BarDate::Index(b)) => Some(a - b),
            _ => None,
        }
    }

    pub fn is_calendar(&self) -> bool {
        matches!(self, BarDate::Calendar(_))
    }
}

impl PartialOrd for BarDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Calendar dates order before integer indices. Only meaningful within one axis.
impl Ord for BarDate {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (BarDate::Calendar(a), BarDate::Calendar(b)) => a.cmp(b),
            (BarDate::Index(a), BarDate::Index(b)) => a.cmp(b),
            (BarDate::Calendar(_), BarDate::Index(_)) => Ordering::Less,
            (BarDate::Index(_), BarDate::Calendar(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for BarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarDate::Calendar(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            BarDate::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<NaiveDate> for BarDate {
    fn from(date: NaiveDate) -> Self {
        BarDate::Calendar(date)
    }
}

impl From<i64> for BarDate {
    fn from(index: i64) -> Self {
        BarDate::Index(index)
    }
}

/// Daily OHLCV bar. Only `close` is required by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: BarDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl PriceBar {
    /// Bar carrying only a close price.
    pub fn from_close(date: impl Into<BarDate>, close: f64) -> Self {
        Self {
            date: date.into(),
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: None,
        }
    }

    /// Full OHLCV bar.
    pub fn new(
        date: impl Into<BarDate>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date: date.into(),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }
}

/// Which column supplies execution prices for entries and exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceColumn {
    Open,
    Close,
}

impl PriceColumn {
    /// `Open` when every bar carries an open price, otherwise `Close`.
    pub fn preferred(bars: &[PriceBar]) -> Self {
        if !bars.is_empty() && bars.iter().all(|b| b.open.is_some()) {
            PriceColumn::Open
        } else {
            PriceColumn::Close
        }
    }

    /// Price of `bar` in this column. Callers validate `close` beforehand.
    pub fn price(&self, bar: &PriceBar) -> f64 {
        match self {
            PriceColumn::Open => bar.open.or(bar.close).unwrap_or(f64::NAN),
            PriceColumn::Close => bar.close.unwrap_or(f64::NAN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample_bar() -> PriceBar {
        PriceBar::new(day(2), 100.0, 105.0, 98.0, 103.0, 50_000.0)
    }

    #[test]
    fn calendar_distance_in_days() {
        let a = BarDate::Calendar(day(2));
        let b = BarDate::Calendar(day(9));
        assert_eq!(b.periods_since(&a), Some(7));
    }

    #[test]
    fn index_distance_in_bars() {
        assert_eq!(BarDate::Index(21).periods_since(&BarDate::Index(6)), Some(15));
    }

    #[test]
    fn mixed_axes_have_no_distance() {
        assert_eq!(BarDate::Index(3).periods_since(&BarDate::Calendar(day(2))), None);
    }

    #[test]
    fn dates_order_within_axis() {
        assert!(BarDate::Calendar(day(2)) < BarDate::Calendar(day(3)));
        assert!(BarDate::Index(-1) < BarDate::Index(0));
    }

    #[test]
    fn display_formats() {
        assert_eq!(BarDate::Calendar(day(5)).to_string(), "2024-01-05");
        assert_eq!(BarDate::Index(12).to_string(), "12");
    }

    #[test]
    fn preferred_column_requires_every_open() {
        let full = vec![sample_bar(), sample_bar()];
        assert_eq!(PriceColumn::preferred(&full), PriceColumn::Open);

        let partial = vec![sample_bar(), PriceBar::from_close(day(3), 101.0)];
        assert_eq!(PriceColumn::preferred(&partial), PriceColumn::Close);
        assert_eq!(PriceColumn::Close.price(&partial[0]), 103.0);
        assert_eq!(PriceColumn::Open.price(&partial[0]), 100.0);
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: PriceBar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
