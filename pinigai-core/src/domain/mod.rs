//! Domain types for pinigai

pub mod bar;
pub mod trade;

pub use bar::{BarDate, PriceBar, PriceColumn};
pub use trade::{Trade, TradeStatus};
