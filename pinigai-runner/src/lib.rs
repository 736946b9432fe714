//! Pinigai Runner — everything around the engine that touches the outside world.
//!
//! This crate builds on `pinigai-core` to provide:
//! - TOML backtest configuration with content-addressed run ids
//! - Daily price loading from Stooq with a per-ticker CSV cache
//! - Markdown reports and JSON/CSV artifacts
//! - Parallel parameter sweeps over crossover windows

pub mod config;
pub mod data_loader;
pub mod report;
pub mod sweep;

pub use config::{default_cache_dir, BacktestConfig, ConfigError, RunId};
pub use data_loader::{
    parse_stooq_body, HistoricalPriceLoader, LoadError, PriceCache, PriceProvider, StooqProvider,
};
pub use report::{render_markdown, render_report, save_artifacts, SummaryStats};
pub use sweep::{run_sweep, ParamGrid, SweepEntry, SweepError};
