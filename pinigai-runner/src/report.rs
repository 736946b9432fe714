//! Reporting and export — Markdown reports plus JSON/CSV artifacts.
//!
//! - **Markdown**: summary metrics table followed by the most recent trades
//! - **JSON**: the full `BacktestResult`
//! - **CSV**: per-bar equity series and the trade ledger

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pinigai_core::domain::Trade;
use pinigai_core::engine::BacktestResult;
use pinigai_core::metrics::TradeStats;
use serde::{Deserialize, Serialize};

/// Number of trades shown in reports, most recent last.
pub const TRADE_TABLE_LIMIT: usize = 8;

/// Column headers of the trade table.
pub const TRADE_COLUMNS: [&str; 7] = [
    "entry_date",
    "exit_date",
    "entry_price",
    "exit_price",
    "return_pct",
    "holding_period",
    "status",
];

// ─── Summary ────────────────────────────────────────────────────────

/// Headline numbers of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub final_equity: f64,
    pub bars: usize,
    /// `None` when the run produced no trades.
    pub trades: Option<TradeStats>,
}

impl SummaryStats {
    pub fn from_result(result: &BacktestResult) -> Self {
        Self {
            total_return: result.total_return,
            annualized_return: result.annualized_return,
            volatility: result.volatility,
            sharpe_ratio: result.sharpe_ratio,
            max_drawdown: result.max_drawdown,
            final_equity: result.final_equity(),
            bars: result.bar_count(),
            trades: TradeStats::compute(&result.trades),
        }
    }

    /// `(metric, formatted value)` pairs in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Total return", format_percent(self.total_return)),
            ("Annualized return", format_percent(self.annualized_return)),
            ("Volatility", format_percent(self.volatility)),
            ("Sharpe ratio", format!("{:.2}", self.sharpe_ratio)),
            ("Max drawdown", format_percent(self.max_drawdown)),
            ("Final equity", format_thousands(self.final_equity)),
            ("Bars", self.bars.to_string()),
        ];
        if let Some(stats) = &self.trades {
            rows.extend([
                ("Win rate", format_percent(stats.win_rate)),
                ("Best trade", format_percent(stats.best_trade)),
                ("Worst trade", format_percent(stats.worst_trade)),
                ("Completed trades", stats.completed_trades.to_string()),
            ]);
        }
        rows
    }
}

// ─── Formatting ─────────────────────────────────────────────────────

/// `0.1234` → `"12.34%"`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Two decimals with comma thousands separators: `1234567.891` → `"1,234,567.89"`.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let s = format!("{:.2}", value.abs());
    let (int_part, dec_part) = s.split_once('.').unwrap_or((&s, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && s != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{dec_part}")
}

/// Display cells for the last `limit` trades, oldest first.
pub fn trade_rows(trades: &[Trade], limit: usize) -> Vec<[String; 7]> {
    let start = trades.len().saturating_sub(limit);
    trades[start..]
        .iter()
        .map(|t| {
            [
                t.entry_date.to_string(),
                t.exit_date.to_string(),
                format_thousands(t.entry_price),
                format_thousands(t.exit_price),
                format_percent(t.return_pct),
                format!("{}d", t.holding_period),
                t.status.to_string(),
            ]
        })
        .collect()
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Generate a Markdown report for a single backtest run.
pub fn render_markdown(result: &BacktestResult, ticker: Option<&str>) -> String {
    let summary = SummaryStats::from_result(result);
    let mut md = String::with_capacity(2048);

    match ticker {
        Some(t) => md.push_str(&format!("# Backtest report - {t}\n\n")),
        None => md.push_str("# Backtest report\n\n"),
    }

    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    for (metric, value) in summary.rows() {
        md.push_str(&format!("| {metric} | {value} |\n"));
    }
    md.push('\n');

    md.push_str("## Trades\n\n");
    if result.trades.is_empty() {
        md.push_str("No completed trades\n");
        return md;
    }

    md.push_str(&format!("| {} |\n", TRADE_COLUMNS.join(" | ")));
    md.push_str(&format!("|{}\n", " --- |".repeat(TRADE_COLUMNS.len())));
    for row in trade_rows(&result.trades, TRADE_TABLE_LIMIT) {
        md.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    md
}

/// Write the Markdown report to `output`, creating parent directories.
///
/// Returns the absolute path written.
pub fn render_report(result: &BacktestResult, ticker: Option<&str>, output: &Path) -> Result<PathBuf> {
    let output = if output.is_absolute() {
        output.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to resolve current directory")?
            .join(output)
    };
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report dir: {}", parent.display()))?;
    }
    std::fs::write(&output, render_markdown(result, ticker))
        .with_context(|| format!("failed to write report: {}", output.display()))?;
    tracing::info!(path = %output.display(), "wrote report");
    Ok(output)
}

// ─── JSON / CSV export ──────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Columns: date, equity, daily_return, position, signal
pub fn export_equity_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "daily_return", "position", "signal"])?;
    for i in 0..result.bar_count() {
        wtr.write_record([
            result.dates[i].to_string(),
            format!("{:.6}", result.equity_curve[i]),
            format!("{:.10}", result.daily_returns[i]),
            result.positions[i].to_string(),
            result.signals[i].to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: entry_date, entry_price, exit_date, exit_price, return_pct, holding_period, status
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "return_pct",
        "holding_period",
        "status",
    ])?;
    for t in trades {
        wtr.write_record([
            t.entry_date.to_string(),
            format!("{:.6}", t.entry_price),
            t.exit_date.to_string(),
            format!("{:.6}", t.exit_price),
            format!("{:.10}", t.return_pct),
            t.holding_period.to_string(),
            t.status.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run into `dir` (created if missing):
/// - `result.json` — the full `BacktestResult`
/// - `equity.csv` — per-bar equity, return, position and signal
/// - `trades.csv` — the trade ledger
///
/// Returns `dir`.
pub fn save_artifacts(result: &BacktestResult, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create artifact dir: {}", dir.display()))?;

    std::fs::write(dir.join("result.json"), export_json(result)?)
        .context("failed to write result.json")?;
    std::fs::write(dir.join("equity.csv"), export_equity_csv(result)?)
        .context("failed to write equity.csv")?;
    std::fs::write(dir.join("trades.csv"), export_trades_csv(&result.trades)?)
        .context("failed to write trades.csv")?;

    tracing::info!(dir = %dir.display(), "saved artifacts");
    Ok(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinigai_core::engine::BacktestEngine;
    use pinigai_core::signals::PrecomputedSignal;
    use pinigai_core::PriceBar;

    fn sample_result(signal: Vec<f64>) -> BacktestResult {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bars: Vec<PriceBar> = (0..signal.len())
            .map(|i| {
                let close = 1_000.0 + 10.0 * i as f64;
                PriceBar::new(
                    base + chrono::Duration::days(i as i64),
                    close - 5.0,
                    close + 5.0,
                    close - 6.0,
                    close,
                    1_000.0,
                )
            })
            .collect();
        BacktestEngine::default()
            .run(&bars, &PrecomputedSignal::new(signal))
            .unwrap()
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(0.1234), "12.34%");
        assert_eq!(format_percent(-0.05), "-5.00%");
        assert_eq!(format_percent(0.0), "0.00%");
    }

    #[test]
    fn thousands_formatting() {
        assert_eq!(format_thousands(0.0), "0.00");
        assert_eq!(format_thousands(999.999), "1,000.00");
        assert_eq!(format_thousands(1_234_567.891), "1,234,567.89");
        assert_eq!(format_thousands(123_456.0), "123,456.00");
        assert_eq!(format_thousands(-10_000.5), "-10,000.50");
        assert_eq!(format_thousands(-0.001), "0.00");
    }

    #[test]
    fn summary_rows_without_trades() {
        let result = sample_result(vec![0.0; 5]);
        let rows = SummaryStats::from_result(&result).rows();
        let names: Vec<&str> = rows.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "Total return",
                "Annualized return",
                "Volatility",
                "Sharpe ratio",
                "Max drawdown",
                "Final equity",
                "Bars",
            ]
        );
        assert_eq!(rows[5].1, "10,000.00");
        assert_eq!(rows[6].1, "5");
    }

    #[test]
    fn summary_rows_with_trades() {
        let result = sample_result(vec![1.0, 1.0, 0.0, 1.0, 1.0, 1.0]);
        let summary = SummaryStats::from_result(&result);
        let stats = summary.trades.unwrap();
        assert_eq!(stats.completed_trades, 1);
        assert_eq!(stats.open_trades, 1);

        let rows = summary.rows();
        assert_eq!(rows.len(), 11);
        assert_eq!(rows[7].0, "Win rate");
        assert_eq!(rows[7].1, "100.00%");
        assert_eq!(rows[10], ("Completed trades", "1".to_string()));
    }

    #[test]
    fn markdown_without_trades() {
        let md = render_markdown(&sample_result(vec![0.0; 4]), Some("AAPL"));
        assert!(md.starts_with("# Backtest report - AAPL\n"));
        assert!(md.contains("| Total return | 0.00% |"));
        assert!(md.contains("No completed trades"));
        assert!(!md.contains("Win rate"));
    }

    #[test]
    fn markdown_trade_table() {
        // Entry at bar 1, exit at bar 3; opens are close - 5.
        let md = render_markdown(&sample_result(vec![1.0, 1.0, 0.0, 0.0]), None);
        assert!(md.starts_with("# Backtest report\n"));
        assert!(md.contains(
            "| entry_date | exit_date | entry_price | exit_price | return_pct | holding_period | status |"
        ));
        assert!(md.contains("| 2024-03-02 | 2024-03-04 | 1,005.00 | 1,025.00 |"));
        assert!(md.contains("| 2d | CLOSED |"));
    }

    #[test]
    fn trade_rows_keep_most_recent() {
        // Alternating signal: a new round trip every two bars.
        let signal: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
        let result = sample_result(signal);
        assert!(result.trades.len() > TRADE_TABLE_LIMIT);

        let rows = trade_rows(&result.trades, TRADE_TABLE_LIMIT);
        assert_eq!(rows.len(), TRADE_TABLE_LIMIT);
        let last = result.trades.last().unwrap();
        assert_eq!(rows[TRADE_TABLE_LIMIT - 1][0], last.entry_date.to_string());
    }

    #[test]
    fn equity_csv_has_one_row_per_bar() {
        let result = sample_result(vec![1.0, 1.0, 0.0, 0.0]);
        let csv = export_equity_csv(&result).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,equity,daily_return,position,signal");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("2024-03-01,10000.000000,"));
    }

    #[test]
    fn trades_csv_columns() {
        let result = sample_result(vec![1.0, 1.0, 0.0, 0.0]);
        let csv = export_trades_csv(&result.trades).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("entry_date,entry_price,exit_date,exit_price,return_pct,holding_period,status")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("2024-03-02,1005.000000,2024-03-04,1025.000000,"));
        assert!(row.ends_with(",2,CLOSED"));
    }
}
