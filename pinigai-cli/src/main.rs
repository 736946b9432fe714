//! Pinigai CLI — run, sweep, and download commands.
//!
//! Commands:
//! - `run` — EMA crossover backtest on one ticker, with a Markdown report
//! - `sweep` — rank fast/slow window pairs by Sharpe ratio
//! - `download` — refresh the local price cache from Stooq

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pinigai_core::engine::{BacktestEngine, BacktestResult};
use pinigai_runner::report::{format_percent, trade_rows, TRADE_COLUMNS, TRADE_TABLE_LIMIT};
use pinigai_runner::{
    render_markdown, render_report, run_sweep, save_artifacts, BacktestConfig,
    HistoricalPriceLoader, ParamGrid,
};

#[derive(Parser)]
#[command(
    name = "pinigai",
    about = "Pinigai CLI — moving average crossover backtests on daily prices"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a moving average crossover backtest on daily price data.
    Run {
        /// Ticker symbol to download, e.g. AAPL or msft.
        ticker: String,

        /// Fast EMA window length. Defaults to 12.
        #[arg(long)]
        fast: Option<usize>,

        /// Slow EMA window length. Defaults to 26.
        #[arg(long)]
        slow: Option<usize>,

        /// Initial capital. Defaults to 10000.
        #[arg(long)]
        capital: Option<f64>,

        /// TOML config file; command-line flags take precedence.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Price cache directory. Defaults to $PRICE_DATA_CACHE or ~/.cache/pinigai.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Markdown report path. Defaults to ./<ticker>_backtest.md.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Also save result.json, equity.csv and trades.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the generated report after saving.
        #[arg(long, default_value_t = false)]
        show: bool,
    },
    /// Backtest every fast/slow window pair and rank by Sharpe ratio.
    Sweep {
        ticker: String,

        /// Fast EMA windows, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = vec![5, 8, 12])]
        fast: Vec<usize>,

        /// Slow EMA windows, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = vec![20, 26, 50])]
        slow: Vec<usize>,

        #[arg(long, default_value_t = 10_000.0)]
        capital: f64,

        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Number of ranked pairs to print.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Download daily prices into the local cache, ignoring freshness.
    Download {
        /// Tickers to download (e.g., AAPL MSFT SPY).
        #[arg(required = true)]
        tickers: Vec<String>,

        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            ticker,
            fast,
            slow,
            capital,
            config,
            cache_dir,
            report,
            output_dir,
            show,
        } => {
            let mut cfg = match config {
                Some(path) => BacktestConfig::from_file(&path)?,
                None => BacktestConfig::default(),
            };
            cfg.ticker = ticker;
            if let Some(fast) = fast {
                cfg.fast_window = fast;
            }
            if let Some(slow) = slow {
                cfg.slow_window = slow;
            }
            if let Some(capital) = capital {
                cfg.initial_capital = capital;
            }
            if cache_dir.is_some() {
                cfg.cache_dir = cache_dir;
            }
            run_backtest_cmd(&cfg, report, output_dir, show)
        }
        Commands::Sweep {
            ticker,
            fast,
            slow,
            capital,
            cache_dir,
            top,
        } => run_sweep_cmd(&ticker, ParamGrid::new(fast, slow), capital, cache_dir, top),
        Commands::Download { tickers, cache_dir } => run_download(&tickers, cache_dir),
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn loader_for(cache_dir: Option<PathBuf>) -> Result<HistoricalPriceLoader> {
    let cache_dir = cache_dir.unwrap_or_else(pinigai_runner::default_cache_dir);
    HistoricalPriceLoader::stooq(cache_dir).context("failed to set up price loader")
}

fn run_backtest_cmd(
    cfg: &BacktestConfig,
    report: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    show: bool,
) -> Result<()> {
    cfg.validate()?;
    tracing::debug!(
        ticker = %cfg.ticker,
        fast = cfg.fast_window,
        slow = cfg.slow_window,
        run_id = %cfg.run_id(),
        "starting backtest"
    );

    let loader = loader_for(Some(cfg.cache_dir()))?.with_max_age(cfg.max_cache_age());
    let prices = loader
        .load_daily(&cfg.ticker)
        .with_context(|| format!("failed to load prices for {}", cfg.ticker))?;

    let strategy = cfg.strategy()?;
    let result = BacktestEngine::new(cfg.initial_capital).run(&prices, &strategy)?;

    let ticker = cfg.ticker.to_uppercase();
    print_summary(&ticker, &result);

    let report_path = report
        .unwrap_or_else(|| PathBuf::from(format!("{}_backtest.md", cfg.ticker.to_lowercase())));
    let written = render_report(&result, Some(ticker.as_str()), &report_path)?;
    println!("\nReport saved to: {}", written.display());

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, &dir.join(cfg.run_id()))?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    if show {
        println!();
        println!("{}", render_markdown(&result, Some(ticker.as_str())));
    }
    Ok(())
}

fn run_sweep_cmd(
    ticker: &str,
    grid: ParamGrid,
    capital: f64,
    cache_dir: Option<PathBuf>,
    top: usize,
) -> Result<()> {
    let prices = loader_for(cache_dir)?
        .load_daily(ticker)
        .with_context(|| format!("failed to load prices for {ticker}"))?;
    let entries = run_sweep(&prices, &grid, capital)?;

    println!("Ticker: {}", ticker.to_uppercase());
    println!("Bars evaluated: {}", prices.len());
    println!("Pairs tested: {}", entries.len());
    println!();
    println!(
        "{:>5} {:>5} {:>12} {:>12} {:>8} {:>12} {:>7}",
        "Fast", "Slow", "Total", "Annualized", "Sharpe", "Max DD", "Trades"
    );
    println!("{}", "-".repeat(67));
    for e in entries.iter().take(top) {
        println!(
            "{:>5} {:>5} {:>12} {:>12} {:>8.2} {:>12} {:>7}",
            e.fast_window,
            e.slow_window,
            format_percent(e.total_return),
            format_percent(e.annualized_return),
            e.sharpe_ratio,
            format_percent(e.max_drawdown),
            e.trade_count
        );
    }
    Ok(())
}

fn run_download(tickers: &[String], cache_dir: Option<PathBuf>) -> Result<()> {
    let loader = loader_for(cache_dir)?;
    let mut failed = 0;

    for (i, ticker) in tickers.iter().enumerate() {
        println!("[{}/{}] Fetching {ticker}...", i + 1, tickers.len());
        match loader.refresh(ticker) {
            Ok(bars) => println!("  OK: {ticker} ({} bars)", bars.len()),
            Err(e) => {
                println!("  FAIL: {ticker}: {e}");
                failed += 1;
            }
        }
    }

    println!(
        "\nDownload complete: {}/{} succeeded, {failed} failed",
        tickers.len() - failed,
        tickers.len()
    );
    if failed > 0 {
        bail!("{failed} download(s) failed");
    }
    Ok(())
}

fn print_summary(ticker: &str, result: &BacktestResult) {
    println!("Ticker: {ticker}");
    println!("Bars evaluated: {}", result.bar_count());
    println!("Total return: {}", format_percent(result.total_return));
    println!(
        "Annualized return: {}",
        format_percent(result.annualized_return)
    );
    println!("Volatility: {}", format_percent(result.volatility));
    println!("Sharpe ratio: {:.2}", result.sharpe_ratio);
    println!("Max drawdown: {}", format_percent(result.max_drawdown));

    if result.trades.is_empty() {
        println!("No completed trades recorded.");
        return;
    }

    println!("\nTrades (last {TRADE_TABLE_LIMIT}):");
    println!(
        "{:<12} {:<12} {:>12} {:>12} {:>10} {:>14} {:>7}",
        TRADE_COLUMNS[0],
        TRADE_COLUMNS[1],
        TRADE_COLUMNS[2],
        TRADE_COLUMNS[3],
        TRADE_COLUMNS[4],
        TRADE_COLUMNS[5],
        TRADE_COLUMNS[6]
    );
    for row in trade_rows(&result.trades, TRADE_TABLE_LIMIT) {
        println!(
            "{:<12} {:<12} {:>12} {:>12} {:>10} {:>14} {:>7}",
            row[0], row[1], row[2], row[3], row[4], row[5], row[6]
        );
    }
}
