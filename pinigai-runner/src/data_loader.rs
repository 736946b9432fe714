//! Daily price loading with a file-per-ticker CSV cache.
//!
//! Resolution policy for [`HistoricalPriceLoader::load_daily`]:
//! 1. If the cached CSV is younger than `max_age` → read it
//! 2. Otherwise → fetch from the provider and rewrite the cache (non-empty results only)
//!
//! Layout: `{cache_dir}/{ticker}.csv`, ticker lowercased with `/` replaced by `-`.

use chrono::NaiveDate;
use pinigai_core::domain::{BarDate, PriceBar};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Default freshness window for cached prices.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(12 * 3600);

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no data available for ticker '{ticker}'")]
    NoData { ticker: String },

    #[error("malformed price CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache only stores calendar-dated bars (found index {0})")]
    UndatedBar(i64),
}

// ── Provider ─────────────────────────────────────────────────────────

/// Source of daily bars. The cache sits above this trait; providers don't know about it.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Full daily history for `ticker`, sorted by date ascending.
    fn fetch_daily(&self, ticker: &str) -> Result<Vec<PriceBar>, LoadError>;
}

/// Free end-of-day quotes from stooq.com.
pub struct StooqProvider {
    client: reqwest::blocking::Client,
}

impl StooqProvider {
    pub fn new() -> Result<Self, LoadError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    /// Stooq symbol for a ticker: lowercased, US listing assumed unless `.us`/`.uk` is given.
    pub fn stooq_symbol(ticker: &str) -> String {
        let symbol = ticker.to_lowercase();
        if symbol.ends_with(".us") || symbol.ends_with(".uk") {
            symbol
        } else {
            format!("{symbol}.us")
        }
    }

    /// Daily CSV download URL.
    pub fn daily_url(ticker: &str) -> String {
        format!(
            "https://stooq.com/q/d/l/?s={}&i=d",
            Self::stooq_symbol(ticker)
        )
    }
}

impl PriceProvider for StooqProvider {
    fn name(&self) -> &str {
        "stooq"
    }

    fn fetch_daily(&self, ticker: &str) -> Result<Vec<PriceBar>, LoadError> {
        let url = Self::daily_url(ticker);
        tracing::info!(ticker, %url, "downloading daily bars");
        let body = self.client.get(&url).send()?.error_for_status()?.text()?;
        parse_stooq_body(ticker, &body)
    }
}

/// Parse a Stooq daily CSV response (`Date,Open,High,Low,Close,Volume`).
pub fn parse_stooq_body(ticker: &str, body: &str) -> Result<Vec<PriceBar>, LoadError> {
    if body.contains("No data") {
        return Err(LoadError::NoData {
            ticker: ticker.to_string(),
        });
    }
    read_price_csv(body.as_bytes())
}

// ── CSV records ──────────────────────────────────────────────────────

/// One CSV row. Accepts both the Stooq capitalized header and the cache's lowercase one.
#[derive(Debug, Serialize, Deserialize)]
struct CsvBar {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "High")]
    high: Option<f64>,
    #[serde(alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

impl From<CsvBar> for PriceBar {
    fn from(row: CsvBar) -> Self {
        PriceBar {
            date: BarDate::Calendar(row.date),
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

impl TryFrom<&PriceBar> for CsvBar {
    type Error = LoadError;

    fn try_from(bar: &PriceBar) -> Result<Self, Self::Error> {
        let date = match bar.date {
            BarDate::Calendar(d) => d,
            BarDate::Index(i) => return Err(LoadError::UndatedBar(i)),
        };
        Ok(CsvBar {
            date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })
    }
}

fn read_price_csv<R: std::io::Read>(reader: R) -> Result<Vec<PriceBar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = rdr
        .deserialize::<CsvBar>()
        .map(|row| row.map(PriceBar::from))
        .collect::<Result<Vec<_>, _>>()?;
    bars.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(bars)
}

// ── Cache ────────────────────────────────────────────────────────────

/// File-per-ticker CSV cache.
#[derive(Debug, Clone)]
pub struct PriceCache {
    cache_dir: PathBuf,
}

impl PriceCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `{cache_dir}/{ticker}.csv`, ticker lowercased with `/` replaced by `-`.
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        let safe = ticker.to_lowercase().replace('/', "-");
        self.cache_dir.join(format!("{safe}.csv"))
    }

    /// True when the cache file exists and was modified less than `max_age` ago.
    pub fn is_fresh(&self, ticker: &str, max_age: Duration) -> bool {
        let modified = match fs::metadata(self.path_for(ticker)).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return false,
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age < max_age,
            // Modified in the future (clock skew): treat as fresh.
            Err(_) => true,
        }
    }

    /// Cached bars for `ticker`, sorted by date ascending.
    pub fn read(&self, ticker: &str) -> Result<Vec<PriceBar>, LoadError> {
        let path = self.path_for(ticker);
        let file = fs::File::open(&path).map_err(|source| LoadError::Io { path, source })?;
        read_price_csv(file)
    }

    /// Replace the cached bars for `ticker`. Writes are atomic: write to .tmp then rename.
    pub fn write(&self, ticker: &str, bars: &[PriceBar]) -> Result<PathBuf, LoadError> {
        fs::create_dir_all(&self.cache_dir).map_err(|source| LoadError::Io {
            path: self.cache_dir.clone(),
            source,
        })?;

        let path = self.path_for(ticker);
        let tmp_path = path.with_extension("csv.tmp");
        {
            let mut wtr = csv::Writer::from_path(&tmp_path)?;
            for bar in bars {
                wtr.serialize(CsvBar::try_from(bar)?)?;
            }
            wtr.flush().map_err(|source| LoadError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        }

        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            LoadError::Io {
                path: path.clone(),
                source,
            }
        })?;
        Ok(path)
    }
}

// ── Loader ───────────────────────────────────────────────────────────

/// Cache-first loader over a [`PriceProvider`].
pub struct HistoricalPriceLoader {
    cache: PriceCache,
    provider: Box<dyn PriceProvider>,
    max_age: Duration,
}

impl HistoricalPriceLoader {
    pub fn new(cache: PriceCache, provider: Box<dyn PriceProvider>) -> Self {
        Self {
            cache,
            provider,
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Loader backed by Stooq, caching under `cache_dir`.
    pub fn stooq(cache_dir: impl Into<PathBuf>) -> Result<Self, LoadError> {
        Ok(Self::new(
            PriceCache::new(cache_dir),
            Box::new(StooqProvider::new()?),
        ))
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Daily bars for `ticker`, sorted by date ascending.
    pub fn load_daily(&self, ticker: &str) -> Result<Vec<PriceBar>, LoadError> {
        if self.cache.is_fresh(ticker, self.max_age) {
            match self.cache.read(ticker) {
                Ok(bars) => {
                    tracing::info!(ticker, bars = bars.len(), "using cached prices");
                    return Ok(bars);
                }
                Err(e) => {
                    tracing::warn!(ticker, error = %e, "unreadable price cache, re-downloading");
                }
            }
        }
        self.refresh(ticker)
    }

    /// Fetch from the provider regardless of cache state, caching non-empty results.
    pub fn refresh(&self, ticker: &str) -> Result<Vec<PriceBar>, LoadError> {
        let mut bars = self.provider.fetch_daily(ticker)?;
        bars.sort_by(|a, b| a.date.cmp(&b.date));
        if bars.is_empty() {
            tracing::warn!(ticker, provider = self.provider.name(), "provider returned no bars");
        } else {
            let path = self.cache.write(ticker, &bars)?;
            tracing::info!(ticker, bars = bars.len(), path = %path.display(), "cached prices");
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOOQ_BODY: &str = "\
Date,Open,High,Low,Close,Volume
2024-01-03,184.22,185.88,183.43,184.25,58414460
2024-01-02,187.15,188.44,183.89,185.64,82488670
2024-01-04,182.15,183.09,180.88,181.91,71983570
";

    #[test]
    fn stooq_symbol_defaults_to_us() {
        assert_eq!(StooqProvider::stooq_symbol("AAPL"), "aapl.us");
        assert_eq!(StooqProvider::stooq_symbol("vod.uk"), "vod.uk");
        assert_eq!(StooqProvider::stooq_symbol("SPY.US"), "spy.us");
    }

    #[test]
    fn daily_url_format() {
        assert_eq!(
            StooqProvider::daily_url("MSFT"),
            "https://stooq.com/q/d/l/?s=msft.us&i=d"
        );
    }

    #[test]
    fn parses_and_sorts_stooq_csv() {
        let bars = parse_stooq_body("AAPL", STOOQ_BODY).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(
            bars[0].date,
            BarDate::Calendar(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
        assert_eq!(bars[0].open, Some(187.15));
        assert_eq!(bars[0].close, Some(185.64));
        assert_eq!(bars[2].volume, Some(71_983_570.0));
    }

    #[test]
    fn missing_volume_column_is_tolerated() {
        let body = "Date,Open,High,Low,Close\n2024-01-02,1.0,2.0,0.5,1.5\n";
        let bars = parse_stooq_body("EURUSD", body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn no_data_body_is_error() {
        let err = parse_stooq_body("ZZZZ", "No data").unwrap_err();
        assert!(matches!(err, LoadError::NoData { ref ticker } if ticker == "ZZZZ"));
    }

    #[test]
    fn malformed_row_is_csv_error() {
        let body = "Date,Open,High,Low,Close,Volume\nnot-a-date,1,2,0.5,1.5,10\n";
        assert!(matches!(
            parse_stooq_body("AAPL", body),
            Err(LoadError::Csv(_))
        ));
    }

    #[test]
    fn cache_path_is_sanitized() {
        let cache = PriceCache::new("/data");
        assert_eq!(cache.path_for("AAPL"), PathBuf::from("/data/aapl.csv"));
        assert_eq!(cache.path_for("BRK/B"), PathBuf::from("/data/brk-b.csv"));
    }

    #[test]
    fn missing_cache_is_not_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PriceCache::new(dir.path());
        assert!(!cache.is_fresh("AAPL", DEFAULT_MAX_AGE));
        assert!(matches!(cache.read("AAPL"), Err(LoadError::Io { .. })));
    }

    #[test]
    fn cache_roundtrip_and_freshness() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PriceCache::new(dir.path().join("nested"));
        let bars = parse_stooq_body("AAPL", STOOQ_BODY).unwrap();

        let path = cache.write("AAPL", &bars).unwrap();
        assert!(path.ends_with("aapl.csv"));
        assert!(cache.is_fresh("AAPL", DEFAULT_MAX_AGE));
        assert!(!cache.is_fresh("AAPL", Duration::ZERO));
        assert_eq!(cache.read("aapl").unwrap(), bars);
    }

    #[test]
    fn cache_rejects_index_dated_bars() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PriceCache::new(dir.path());
        let bars = vec![PriceBar::from_close(3_i64, 10.0)];
        assert!(matches!(
            cache.write("X", &bars),
            Err(LoadError::UndatedBar(3))
        ));
    }
}
