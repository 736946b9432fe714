//! Serializable backtest configuration loaded from TOML.

use pinigai_core::engine::DEFAULT_INITIAL_CAPITAL;
use pinigai_core::signals::MovingAverageCrossover;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides the default price cache directory.
pub const CACHE_DIR_ENV: &str = "PRICE_DATA_CACHE";

/// Unique identifier for a backtest configuration (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce one crossover backtest.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub ticker: String,
    pub fast_window: usize,
    pub slow_window: usize,
    pub initial_capital: f64,
    /// Falls back to [`default_cache_dir`] when unset.
    pub cache_dir: Option<PathBuf>,
    pub max_cache_age_hours: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            fast_window: MovingAverageCrossover::DEFAULT_FAST,
            slow_window: MovingAverageCrossover::DEFAULT_SLOW,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            cache_dir: None,
            max_cache_age_hours: 12,
        }
    }
}

impl BacktestConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.trim().is_empty() {
            return Err(ConfigError::Invalid("ticker must not be empty".into()));
        }
        if self.fast_window == 0 || self.slow_window == 0 {
            return Err(ConfigError::Invalid(
                "window lengths must be positive integers".into(),
            ));
        }
        if self.fast_window >= self.slow_window {
            return Err(ConfigError::Invalid(format!(
                "fast window ({}) must be shorter than slow window ({})",
                self.fast_window, self.slow_window
            )));
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial capital must be positive, got {}",
                self.initial_capital
            )));
        }
        Ok(())
    }

    /// The strategy this config describes.
    pub fn strategy(&self) -> Result<MovingAverageCrossover, ConfigError> {
        MovingAverageCrossover::new(self.fast_window, self.slow_window)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Resolved cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    pub fn max_cache_age(&self) -> Duration {
        Duration::from_secs(self.max_cache_age_hours * 3600)
    }

    /// Deterministic hash of the parameters that affect results.
    ///
    /// Cache location is excluded: the same backtest run against two cache
    /// directories shares one id.
    pub fn run_id(&self) -> RunId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.ticker.to_uppercase().as_bytes());
        hasher.update(&(self.fast_window as u64).to_le_bytes());
        hasher.update(&(self.slow_window as u64).to_le_bytes());
        hasher.update(&self.initial_capital.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// `$PRICE_DATA_CACHE` if set, otherwise `<home>/.cache/pinigai`.
pub fn default_cache_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache")
        .join("pinigai")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = BacktestConfig::from_toml("").unwrap();
        assert_eq!(config, BacktestConfig::default());
        assert_eq!(config.ticker, "AAPL");
        assert_eq!(config.fast_window, 12);
        assert_eq!(config.slow_window, 26);
        assert_eq!(config.initial_capital, 10_000.0);
        assert_eq!(config.max_cache_age(), Duration::from_secs(12 * 3600));
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = BacktestConfig::from_toml(
            r#"
            ticker = "MSFT"
            fast_window = 5
            slow_window = 20
            cache_dir = "/tmp/prices"
            "#,
        )
        .unwrap();
        assert_eq!(config.ticker, "MSFT");
        assert_eq!(config.fast_window, 5);
        assert_eq!(config.slow_window, 20);
        assert_eq!(config.initial_capital, 10_000.0);
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/prices"));
    }

    #[test]
    fn rejects_inverted_windows() {
        let err = BacktestConfig::from_toml("fast_window = 30\nslow_window = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("shorter"));
    }

    #[test]
    fn rejects_zero_window_and_bad_capital() {
        assert!(BacktestConfig::from_toml("fast_window = 0").is_err());
        assert!(BacktestConfig::from_toml("initial_capital = -1.0").is_err());
        assert!(BacktestConfig::from_toml("ticker = \"  \"").is_err());
    }

    #[test]
    fn overridden_fields_are_revalidated() {
        let mut config = BacktestConfig::default();
        config.fast_window = 26;
        config.slow_window = 12;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config: fast window (26) must be shorter than slow window (12)"
        );

        config.fast_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = BacktestConfig::from_toml("fast_window = \"twelve\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BacktestConfig::from_file(Path::new("/nonexistent/pinigai.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn strategy_uses_windows() {
        let config = BacktestConfig {
            fast_window: 3,
            slow_window: 9,
            ..Default::default()
        };
        let strategy = config.strategy().unwrap();
        assert_eq!(strategy.fast_window(), 3);
        assert_eq!(strategy.slow_window(), 9);
    }

    #[test]
    fn run_id_deterministic() {
        let config = BacktestConfig::default();
        assert_eq!(config.run_id(), config.run_id());
        assert_eq!(config.run_id().len(), 64);
    }

    #[test]
    fn run_id_changes_with_params() {
        let a = BacktestConfig::default();
        let b = BacktestConfig {
            slow_window: 50,
            ..Default::default()
        };
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn run_id_ignores_cache_location() {
        let a = BacktestConfig::default();
        let b = BacktestConfig {
            cache_dir: Some(PathBuf::from("/elsewhere")),
            ..Default::default()
        };
        assert_eq!(a.run_id(), b.run_id());
    }
}
