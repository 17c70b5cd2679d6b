//! Runner configuration loaded from TOML.
//!
//! ```toml
//! symbols = ["EUR/USD", "GBP/USD"]
//! interval = "5min"
//! candles = 200
//! poll_interval_secs = 300
//! mode = "auto"
//!
//! [thresholds]
//! min_votes = 5
//! min_confidence = 90.0
//!
//! [rules.rsi]
//! period = 14
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use confluence_core::{ConfluenceError, Interval, RuleConfig, Thresholds};

/// Environment variable consulted when the config carries no `api_key`.
pub const API_KEY_ENV: &str = "TWELVEDATA_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse runner config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid runner config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Rules(#[from] ConfluenceError),
}

/// Whether the polling loop produces signals on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Signals only on explicit request (`scan`, `analyze`).
    Manual,
    /// The watch loop scans every poll interval.
    #[default]
    Auto,
}

fn default_interval() -> Interval {
    Interval::M5
}

fn default_candles() -> usize {
    200
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_fetch_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub symbols: Vec<String>,
    #[serde(default = "default_interval")]
    pub interval: Interval,
    /// Candles requested per symbol per cycle.
    #[serde(default = "default_candles")]
    pub candles: usize,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub rules: RuleConfig,
}

impl RunnerConfig {
    /// Config for the given symbols with every other field at its default.
    pub fn for_symbols<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            interval: default_interval(),
            candles: default_candles(),
            poll_interval_secs: default_poll_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            mode: Mode::default(),
            api_key: None,
            thresholds: Thresholds::default(),
            rules: RuleConfig::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("symbols must not be empty".into()));
        }
        if let Some(blank) = self.symbols.iter().position(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("symbol #{blank} is blank")));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("poll_interval_secs must be > 0".into()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch_timeout_secs must be > 0".into()));
        }
        self.rules.validate()?;
        self.thresholds.validate()?;
        let required = self.rules.required_bars();
        if self.candles < required {
            return Err(ConfigError::Invalid(format!(
                "candles ({}) is below what the rule table needs ({required})",
                self.candles
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// `api_key` from the file, else the `TWELVEDATA_KEY` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = RunnerConfig::from_toml(r#"symbols = ["EUR/USD"]"#).unwrap();
        assert_eq!(config.interval, Interval::M5);
        assert_eq!(config.candles, 200);
        assert_eq!(config.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(20));
        assert_eq!(config.mode, Mode::Auto);
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.rules, RuleConfig::default());
    }

    #[test]
    fn full_config_parses() {
        let config = RunnerConfig::from_toml(
            r#"
symbols = ["EUR/USD", "USD/JPY"]
interval = "M15"
candles = 120
poll_interval_secs = 60
mode = "manual"
api_key = "abc"

[thresholds]
min_votes = 3
min_confidence = 70.0

[rules]
min_bars = 40

[rules.rsi]
period = 9
"#,
        )
        .unwrap();
        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.interval, Interval::M15);
        assert_eq!(config.mode, Mode::Manual);
        assert_eq!(config.thresholds, Thresholds::new(3, 70.0));
        assert_eq!(config.rules.rsi.as_ref().unwrap().period, 9);
        assert!(config.rules.macd.is_none());
        assert_eq!(config.resolve_api_key().as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_empty_symbols() {
        let err = RunnerConfig::from_toml("symbols = []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_too_few_candles_for_rules() {
        let err = RunnerConfig::from_toml("symbols = [\"EUR/USD\"]\ncandles = 10").unwrap_err();
        assert!(err.to_string().contains("rule table needs (30)"));
    }

    #[test]
    fn rejects_invalid_rules() {
        let err = RunnerConfig::from_toml(
            "symbols = [\"EUR/USD\"]\n[rules.ema_cross]\nfast = 30\nslow = 10\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Rules(ConfluenceError::Configuration(_))));
    }

    #[test]
    fn rejects_bad_interval() {
        let err = RunnerConfig::from_toml("symbols = [\"EUR/USD\"]\ninterval = \"7min\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RunnerConfig::from_file(Path::new("/nonexistent/runner.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn for_symbols_is_valid() {
        RunnerConfig::for_symbols(["EUR/USD", "GBP/USD"]).validate().unwrap();
    }
}
