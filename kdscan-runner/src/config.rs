//! Serializable scan configuration.
//!
//! One TOML file with three sections:
//!
//! ```toml
//! [strategy]        # oscillator period, candle strictness, thresholds
//! [report]          # top_n
//! [fetch]           # lookback, exchange suffix, delay, retries
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Credentials never live here; they come from the environment.

use crate::provider::Lookback;
use crate::yahoo::MAX_RETRIES;
use kdscan_core::report::DEFAULT_TOP_N;
use kdscan_core::{StrategyConfig, MIN_BARS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("encode config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Report rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Candidates kept per strategy.
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Market-data retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub lookback: Lookback,
    /// Exchange suffix appended to each code (`TW` turns 2330 into 2330.TW).
    pub suffix: String,
    /// Pause after every symbol, successful or not.
    pub delay_ms: u64,
    /// Retries per symbol after the first attempt.
    pub retries: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            lookback: Lookback::default(),
            suffix: "TW".to_string(),
            delay_ms: 500,
            retries: 3,
        }
    }
}

impl FetchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Complete configuration for one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub strategy: StrategyConfig,
    pub report: ReportConfig,
    pub fetch: FetchConfig,
}

impl ScanConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deterministic hash of the canonical JSON form.
    ///
    /// Two runs with identical configurations share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.strategy;

        if self.report.top_n == 0 {
            return invalid("report.top_n must be at least 1");
        }
        if s.oscillator_period == 0 {
            return invalid("strategy.oscillator_period must be at least 1");
        }
        if s.classifier.passivation_bars == 0 {
            return invalid("strategy.classifier.passivation_bars must be at least 1");
        }

        let candle = s.candle.ratio();
        if !candle.is_finite() || candle < 0.0 {
            return invalid(format!("strategy.candle ratio must be >= 0, got {candle}"));
        }

        let levels = [
            ("strategy.classifier.passivation_k", s.classifier.passivation_k),
            ("strategy.classifier.golden_cross_ceiling", s.classifier.golden_cross_ceiling),
            ("strategy.classifier.continuation_ceiling", s.classifier.continuation_ceiling),
            ("strategy.classifier.death_cross_floor", s.classifier.death_cross_floor),
        ];
        for (name, value) in levels {
            if !(0.0..=100.0).contains(&value) {
                return invalid(format!("{name} must be within [0, 100], got {value}"));
            }
        }

        let non_negative = [
            ("strategy.classifier.overheat_bias", s.classifier.overheat_bias),
            ("strategy.trend_attack.up_threshold", s.trend_attack.up_threshold),
            ("strategy.consolidation.pct_cap", s.consolidation.pct_cap),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be >= 0, got {value}"));
            }
        }

        let positive = [
            ("strategy.trend_attack.spike_factor", s.trend_attack.spike_factor),
            ("strategy.consolidation.tight_threshold", s.consolidation.tight_threshold),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return invalid(format!("{name} must be > 0, got {value}"));
            }
        }

        if self.fetch.retries > MAX_RETRIES {
            return invalid(format!(
                "fetch.retries must be at most {MAX_RETRIES}, got {}",
                self.fetch.retries
            ));
        }

        let lookback = self.fetch.lookback;
        if lookback.max_sessions() < MIN_BARS {
            return invalid(format!(
                "fetch.lookback {lookback} yields at most {} sessions, need {MIN_BARS}",
                lookback.max_sessions()
            ));
        }

        if !self.fetch.suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return invalid(format!(
                "fetch.suffix must be alphanumeric, got '{}'",
                self.fetch.suffix
            ));
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdscan_core::candle::CandleStrictness;

    #[test]
    fn empty_file_is_default() {
        let config = ScanConfig::from_toml("").unwrap();
        assert_eq!(config, ScanConfig::default());
        assert_eq!(config.report.top_n, 10);
        assert_eq!(config.fetch.lookback, Lookback::SixMonths);
        assert_eq!(config.fetch.suffix, "TW");
        assert_eq!(config.fetch.delay(), Duration::from_millis(500));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ScanConfig::from_toml(
            r#"
            [strategy]
            candle = "strict"

            [strategy.consolidation]
            pct_cap = 3.0

            [fetch]
            lookback = "3mo"
            delay_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy.candle, CandleStrictness::Strict);
        assert_eq!(config.strategy.consolidation.pct_cap, 3.0);
        assert_eq!(config.strategy.consolidation.tight_threshold, 0.12);
        assert_eq!(config.strategy.trend_attack.spike_factor, 1.3);
        assert_eq!(config.fetch.lookback, Lookback::ThreeMonths);
        assert_eq!(config.fetch.delay_ms, 0);
        assert_eq!(config.fetch.retries, 3);
    }

    #[test]
    fn explicit_candle_ratio() {
        let config = ScanConfig::from_toml(
            r#"
            [strategy.candle]
            ratio = 1.8
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy.candle.ratio(), 1.8);
    }

    #[test]
    fn zero_top_n_is_rejected() {
        let err = ScanConfig::from_toml("[report]\ntop_n = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn negative_thresholds_are_rejected() {
        let err =
            ScanConfig::from_toml("[strategy.trend_attack]\nspike_factor = -1.0\n").unwrap_err();
        assert!(err.to_string().contains("spike_factor"));

        let err = ScanConfig::from_toml("[strategy.classifier]\npassivation_k = 120.0\n")
            .unwrap_err();
        assert!(err.to_string().contains("passivation_k"));
    }

    #[test]
    fn bad_suffix_is_rejected() {
        let err = ScanConfig::from_toml("[fetch]\nsuffix = \"T/W\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn retries_are_capped() {
        let toml = format!("[fetch]\nretries = {MAX_RETRIES}\n");
        let config = ScanConfig::from_toml(&toml).unwrap();
        assert_eq!(config.fetch.retries, MAX_RETRIES);

        let err = ScanConfig::from_toml("[fetch]\nretries = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("fetch.retries"));
    }

    #[test]
    fn short_lookback_is_rejected() {
        let err = ScanConfig::from_toml("[fetch]\nlookback = \"1mo\"\n").unwrap_err();
        assert!(err.to_string().contains("fetch.lookback 1mo"));

        let config = ScanConfig::from_toml("[fetch]\nlookback = \"3mo\"\n").unwrap();
        assert_eq!(config.fetch.lookback, Lookback::ThreeMonths);
    }

    #[test]
    fn unknown_lookback_is_a_parse_error() {
        let err = ScanConfig::from_toml("[fetch]\nlookback = \"5y\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let a = ScanConfig::default();
        let b = ScanConfig::default();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);

        let mut c = ScanConfig::default();
        c.report.top_n = 5;
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }
}
