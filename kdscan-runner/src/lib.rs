//! kdscan runner: scan orchestration around the pure engine.
//!
//! This crate builds on `kdscan-core` to provide:
//! - Scan configuration (TOML, validation, fingerprint)
//! - The universe of codes and display names
//! - Market-data providers (Yahoo chart API, synthetic random walk)
//! - A circuit breaker shared by provider requests
//! - Report delivery (LINE push, stdout)
//! - The sequential scan loop

pub mod circuit_breaker;
pub mod config;
pub mod notify;
pub mod provider;
pub mod scan;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use config::{ConfigError, FetchConfig, ReportConfig, ScanConfig};
pub use notify::{LinePushNotifier, Notifier, NotifyError, StdoutNotifier};
pub use provider::{DataError, DataProvider, Lookback};
pub use scan::{ScanError, ScanOutcome, Scanner, SkipCounts, SkipReason};
pub use synthetic::SyntheticProvider;
pub use universe::{Universe, UniverseError};
pub use yahoo::YahooProvider;

use anyhow::Context;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

/// Build the market-data provider for a run.
///
/// `synthetic_end` selects the offline random walk ending on that date.
pub fn provider_for(
    fetch: &FetchConfig,
    synthetic_end: Option<NaiveDate>,
) -> anyhow::Result<Box<dyn DataProvider>> {
    if let Some(end) = synthetic_end {
        return Ok(Box::new(SyntheticProvider::new(end)));
    }
    let breaker = Arc::new(CircuitBreaker::default_provider());
    let yahoo = YahooProvider::new(breaker, fetch.suffix.clone(), fetch.retries)
        .context("create Yahoo provider")?;
    Ok(Box::new(yahoo))
}

/// Build the notifier for a run.
///
/// Without LINE credentials in the environment the report goes to stdout.
pub fn notifier_for(stdout_only: bool) -> Box<dyn Notifier> {
    if stdout_only {
        return Box::new(StdoutNotifier);
    }
    match LinePushNotifier::from_env() {
        Ok(line) => Box::new(line),
        Err(err) => {
            warn!(error = %err, "LINE push unavailable, printing report to stdout");
            Box::new(StdoutNotifier)
        }
    }
}

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<ScanConfig>();
        assert_sync::<ScanConfig>();
        assert_send::<Universe>();
        assert_sync::<Universe>();
    }

    #[test]
    fn providers_are_send_sync() {
        assert_send::<YahooProvider>();
        assert_sync::<YahooProvider>();
        assert_send::<SyntheticProvider>();
        assert_sync::<SyntheticProvider>();
        assert_send::<CircuitBreaker>();
        assert_sync::<CircuitBreaker>();
    }

    #[test]
    fn outcome_is_send_sync() {
        assert_send::<ScanOutcome>();
        assert_sync::<ScanOutcome>();
    }

    #[test]
    fn stdout_flag_forces_stdout() {
        assert_eq!(notifier_for(true).name(), "stdout");
    }

    #[test]
    fn synthetic_flag_selects_synthetic_provider() {
        let end = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let provider = provider_for(&FetchConfig::default(), Some(end)).unwrap();
        assert_eq!(provider.name(), "synthetic");
    }
}
