//! Market-data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Yahoo chart API,
//! synthetic random walks) so the scanner can swap them and tests can mock.

use chrono::NaiveDate;
use kdscan_core::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

/// How much daily history to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookback {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6mo")]
    SixMonths,
}

impl Lookback {
    /// Calendar days covered.
    pub fn days(self) -> i64 {
        match self {
            Lookback::OneMonth => 30,
            Lookback::ThreeMonths => 91,
            Lookback::SixMonths => 182,
        }
    }

    /// Weekday sessions in the window, an upper bound on the bars returned.
    pub fn max_sessions(self) -> usize {
        (self.days() as usize) * 5 / 7
    }

    /// Range token understood by the chart API.
    pub fn as_str(self) -> &'static str {
        match self {
            Lookback::OneMonth => "1mo",
            Lookback::ThreeMonths => "3mo",
            Lookback::SixMonths => "6mo",
        }
    }

    /// First calendar date covered when the window ends on `end`.
    pub fn start_from(self, end: NaiveDate) -> NaiveDate {
        end - chrono::Duration::days(self.days())
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lookback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1mo" => Ok(Lookback::OneMonth),
            "3mo" => Ok(Lookback::ThreeMonths),
            "6mo" => Ok(Lookback::SixMonths),
            other => Err(format!("unknown lookback '{other}' (expected 1mo, 3mo or 6mo)")),
        }
    }
}

/// Trait for market-data providers.
///
/// Implementations return bars in ascending date order. Validation into a
/// [`kdscan_core::BarSeries`] happens in the scanner, not here.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for one universe code.
    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<Vec<Bar>, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_days() {
        assert_eq!(Lookback::OneMonth.days(), 30);
        assert_eq!(Lookback::ThreeMonths.days(), 91);
        assert_eq!(Lookback::default(), Lookback::SixMonths);
        assert_eq!(Lookback::SixMonths.days(), 182);
    }

    #[test]
    fn lookback_sessions() {
        assert_eq!(Lookback::OneMonth.max_sessions(), 21);
        assert_eq!(Lookback::ThreeMonths.max_sessions(), 65);
        assert_eq!(Lookback::SixMonths.max_sessions(), 130);
    }

    #[test]
    fn lookback_parses_range_tokens() {
        for lb in [Lookback::OneMonth, Lookback::ThreeMonths, Lookback::SixMonths] {
            assert_eq!(lb.to_string().parse::<Lookback>().unwrap(), lb);
        }
        assert!("1y".parse::<Lookback>().is_err());
    }

    #[test]
    fn lookback_start_date() {
        let end = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(
            Lookback::OneMonth.start_from(end),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }
}
