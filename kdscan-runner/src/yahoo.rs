//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API for exchange-qualified
//! tickers (`2330` becomes `2330.TW`). Handles rate limiting, retries with
//! exponential backoff, response parsing, and the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use crate::circuit_breaker::CircuitBreaker;
use crate::provider::{DataError, DataProvider, Lookback};
use chrono::NaiveDate;
use kdscan_core::Bar;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Upper bound on retries per symbol after the first attempt.
pub const MAX_RETRIES: u32 = 5;

/// Longest single pause between attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Pause before retry `attempt` (1-based): `base * 2^(attempt - 1)`, capped.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    suffix: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(
        circuit_breaker: Arc<CircuitBreaker>,
        suffix: impl Into<String>,
        max_retries: u32,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            suffix: suffix.into(),
            max_retries: max_retries.min(MAX_RETRIES),
            base_delay: Duration::from_millis(500),
        })
    }

    /// Exchange-qualified ticker for a universe code.
    pub fn ticker(&self, code: &str) -> String {
        if self.suffix.is_empty() {
            code.to_string()
        } else {
            format!("{code}.{}", self.suffix)
        }
    }

    /// Build the chart API URL for a ticker and lookback.
    fn chart_url(ticker: &str, lookback: Lookback) -> String {
        format!("{CHART_BASE}/{ticker}?range={lookback}&interval=1d")
    }

    /// Parse the chart API response into bars.
    ///
    /// Rows with any missing field are dropped. When the exchange reports the
    /// same session twice (a live row next to the settled one), the later row wins.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: ticker.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

        let timestamps = data.timestamp.ok_or_else(|| DataError::SymbolNotFound {
            symbol: ticker.to_string(),
        })?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars: Vec<Bar> = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = session_date(ts, offset).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            let fields = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
                quote.volume.get(i).copied().flatten(),
            );
            let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = fields else {
                continue;
            };

            let bar = Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            };
            match bars.last_mut() {
                Some(last) if last.date == date => *last = bar,
                _ => bars.push(bar),
            }
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }

        Ok(bars)
    }

    /// Execute a single HTTP request with retry and circuit breaker logic.
    fn fetch_with_retry(&self, ticker: &str, lookback: Lookback) -> Result<Vec<Bar>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(ticker, lookback);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(backoff_delay(self.base_delay, attempt));
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    // Unknown tickers come back as 404 with a chart error body.
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: ticker.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {ticker}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {ticker}: {e}"
                        ))
                    })?;

                    let bars = Self::parse_response(ticker, chart)?;
                    self.circuit_breaker.record_success();
                    return Ok(bars);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Local trading date of a session timestamp.
fn session_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(ts + gmtoffset, 0).map(|dt| dt.naive_utc().date())
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<Vec<Bar>, DataError> {
        self.fetch_with_retry(&self.ticker(symbol), lookback)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
