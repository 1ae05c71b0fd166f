//! The scan loop.
//!
//! Walks the universe in code order, one symbol at a time: fetch, validate,
//! evaluate, collect candidates. Any per-symbol failure skips that symbol and
//! the loop moves on. After every symbol the scanner pauses for the configured
//! delay. Once the universe is exhausted the report is built, rendered and
//! handed to the notifier; a failed delivery is logged, not raised.

use crate::config::{ConfigError, ScanConfig};
use crate::notify::Notifier;
use crate::provider::{DataError, DataProvider};
use crate::universe::Universe;
use kdscan_core::{BarSeries, Candidate, EvalError, Evaluator, Report, SeriesError, Verdict};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Progress is logged after every this many symbols.
pub const PROGRESS_EVERY: usize = 20;

/// Why one symbol could not be evaluated.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] DataError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    FetchFailed,
    InsufficientHistory,
    InvalidSeries,
    Indicator,
}

impl SkipReason {
    pub fn of(err: &ScanError) -> Self {
        match err {
            ScanError::Fetch(_) => SkipReason::FetchFailed,
            ScanError::Eval(EvalError::InsufficientHistory { .. })
            | ScanError::Eval(EvalError::Series(SeriesError::Empty { .. })) => {
                SkipReason::InsufficientHistory
            }
            ScanError::Eval(EvalError::Series(_)) => SkipReason::InvalidSeries,
            ScanError::Eval(EvalError::Indicator(_)) => SkipReason::Indicator,
        }
    }
}

/// Skipped symbols by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub fetch_failed: usize,
    pub insufficient_history: usize,
    pub invalid_series: usize,
    pub indicator: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::FetchFailed => self.fetch_failed += 1,
            SkipReason::InsufficientHistory => self.insufficient_history += 1,
            SkipReason::InvalidSeries => self.invalid_series += 1,
            SkipReason::Indicator => self.indicator += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.fetch_failed + self.insufficient_history + self.invalid_series + self.indicator
    }
}

/// Result of one complete scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub report: Report,
    /// The text handed to the notifier.
    pub text: String,
    pub scanned: usize,
    pub evaluated: usize,
    pub skipped: SkipCounts,
    /// False when the notifier reported a failure.
    pub delivered: bool,
    pub elapsed: Duration,
}

/// Sequential scanner over an immutable universe.
pub struct Scanner<'a> {
    config: ScanConfig,
    fingerprint: String,
    universe: Universe,
    provider: &'a dyn DataProvider,
    notifier: &'a dyn Notifier,
    evaluator: Evaluator,
    sleeper: Box<dyn Fn(Duration) + 'a>,
}

impl<'a> Scanner<'a> {
    /// Validates the configuration and fixes its fingerprint for the run.
    pub fn new(
        config: ScanConfig,
        universe: Universe,
        provider: &'a dyn DataProvider,
        notifier: &'a dyn Notifier,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let fingerprint = config.fingerprint()?;
        let evaluator = Evaluator::new(config.strategy.clone());
        Ok(Self {
            config,
            fingerprint,
            universe,
            provider,
            notifier,
            evaluator,
            sleeper: Box::new(std::thread::sleep),
        })
    }

    /// Replace the inter-symbol pause.
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + 'a) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Fetch and evaluate one code. The display name falls back to the code.
    pub fn evaluate_symbol(&self, code: &str) -> Result<Verdict, ScanError> {
        let name = self.universe.name_of(code).unwrap_or(code);
        self.evaluate_named(code, name)
    }

    /// Fetch and validate one symbol's history.
    pub fn fetch_series(&self, code: &str) -> Result<BarSeries, ScanError> {
        let bars = self.provider.fetch(code, self.config.fetch.lookback)?;
        Ok(BarSeries::new(code, bars).map_err(EvalError::from)?)
    }

    /// Evaluate an already fetched series under its universe display name.
    pub fn evaluate_series(&self, series: &BarSeries) -> Result<Verdict, ScanError> {
        let code = series.symbol();
        let name = self.universe.name_of(code).unwrap_or(code);
        Ok(self.evaluator.evaluate(series, name)?)
    }

    fn evaluate_named(&self, code: &str, name: &str) -> Result<Verdict, ScanError> {
        let series = self.fetch_series(code)?;
        Ok(self.evaluator.evaluate(&series, name)?)
    }

    /// Scan the whole universe and deliver the report.
    pub fn run(&self) -> ScanOutcome {
        let started = Instant::now();
        let total = self.universe.len();
        let delay = self.config.fetch.delay();

        info!(
            symbols = total,
            provider = self.provider.name(),
            notifier = self.notifier.name(),
            lookback = %self.config.fetch.lookback,
            config = %self.fingerprint,
            "scan started"
        );

        let mut trend_attack: Vec<Candidate> = Vec::new();
        let mut consolidation: Vec<Candidate> = Vec::new();
        let mut skipped = SkipCounts::default();
        let mut evaluated = 0;

        for (i, (code, name)) in self.universe.iter().enumerate() {
            match self.evaluate_named(code, name) {
                Ok(verdict) => {
                    evaluated += 1;
                    if let Some(c) = verdict.trend_attack {
                        info!(
                            symbol = code,
                            name,
                            price = c.price,
                            pct = c.pct_change,
                            signal = c.signal.as_str(),
                            "trend attack candidate"
                        );
                        trend_attack.push(c);
                    }
                    if let Some(c) = verdict.consolidation {
                        info!(
                            symbol = code,
                            name,
                            price = c.price,
                            signal = c.signal.as_str(),
                            "consolidation candidate"
                        );
                        consolidation.push(c);
                    }
                }
                Err(err) => {
                    let reason = SkipReason::of(&err);
                    skipped.record(reason);
                    match reason {
                        SkipReason::FetchFailed => {
                            warn!(symbol = code, error = %err, "fetch failed, skipping")
                        }
                        _ => debug!(symbol = code, ?reason, error = %err, "skipped"),
                    }
                }
            }

            if (i + 1) % PROGRESS_EVERY == 0 {
                info!(done = i + 1, total, "progress");
            }

            if !delay.is_zero() {
                (self.sleeper)(delay);
            }
        }

        let report = Report::build(trend_attack, consolidation, self.config.report.top_n);
        let text = report.render();

        let delivered = match self.notifier.notify(&text) {
            Ok(()) => true,
            Err(err) => {
                warn!(notifier = self.notifier.name(), error = %err, "report delivery failed");
                false
            }
        };

        let elapsed = started.elapsed();
        info!(
            trend_attack = report.trend_attack_total,
            consolidation = report.consolidation_total,
            evaluated,
            skipped = skipped.total(),
            delivered,
            elapsed_ms = elapsed.as_millis() as u64,
            "scan finished"
        );

        ScanOutcome {
            report,
            text,
            scanned: total,
            evaluated,
            skipped,
            delivered,
            elapsed,
        }
    }
}
