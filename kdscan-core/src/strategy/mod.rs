//! Strategy evaluation: rule sets that turn a snapshot into candidates.
//!
//! Strategies are independent: each receives the same [`Snapshot`] and decides
//! on its own whether the symbol qualifies. A symbol may land in neither list,
//! either, or both.

pub mod consolidation;
pub mod snapshot;
pub mod trend_attack;

pub use consolidation::{ConsolidationConfig, ConsolidationSetup};
pub use snapshot::{Snapshot, BOX_BARS};
pub use trend_attack::{TrendAttack, TrendAttackConfig};

use crate::candle::CandleStrictness;
use crate::classifier::ClassifierThresholds;
use crate::domain::{BarSeries, Candidate, SeriesError};
use crate::indicators::stochastic::DEFAULT_PERIOD;
use crate::indicators::IndicatorError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a symbol could not be evaluated. Any of these skips the symbol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("insufficient history: {have} bars, need {needed}")]
    InsufficientHistory { have: usize, needed: usize },

    #[error("invalid bar series: {0}")]
    Series(#[from] SeriesError),

    #[error("indicator error: {0}")]
    Indicator(#[from] IndicatorError),
}

/// Trait for rule sets.
///
/// A strategy only sees the derived snapshot of one symbol, never another
/// symbol's data.
pub trait Strategy: Send + Sync {
    /// Machine-readable name (e.g., "trend_attack").
    fn name(&self) -> &str;

    /// Returns a candidate if the snapshot satisfies the rule set.
    fn evaluate(&self, snapshot: &Snapshot, display_name: &str) -> Option<Candidate>;
}

/// Every tunable of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// RSV window of the stochastic oscillator.
    pub oscillator_period: usize,
    pub candle: CandleStrictness,
    pub classifier: ClassifierThresholds,
    pub trend_attack: TrendAttackConfig,
    pub consolidation: ConsolidationConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            oscillator_period: DEFAULT_PERIOD,
            candle: CandleStrictness::default(),
            classifier: ClassifierThresholds::default(),
            trend_attack: TrendAttackConfig::default(),
            consolidation: ConsolidationConfig::default(),
        }
    }
}

/// Outcome of evaluating one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub snapshot: Snapshot,
    pub trend_attack: Option<Candidate>,
    pub consolidation: Option<Candidate>,
}

/// Runs both rule sets over one symbol's bars.
pub struct Evaluator {
    config: StrategyConfig,
    trend_attack: TrendAttack,
    consolidation: ConsolidationSetup,
}

impl Evaluator {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            trend_attack: TrendAttack::new(config.trend_attack),
            consolidation: ConsolidationSetup::new(config.consolidation),
            config,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Evaluate a validated series.
    pub fn evaluate(&self, series: &BarSeries, display_name: &str) -> Result<Verdict, EvalError> {
        let snapshot = Snapshot::compute(series, &self.config)?;
        let trend_attack = self.trend_attack.evaluate(&snapshot, display_name);
        let consolidation = self.consolidation.evaluate(&snapshot, display_name);
        Ok(Verdict {
            snapshot,
            trend_attack,
            consolidation,
        })
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(StrategyConfig::default())
    }
}
