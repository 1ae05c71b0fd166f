//! Candidate: a symbol accepted by one of the strategies.

use crate::classifier::SignalState;
use crate::levels::{ResistanceLevel, SupportLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a consolidating symbol sits in its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxStage {
    /// Fresh %K/%D golden cross on the latest bar.
    ReadyToBreak,
    RangeBound,
}

impl fmt::Display for BoxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxStage::ReadyToBreak => f.write_str("ready-to-break"),
            BoxStage::RangeBound => f.write_str("range-bound"),
        }
    }
}

/// Strategy-specific part of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Setup {
    TrendAttack {
        /// Latest volume over the 5-day volume average.
        volume_ratio: f64,
    },
    Consolidation {
        box_high: f64,
        box_low: f64,
        box_width: f64,
        /// 3-day over 10-day average volume.
        volume_ratio: f64,
        stage: BoxStage,
    },
}

/// A symbol that passed a strategy's rule set in this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub pct_change: f64,
    pub signal: SignalState,
    pub support: SupportLevel,
    pub resistance: ResistanceLevel,
    pub setup: Setup,
}

impl Candidate {
    /// Ranking key within the candidate's own list: percent change for
    /// trend attacks, volume ratio for consolidations.
    pub fn rank_key(&self) -> f64 {
        match self.setup {
            Setup::TrendAttack { .. } => self.pct_change,
            Setup::Consolidation { volume_ratio, .. } => volume_ratio,
        }
    }
}
