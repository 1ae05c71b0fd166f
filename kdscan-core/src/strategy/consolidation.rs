//! Consolidation Setup: quiet accumulation inside a tight box.
//!
//! Over the trailing 10 bars, accepts when:
//! - the box is tighter than `tight_threshold` (width relative to the low)
//! - price sits in the upper half of the box
//! - 3-day average volume exceeds the 10-day average
//! - price is above SMA60
//! - the day's percent change is below `pct_cap` (bigger moves belong to
//!   Trend Attack)

use crate::domain::{BoxStage, Candidate, Setup};
use serde::{Deserialize, Serialize};

use super::{Snapshot, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Maximum box width as a fraction of the box low.
    pub tight_threshold: f64,
    /// Percent change at or above which the symbol is considered broken out.
    pub pct_cap: f64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            tight_threshold: 0.12,
            pct_cap: 4.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsolidationSetup {
    config: ConsolidationConfig,
}

impl ConsolidationSetup {
    pub fn new(config: ConsolidationConfig) -> Self {
        Self { config }
    }

    pub fn accepts(&self, snap: &Snapshot) -> bool {
        let tight = snap.box_width() < self.config.tight_threshold;
        let upper_half = snap.price > snap.box_mid();
        let accumulating = snap.vol_ma3 > snap.vol_ma10;
        let long_trend = snap.price > snap.sma60;
        let not_broken_out = snap.pct_change < self.config.pct_cap;

        tight && upper_half && accumulating && long_trend && not_broken_out
    }
}

impl Strategy for ConsolidationSetup {
    fn name(&self) -> &str {
        "consolidation"
    }

    fn evaluate(&self, snap: &Snapshot, display_name: &str) -> Option<Candidate> {
        if !self.accepts(snap) {
            return None;
        }

        let stage = if snap.oscillator.golden_cross_latest() {
            BoxStage::ReadyToBreak
        } else {
            BoxStage::RangeBound
        };

        Some(Candidate {
            symbol: snap.symbol.clone(),
            name: display_name.to_string(),
            price: snap.price,
            pct_change: snap.pct_change,
            signal: snap.signal,
            support: snap.levels.support,
            resistance: snap.levels.resistance,
            setup: Setup::Consolidation {
                box_high: snap.box_high,
                box_low: snap.box_low,
                box_width: snap.box_width(),
                volume_ratio: snap.vol_ma3 / snap.vol_ma10,
                stage,
            },
        })
    }
}
