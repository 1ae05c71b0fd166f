//! Trend Attack: momentum breakout in an aligned uptrend.
//!
//! Accepts when:
//! - price > SMA20 > SMA60
//! - percent change above `up_threshold`
//! - the latest candle is solid
//! - volume above `spike_factor` x the 5-day volume average, or the
//!   oscillator is in strong passivation

use crate::classifier::SignalState;
use crate::domain::{Candidate, Setup};
use serde::{Deserialize, Serialize};

use super::{Snapshot, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendAttackConfig {
    /// Minimum daily percent change.
    pub up_threshold: f64,
    /// Volume multiple of the 5-day average that counts as a spike.
    pub spike_factor: f64,
}

impl Default for TrendAttackConfig {
    fn default() -> Self {
        Self {
            up_threshold: 1.0,
            spike_factor: 1.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendAttack {
    config: TrendAttackConfig,
}

impl TrendAttack {
    pub fn new(config: TrendAttackConfig) -> Self {
        Self { config }
    }

    pub fn accepts(&self, snap: &Snapshot) -> bool {
        let aligned = snap.price > snap.sma20 && snap.sma20 > snap.sma60;
        let rising = snap.pct_change > self.config.up_threshold;
        let spike = snap.volume > snap.vol_ma5 * self.config.spike_factor;
        let passivated = snap.signal == SignalState::StrongPassivation;

        aligned && rising && snap.candle_solid && (spike || passivated)
    }
}

impl Strategy for TrendAttack {
    fn name(&self) -> &str {
        "trend_attack"
    }

    fn evaluate(&self, snap: &Snapshot, display_name: &str) -> Option<Candidate> {
        if !self.accepts(snap) {
            return None;
        }

        let volume_ratio = if snap.vol_ma5 > 0.0 {
            snap.volume / snap.vol_ma5
        } else {
            0.0
        };

        Some(Candidate {
            symbol: snap.symbol.clone(),
            name: display_name.to_string(),
            price: snap.price,
            pct_change: snap.pct_change,
            signal: snap.signal,
            support: snap.levels.support,
            resistance: snap.levels.resistance,
            setup: Setup::TrendAttack { volume_ratio },
        })
    }
}
