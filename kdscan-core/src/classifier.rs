//! Signal classifier: maps the oscillator tail and price bias to a label.
//!
//! Priority chain, first match wins:
//!
//! 1. `StrongPassivation`: %K above the passivation level for the last
//!    `passivation_bars` bars.
//! 2. `OverheatWarning`: bias from the 20-day average above `overheat_bias`.
//! 3. `GoldenCrossLow`: %K crossed above %D on the latest bar while in the
//!    lower half.
//! 4. `BullishContinuation`: %K above %D and below the continuation ceiling.
//! 5. `DeathCrossHigh`: %K below %D at an elevated level.
//! 6. `Neutral`.
//!
//! Passivation and overheat override every crossover state.

use crate::indicators::{IndicatorError, OscillatorSeries};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete signal label for the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalState {
    StrongPassivation,
    OverheatWarning,
    GoldenCrossLow,
    BullishContinuation,
    DeathCrossHigh,
    Neutral,
}

impl SignalState {
    /// Stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::StrongPassivation => "strong_passivation",
            SignalState::OverheatWarning => "overheat_warning",
            SignalState::GoldenCrossLow => "golden_cross_low",
            SignalState::BullishContinuation => "bullish_continuation",
            SignalState::DeathCrossHigh => "death_cross_high",
            SignalState::Neutral => "neutral",
        }
    }

    /// Label shown in the report.
    pub fn label(&self) -> &'static str {
        match self {
            SignalState::StrongPassivation => "Strong passivation (running hot)",
            SignalState::OverheatWarning => "Overheat warning (bias too wide)",
            SignalState::GoldenCrossLow => "Low golden cross (buy)",
            SignalState::BullishContinuation => "Bullish continuation",
            SignalState::DeathCrossHigh => "High death cross (sell)",
            SignalState::Neutral => "Neutral range",
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Oscillator and bias levels used by the priority chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// %K level that counts as extreme overbought.
    pub passivation_k: f64,
    /// Consecutive bars above `passivation_k` needed for passivation.
    pub passivation_bars: usize,
    /// Bias (percent from SMA20) above which the state is an overheat warning.
    pub overheat_bias: f64,
    /// A golden cross only counts as "low" while %K is below this.
    pub golden_cross_ceiling: f64,
    /// Bullish continuation requires %K below this.
    pub continuation_ceiling: f64,
    /// Death cross requires %K above this.
    pub death_cross_floor: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            passivation_k: 80.0,
            passivation_bars: 3,
            overheat_bias: 20.0,
            golden_cross_ceiling: 50.0,
            continuation_ceiling: 80.0,
            death_cross_floor: 70.0,
        }
    }
}

/// Percentage deviation of `price` from `average`.
pub fn bias_pct(price: f64, average: f64) -> f64 {
    (price - average) / average * 100.0
}

/// Classify the latest oscillator state.
pub fn classify(
    osc: &OscillatorSeries,
    bias: f64,
    thresholds: &ClassifierThresholds,
) -> Result<SignalState, IndicatorError> {
    let needed = thresholds.passivation_bars.max(2);
    if osc.len() < needed {
        return Err(IndicatorError::NotEnoughPoints {
            needed,
            have: osc.len(),
        });
    }

    let k = osc.k();
    let d = osc.d();
    let t = k.len() - 1;
    let (k_now, d_now) = (k[t], d[t]);
    let (k_prev, d_prev) = (k[t - 1], d[t - 1]);

    let hot_window = thresholds.passivation_bars;
    let passivated = hot_window > 0
        && k[k.len() - hot_window..]
            .iter()
            .all(|&v| v > thresholds.passivation_k);
    if passivated {
        return Ok(SignalState::StrongPassivation);
    }

    if bias > thresholds.overheat_bias {
        return Ok(SignalState::OverheatWarning);
    }

    if k_now > d_now && k_now < thresholds.golden_cross_ceiling && k_prev < d_prev {
        return Ok(SignalState::GoldenCrossLow);
    }

    if k_now > d_now && k_now < thresholds.continuation_ceiling {
        return Ok(SignalState::BullishContinuation);
    }

    if k_now < d_now && k_now > thresholds.death_cross_floor {
        return Ok(SignalState::DeathCrossHigh);
    }

    Ok(SignalState::Neutral)
}
