//! Stochastic oscillator (KD) with recursive smoothing.
//!
//! RSV_i = (close_i - lowest low_n) / (highest high_n - lowest low_n) * 100
//!
//! %K and %D are smoothed with fixed 2/3 : 1/3 weights, seeded at 50:
//!
//! ```text
//! K_0 = D_0 = 50
//! K_i = 2/3 * K_{i-1} + 1/3 * RSV_i
//! D_i = 2/3 * D_{i-1} + 1/3 * K_i
//! ```
//!
//! The recursion is sequential in the time index; each term depends on its
//! predecessor.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// Neutral value used for the seed and for undefined RSV.
pub const NEUTRAL: f64 = 50.0;

/// Default RSV window.
pub const DEFAULT_PERIOD: usize = 9;

const PRIOR_WEIGHT: f64 = 2.0 / 3.0;
const NEW_WEIGHT: f64 = 1.0 / 3.0;

/// Raw stochastic value for every bar.
///
/// Indices before the first full window, and windows whose high equals their
/// low, yield [`NEUTRAL`].
pub fn raw_stochastic(bars: &[Bar], period: usize) -> Vec<f64> {
    let n = bars.len();
    let mut rsv = vec![NEUTRAL; n];

    if period == 0 || n < period {
        return rsv;
    }

    for i in (period - 1)..n {
        let window = &bars[i + 1 - period..=i];
        let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let highest = window
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let range = highest - lowest;

        if range > 0.0 {
            rsv[i] = (bars[i].close - lowest) / range * 100.0;
        }
    }

    rsv
}

/// Smooth an RSV series into %K / %D.
pub fn smooth(rsv: &[f64]) -> OscillatorSeries {
    let n = rsv.len();
    let mut k = Vec::with_capacity(n);
    let mut d = Vec::with_capacity(n);

    if n == 0 {
        return OscillatorSeries { k, d };
    }

    k.push(NEUTRAL);
    d.push(NEUTRAL);

    for &value in &rsv[1..] {
        let prev_k = k[k.len() - 1];
        let prev_d = d[d.len() - 1];
        // Rounding can drift a hair past the bounds when every input sits on them.
        let next_k = (PRIOR_WEIGHT * prev_k + NEW_WEIGHT * value).clamp(0.0, 100.0);
        let next_d = (PRIOR_WEIGHT * prev_d + NEW_WEIGHT * next_k).clamp(0.0, 100.0);
        k.push(next_k);
        d.push(next_d);
    }

    OscillatorSeries { k, d }
}

/// Stochastic oscillator with a configurable RSV window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stochastic {
    period: usize,
}

impl Stochastic {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "stochastic period must be >= 1");
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn compute(&self, bars: &[Bar]) -> OscillatorSeries {
        smooth(&raw_stochastic(bars, self.period))
    }
}

impl Default for Stochastic {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

/// Parallel %K / %D series, indexed like the bars they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorSeries {
    k: Vec<f64>,
    d: Vec<f64>,
}

impl OscillatorSeries {
    /// Assemble a series from precomputed lines of equal length.
    pub fn from_parts(k: Vec<f64>, d: Vec<f64>) -> Self {
        assert_eq!(k.len(), d.len(), "%K and %D must have equal length");
        Self { k, d }
    }

    pub fn k(&self) -> &[f64] {
        &self.k
    }

    pub fn d(&self) -> &[f64] {
        &self.d
    }

    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    /// (%K, %D) `back` bars before the latest; `back = 0` is the latest point.
    pub fn point_back(&self, back: usize) -> Option<(f64, f64)> {
        let idx = self.k.len().checked_sub(back + 1)?;
        Some((self.k[idx], self.d[idx]))
    }

    /// True when %K crossed above %D on the latest bar.
    pub fn golden_cross_latest(&self) -> bool {
        match (self.point_back(0), self.point_back(1)) {
            (Some((k_now, d_now)), Some((k_prev, d_prev))) => k_now > d_now && k_prev < d_prev,
            _ => false,
        }
    }
}
