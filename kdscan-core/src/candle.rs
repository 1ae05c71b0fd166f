//! Candle filter: rejects long-upper-shadow "false breakout" bars.
//!
//! A bar is solid when it closed above its open and the upper shadow is no
//! longer than `ratio` times the body.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// Named shadow-to-body ratio presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleStrictness {
    Strict,
    Normal,
    #[default]
    Lenient,
    /// Explicit shadow-to-body ratio.
    Ratio(f64),
}

impl CandleStrictness {
    pub fn ratio(&self) -> f64 {
        match self {
            CandleStrictness::Strict => 1.2,
            CandleStrictness::Normal => 1.5,
            CandleStrictness::Lenient => 2.0,
            CandleStrictness::Ratio(r) => *r,
        }
    }
}

/// True when `bar` is a bullish candle whose upper shadow is at most
/// `ratio` times its body.
pub fn is_solid(bar: &Bar, ratio: f64) -> bool {
    if bar.close <= bar.open {
        return false;
    }
    bar.upper_shadow() <= bar.body() * ratio
}
