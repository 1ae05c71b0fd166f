//! Level finder: dynamic support and volume-weighted resistance.
//!
//! Support is the tightest moving average still under price, falling back to
//! the window's lowest low once price has broken under every average.
//! Resistance is the high of the heaviest-volume bar, re-anchored to the
//! window's highest high once price trades through it.

use crate::domain::Bar;
use crate::indicators::{sma_latest, IndicatorError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Moving-average windows probed for support, shortest first.
pub const SUPPORT_WINDOWS: [usize; 4] = [5, 10, 20, 60];

/// Where the support level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportSource {
    /// A moving average of the given window.
    MovingAverage(usize),
    /// Lowest low of the whole retrieved window.
    PriorLow,
}

impl fmt::Display for SupportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportSource::MovingAverage(window) => write!(f, "{window}MA"),
            SupportSource::PriorLow => f.write_str("prior-low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportLevel {
    pub source: SupportSource,
    pub price: f64,
}

/// How the resistance level was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResistanceNote {
    /// High of the maximum-volume bar.
    VolumePressure,
    /// Price broke the volume level; resistance is the window's highest high.
    NewHigh,
}

impl fmt::Display for ResistanceNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResistanceNote::VolumePressure => f.write_str("volume-pressure"),
            ResistanceNote::NewHigh => f.write_str("new-high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistanceLevel {
    pub note: ResistanceNote,
    pub price: f64,
}

/// Support and resistance as of the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    pub support: SupportLevel,
    pub resistance: ResistanceLevel,
}

impl LevelSet {
    pub fn find(price: f64, bars: &[Bar]) -> Result<Self, IndicatorError> {
        Ok(Self {
            support: find_support(price, bars)?,
            resistance: find_resistance(price, bars)?,
        })
    }
}

/// Highest moving average strictly below `price`, else the window's lowest low.
///
/// Equal averages resolve to the shortest window.
pub fn find_support(price: f64, bars: &[Bar]) -> Result<SupportLevel, IndicatorError> {
    let mut best: Option<SupportLevel> = None;

    for window in SUPPORT_WINDOWS {
        let ma = sma_latest(bars, window)?;
        if ma >= price {
            continue;
        }
        if best.map_or(true, |b| ma > b.price) {
            best = Some(SupportLevel {
                source: SupportSource::MovingAverage(window),
                price: ma,
            });
        }
    }

    if let Some(level) = best {
        return Ok(level);
    }

    let prior_low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    Ok(SupportLevel {
        source: SupportSource::PriorLow,
        price: prior_low,
    })
}

/// High of the heaviest-volume bar, or the highest high once price clears it.
///
/// On equal volumes the earliest bar wins.
pub fn find_resistance(price: f64, bars: &[Bar]) -> Result<ResistanceLevel, IndicatorError> {
    let heaviest = bars
        .iter()
        .reduce(|best, bar| if bar.volume > best.volume { bar } else { best })
        .ok_or(IndicatorError::EmptySeries)?;

    if price > heaviest.high {
        let highest = bars
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        return Ok(ResistanceLevel {
            note: ResistanceNote::NewHigh,
            price: highest,
        });
    }

    Ok(ResistanceLevel {
        note: ResistanceNote::VolumePressure,
        price: heaviest.high,
    })
}
