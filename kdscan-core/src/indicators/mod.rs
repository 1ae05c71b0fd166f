//! Indicator engine.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! Series-valued indicators implement [`Indicator`]; the screen itself mostly
//! needs point values "as of the latest bar", exposed as free functions
//! (`sma_latest`, `volume_ma_latest`).
//!
//! The stochastic oscillator is special: its smoothing is recursive, so the
//! whole series is always computed in index order (see [`stochastic`]).

pub mod sma;
pub mod stochastic;
pub mod volume;

pub use sma::{sma_latest, Sma};
pub use stochastic::{raw_stochastic, smooth, OscillatorSeries, Stochastic};
pub use volume::{volume_ma_latest, VolumeSma};

use crate::domain::Bar;
use thiserror::Error;

/// Trait for series indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "vol_ma_5").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Errors from point-value indicator computations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("bar series is empty")]
    EmptySeries,

    #[error("window must be >= 1")]
    ZeroWindow,

    #[error("window of {window} bars exceeds series length {len}")]
    WindowTooLong { window: usize, len: usize },

    #[error("need at least {needed} oscillator points, have {have}")]
    NotEnoughPoints { needed: usize, have: usize },
}

/// Checks that a trailing window of `window` bars exists in a series of `len`.
pub(crate) fn check_window(window: usize, len: usize) -> Result<(), IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::ZeroWindow);
    }
    if window > len {
        return Err(IndicatorError::WindowTooLong { window, len });
    }
    Ok(())
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_checks() {
        assert_eq!(check_window(0, 10), Err(IndicatorError::ZeroWindow));
        assert_eq!(
            check_window(11, 10),
            Err(IndicatorError::WindowTooLong { window: 11, len: 10 })
        );
        assert!(check_window(10, 10).is_ok());
    }
}
