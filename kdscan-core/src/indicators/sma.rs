//! Simple Moving Average (SMA) of close.
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::{check_window, Indicator, IndicatorError};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(bars, self.period, |bar| bar.close)
    }
}

/// Mean close over the trailing `window` bars ending at the latest bar.
pub fn sma_latest(bars: &[Bar], window: usize) -> Result<f64, IndicatorError> {
    check_window(window, bars.len())?;
    let tail = &bars[bars.len() - window..];
    Ok(tail.iter().map(|b| b.close).sum::<f64>() / window as f64)
}

/// Rolling mean of an extracted field, NaN during warmup.
pub(crate) fn rolling_mean(bars: &[Bar], period: usize, field: impl Fn(&Bar) -> f64) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = bars.iter().take(period).map(&field).sum();
    result[period - 1] = sum / period as f64;

    // Roll the window forward
    for i in period..n {
        sum += field(&bars[i]) - field(&bars[i - period]);
        result[i] = sum / period as f64;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&bars);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_latest_matches_series_tail() {
        let closes: Vec<f64> = (0..70).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let bars = make_bars(&closes);
        for window in [5, 10, 20, 60] {
            let series = Sma::new(window).compute(&bars);
            let point = sma_latest(&bars, window).unwrap();
            assert_approx(point, series[series.len() - 1], 1e-9);
        }
    }

    #[test]
    fn sma_latest_rejects_long_window() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert_eq!(
            sma_latest(&bars, 5),
            Err(IndicatorError::WindowTooLong { window: 5, len: 3 })
        );
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(20).lookback(), 19);
        assert_eq!(Sma::new(1).lookback(), 0);
        assert_eq!(Sma::new(60).name(), "sma_60");
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let result = Sma::new(5).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
