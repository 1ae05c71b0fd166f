//! Volume moving average.

use super::sma::rolling_mean;
use super::{check_window, Indicator, IndicatorError};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct VolumeSma {
    period: usize,
    name: String,
}

impl VolumeSma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume MA period must be >= 1");
        Self {
            period,
            name: format!("vol_ma_{period}"),
        }
    }
}

impl Indicator for VolumeSma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(bars, self.period, |bar| bar.volume as f64)
    }
}

/// Mean volume over the trailing `window` bars ending at the latest bar.
pub fn volume_ma_latest(bars: &[Bar], window: usize) -> Result<f64, IndicatorError> {
    check_window(window, bars.len())?;
    let tail = &bars[bars.len() - window..];
    Ok(tail.iter().map(|b| b.volume as f64).sum::<f64>() / window as f64)
}
