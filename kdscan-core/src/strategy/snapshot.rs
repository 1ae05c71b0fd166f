//! Snapshot: every derived value a strategy reads, as of the latest bar.
//!
//! Computed once per symbol so both rule sets see identical inputs.

use crate::candle::is_solid;
use crate::classifier::{bias_pct, classify, SignalState};
use crate::domain::{BarSeries, MIN_BARS};
use crate::indicators::{sma_latest, volume_ma_latest, OscillatorSeries, Stochastic};
use crate::levels::LevelSet;
use serde::{Serialize, Serializer};

use super::{EvalError, StrategyConfig};

/// Trailing bars that define the consolidation box.
pub const BOX_BARS: usize = 10;

/// Derived, per-symbol state for the latest bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub symbol: String,
    pub price: f64,
    pub prev_close: f64,
    pub pct_change: f64,
    pub volume: f64,
    pub sma5: f64,
    pub sma10: f64,
    pub sma20: f64,
    pub sma60: f64,
    pub vol_ma3: f64,
    pub vol_ma5: f64,
    pub vol_ma10: f64,
    /// Percent deviation of price from the 20-day average.
    pub bias: f64,
    pub box_high: f64,
    pub box_low: f64,
    pub levels: LevelSet,
    pub candle_solid: bool,
    pub signal: SignalState,
    /// Serialized as the latest `[k, d]` pair.
    #[serde(rename = "kd", serialize_with = "latest_kd")]
    pub oscillator: OscillatorSeries,
}

fn latest_kd<S: Serializer>(oscillator: &OscillatorSeries, serializer: S) -> Result<S::Ok, S::Error> {
    oscillator.point_back(0).serialize(serializer)
}

impl Snapshot {
    pub fn compute(series: &BarSeries, config: &StrategyConfig) -> Result<Self, EvalError> {
        if !series.has_full_history() {
            return Err(EvalError::InsufficientHistory {
                have: series.len(),
                needed: MIN_BARS,
            });
        }

        let bars = series.bars();
        let latest = series.latest();
        let prev_close = series
            .previous()
            .map(|b| b.close)
            .ok_or(EvalError::InsufficientHistory {
                have: series.len(),
                needed: MIN_BARS,
            })?;
        let price = latest.close;

        let sma20 = sma_latest(bars, 20)?;
        let bias = bias_pct(price, sma20);

        let oscillator = Stochastic::new(config.oscillator_period.max(1)).compute(bars);
        let signal = classify(&oscillator, bias, &config.classifier)?;

        let window = series.tail(BOX_BARS);
        let box_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let box_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

        Ok(Self {
            symbol: series.symbol().to_string(),
            price,
            prev_close,
            pct_change: (price - prev_close) / prev_close * 100.0,
            volume: latest.volume as f64,
            sma5: sma_latest(bars, 5)?,
            sma10: sma_latest(bars, 10)?,
            sma20,
            sma60: sma_latest(bars, 60)?,
            vol_ma3: volume_ma_latest(bars, 3)?,
            vol_ma5: volume_ma_latest(bars, 5)?,
            vol_ma10: volume_ma_latest(bars, 10)?,
            bias,
            box_high,
            box_low,
            levels: LevelSet::find(price, bars)?,
            candle_solid: is_solid(latest, config.candle.ratio()),
            signal,
            oscillator,
        })
    }

    /// Latest (%K, %D).
    pub fn kd(&self) -> (f64, f64) {
        self.oscillator.point_back(0).unwrap_or((f64::NAN, f64::NAN))
    }

    /// Box width relative to its low.
    pub fn box_width(&self) -> f64 {
        (self.box_high - self.box_low) / self.box_low
    }

    pub fn box_mid(&self) -> f64 {
        (self.box_high + self.box_low) / 2.0
    }
}

/// Neutral snapshot for strategy unit tests; tests overwrite the fields they probe.
#[cfg(test)]
pub(crate) fn fixture() -> Snapshot {
    use crate::levels::{ResistanceLevel, ResistanceNote, SupportLevel, SupportSource};

    Snapshot {
        symbol: "TEST".to_string(),
        price: 100.0,
        prev_close: 100.0,
        pct_change: 0.0,
        volume: 1000.0,
        sma5: 100.0,
        sma10: 100.0,
        sma20: 100.0,
        sma60: 100.0,
        vol_ma3: 1000.0,
        vol_ma5: 1000.0,
        vol_ma10: 1000.0,
        bias: 0.0,
        box_high: 100.0,
        box_low: 100.0,
        levels: LevelSet {
            support: SupportLevel {
                source: SupportSource::MovingAverage(20),
                price: 98.0,
            },
            resistance: ResistanceLevel {
                note: ResistanceNote::VolumePressure,
                price: 110.0,
            },
        },
        candle_solid: false,
        signal: SignalState::Neutral,
        oscillator: OscillatorSeries::from_parts(vec![50.0; 3], vec![50.0; 3]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_carries_latest_kd_and_machine_names() {
        let mut snap = fixture();
        snap.oscillator = OscillatorSeries::from_parts(vec![40.0, 85.0], vec![45.0, 70.0]);
        snap.signal = SignalState::StrongPassivation;

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["kd"], serde_json::json!([85.0, 70.0]));
        assert_eq!(json["signal"], "strong_passivation");
        assert_eq!(json["levels"]["resistance"]["note"], "volume_pressure");
        assert_eq!(
            json["levels"]["support"]["source"],
            serde_json::json!({ "moving_average": 20 })
        );
    }
}
