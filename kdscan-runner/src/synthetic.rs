//! Synthetic data provider for offline dry runs.
//!
//! Produces a random walk per symbol, seeded from the BLAKE3 hash of the code,
//! so the same code always yields the same bars for the same end date. These
//! bars are clearly fake; they exist to exercise the pipeline without network.

use crate::provider::{DataError, DataProvider, Lookback};
use chrono::{Datelike, NaiveDate, Weekday};
use kdscan_core::Bar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic random-walk provider.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    end: NaiveDate,
}

impl SyntheticProvider {
    /// Bars end on `end` (inclusive).
    pub fn new(end: NaiveDate) -> Self {
        Self { end }
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<Vec<Bar>, DataError> {
        if symbol.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(generate_synthetic_bars(
            symbol,
            lookback.start_from(self.end),
            self.end,
        ))
    }
}

/// Random walk over weekdays in `[start, end]`.
///
/// Every few weeks the walk gets a volume spike so both rule sets have
/// something to find.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    let seed = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price: f64 = rng.gen_range(20.0..600.0);
    let drift: f64 = rng.gen_range(-0.002..0.004);
    let base_volume: u64 = rng.gen_range(200_000..20_000_000);
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = drift + rng.gen_range(-0.03..0.03);
        let open = price * (1.0 + rng.gen_range(-0.005..0.005));
        let close = (price * (1.0 + daily_return)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.015));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.015));

        let spike = if rng.gen_bool(0.05) {
            rng.gen_range(2.0..4.0)
        } else {
            rng.gen_range(0.6..1.4)
        };
        let volume = (base_volume as f64 * spike) as u64;

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
