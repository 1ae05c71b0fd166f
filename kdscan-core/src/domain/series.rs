//! BarSeries: a validated, date-ordered bar history for one symbol.

use super::bar::Bar;
use chrono::NaiveDate;
use thiserror::Error;

/// Minimum number of bars needed for a full evaluation (60-day average).
pub const MIN_BARS: usize = 60;

/// Reasons a raw bar vector cannot become a [`BarSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("bars for '{symbol}' out of order at {date} (previous {previous})")]
    OutOfOrder {
        symbol: String,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("duplicate bar for '{symbol}' on {date}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("malformed bar for '{symbol}' on {date}")]
    MalformedBar { symbol: String, date: NaiveDate },
}

/// Ordered daily bars for a single symbol.
///
/// Dates are strictly ascending and every bar passes [`Bar::is_sane`].
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty { symbol });
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(SeriesError::MalformedBar {
                    symbol,
                    date: bar.date,
                });
            }
            if i > 0 {
                let previous = bars[i - 1].date;
                if bar.date == previous {
                    return Err(SeriesError::DuplicateDate {
                        symbol,
                        date: bar.date,
                    });
                }
                if bar.date < previous {
                    return Err(SeriesError::OutOfOrder {
                        symbol,
                        date: bar.date,
                        previous,
                    });
                }
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The most recent bar. Construction guarantees at least one.
    pub fn latest(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    /// The bar before the latest one, if any.
    pub fn previous(&self) -> Option<&Bar> {
        self.bars.len().checked_sub(2).map(|i| &self.bars[i])
    }

    /// Trailing `n` bars ending at the latest (fewer if the series is shorter).
    pub fn tail(&self, n: usize) -> &[Bar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }

    /// True when the series is long enough for a full evaluation.
    pub fn has_full_history(&self) -> bool {
        self.bars.len() >= MIN_BARS
    }
}
