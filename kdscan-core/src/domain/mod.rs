//! Domain types for kdscan

pub mod bar;
pub mod candidate;
pub mod series;

pub use bar::Bar;
pub use candidate::{BoxStage, Candidate, Setup};
pub use series::{BarSeries, SeriesError, MIN_BARS};
