//! kdscan core: the signal classification engine.
//!
//! This crate contains the pure, I/O-free part of the screener:
//! - Domain types (bars, validated bar series, candidates)
//! - Indicator engine (stochastic %K/%D with recursive smoothing, SMAs)
//! - Level finder (dynamic support, volume-weighted resistance)
//! - Candle filter (rejects long-upper-shadow bars)
//! - Signal classifier (priority chain with passivation/overheat overrides)
//! - Strategy evaluation (Trend Attack, Consolidation Setup)
//! - Ranking and report rendering
//!
//! Every derived value is a function of one symbol's bars and the
//! configuration; nothing here holds state across symbols.

pub mod candle;
pub mod classifier;
pub mod domain;
pub mod indicators;
pub mod levels;
pub mod report;
pub mod strategy;

pub use classifier::{classify, ClassifierThresholds, SignalState};
pub use domain::{Bar, BarSeries, BoxStage, Candidate, SeriesError, Setup, MIN_BARS};
pub use levels::{LevelSet, ResistanceNote, SupportSource};
pub use report::Report;
pub use strategy::{EvalError, Evaluator, Snapshot, Strategy, StrategyConfig, Verdict};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: domain and engine types are Send + Sync, so a
    /// concurrent fetch layer can move them between threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Bar>();
        require_sync::<Bar>();
        require_send::<BarSeries>();
        require_sync::<BarSeries>();
        require_send::<Candidate>();
        require_sync::<Candidate>();
        require_send::<Snapshot>();
        require_sync::<Snapshot>();
        require_send::<Report>();
        require_sync::<Report>();
        require_send::<Evaluator>();
        require_sync::<Evaluator>();
        require_send::<StrategyConfig>();
        require_sync::<StrategyConfig>();
        require_send::<indicators::OscillatorSeries>();
        require_sync::<indicators::OscillatorSeries>();
    }

    /// Architecture contract: strategies only see one symbol's snapshot.
    #[test]
    fn strategy_trait_takes_a_single_snapshot() {
        fn _check_trait_object_builds(
            strategy: &dyn Strategy,
            snapshot: &Snapshot,
        ) -> Option<Candidate> {
            strategy.evaluate(snapshot, "name")
        }
    }

    #[test]
    fn default_config_is_sane() {
        let config = StrategyConfig::default();
        assert_eq!(config.oscillator_period, 9);
        assert_eq!(config.trend_attack.spike_factor, 1.3);
        assert_eq!(config.consolidation.pct_cap, 4.0);
        assert_eq!(config.candle.ratio(), 2.0);
    }
}
