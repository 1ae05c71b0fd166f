//! Ranking and report rendering.
//!
//! Each strategy's list is sorted descending by its own key (percent change
//! for Trend Attack, 3/10 volume ratio for Consolidation), stably, so ties
//! keep the symbol iteration order. Lists are truncated to top-N and rendered
//! into one plain-text message.

use crate::domain::{Candidate, Setup};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const HEADER: &str = "[kdscan daily scan]";
pub const RULE: &str = "================";
pub const SEPARATOR: &str = "----------------";
pub const NO_SIGNALS: &str = "No qualifying symbols today. Stay on the sidelines.";
pub const EMPTY_SECTION: &str = "No qualifying symbols.";
pub const DISCLAIMER: &str = "(KD passivation + bias screen; not investment advice)";

/// Default number of candidates kept per strategy.
pub const DEFAULT_TOP_N: usize = 10;

/// Sort descending by [`Candidate::rank_key`] (stable) and keep the first `top_n`.
///
/// Keys are compared unrounded, so candidates that render the same percent
/// change or volume ratio can still be reordered by the digits not shown.
pub fn rank(mut candidates: Vec<Candidate>, top_n: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.rank_key().total_cmp(&a.rank_key()));
    candidates.truncate(top_n);
    candidates
}

/// The composite message for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub top_n: usize,
    /// Accepted counts before truncation.
    pub trend_attack_total: usize,
    pub consolidation_total: usize,
    pub trend_attack: Vec<Candidate>,
    pub consolidation: Vec<Candidate>,
}

impl Report {
    pub fn build(trend_attack: Vec<Candidate>, consolidation: Vec<Candidate>, top_n: usize) -> Self {
        Self {
            top_n,
            trend_attack_total: trend_attack.len(),
            consolidation_total: consolidation.len(),
            trend_attack: rank(trend_attack, top_n),
            consolidation: rank(consolidation, top_n),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trend_attack.is_empty() && self.consolidation.is_empty()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER}")?;
        writeln!(
            f,
            "Trend-Attack: {} | Consolidation: {}",
            self.trend_attack_total, self.consolidation_total
        )?;
        writeln!(f, "{RULE}")?;

        if self.is_empty() {
            writeln!(f, "{NO_SIGNALS}")?;
        } else {
            writeln!(f, "Trend-Attack (top {}):", self.top_n)?;
            write_section(f, &self.trend_attack)?;
            writeln!(f)?;
            writeln!(f, "Consolidation (top {}):", self.top_n)?;
            write_section(f, &self.consolidation)?;
        }

        write!(f, "{DISCLAIMER}")
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, candidates: &[Candidate]) -> fmt::Result {
    if candidates.is_empty() {
        return writeln!(f, "{EMPTY_SECTION}");
    }
    for candidate in candidates {
        f.write_str(&candidate_block(candidate))?;
        writeln!(f, "{SEPARATOR}")?;
    }
    Ok(())
}

/// Lines describing one candidate, without the trailing separator.
pub fn candidate_block(c: &Candidate) -> String {
    match c.setup {
        Setup::TrendAttack { .. } => format!(
            "{} {} {}\nPrice {:.1} ({:+.2}%)\nSupport {:.1} ({}) / Resistance {:.1} ({})\n",
            c.symbol,
            c.name,
            c.signal,
            c.price,
            c.pct_change,
            c.support.price,
            c.support.source,
            c.resistance.price,
            c.resistance.note,
        ),
        Setup::Consolidation {
            box_high,
            box_low,
            volume_ratio,
            stage,
            ..
        } => format!(
            "{} {} {}\nPrice {:.1} ({})\nBox {:.1}~{:.1} | Vol ratio {:.2}\n",
            c.symbol, c.name, stage, c.price, c.signal, box_low, box_high, volume_ratio,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SignalState;
    use crate::domain::BoxStage;
    use crate::levels::{ResistanceLevel, ResistanceNote, SupportLevel, SupportSource};

    fn trend(symbol: &str, pct: f64) -> Candidate {
        Candidate {
            symbol: symbol.to_string(),
            name: format!("{symbol} Corp"),
            price: 103.04,
            pct_change: pct,
            signal: SignalState::BullishContinuation,
            support: SupportLevel {
                source: SupportSource::MovingAverage(20),
                price: 101.23,
            },
            resistance: ResistanceLevel {
                note: ResistanceNote::VolumePressure,
                price: 105.0,
            },
            setup: Setup::TrendAttack { volume_ratio: 2.0 },
        }
    }

    fn boxed(symbol: &str, ratio: f64) -> Candidate {
        Candidate {
            setup: Setup::Consolidation {
                box_high: 105.0,
                box_low: 100.0,
                box_width: 0.05,
                volume_ratio: ratio,
                stage: BoxStage::RangeBound,
            },
            price: 104.0,
            pct_change: 1.0,
            signal: SignalState::Neutral,
            ..trend(symbol, 1.0)
        }
    }

    #[test]
    fn rank_sorts_descending_and_truncates() {
        let ranked = rank(vec![trend("A", 1.5), trend("B", 4.0), trend("C", 2.5)], 2);
        let order: Vec<&str> = ranked.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(order, vec!["B", "C"]);
    }

    #[test]
    fn rank_is_stable_on_ties() {
        let ranked = rank(vec![boxed("A", 1.2), boxed("B", 1.5), boxed("C", 1.2)], 10);
        let order: Vec<&str> = ranked.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn rank_uses_unrounded_keys() {
        // Both render as "+2.00%"; the larger raw change still ranks first.
        let ranked = rank(vec![trend("A", 2.001), trend("B", 2.004)], 10);
        let order: Vec<&str> = ranked.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
    }

    #[test]
    fn empty_report_says_so() {
        let report = Report::build(vec![], vec![], 10);
        let expected = format!(
            "{HEADER}\nTrend-Attack: 0 | Consolidation: 0\n{RULE}\n{NO_SIGNALS}\n{DISCLAIMER}"
        );
        assert_eq!(report.render(), expected);
    }

    #[test]
    fn full_report_layout() {
        let report = Report::build(vec![trend("2330", 3.0)], vec![boxed("2317", 1.2)], 10);
        let expected = "\
[kdscan daily scan]
Trend-Attack: 1 | Consolidation: 1
================
Trend-Attack (top 10):
2330 2330 Corp Bullish continuation
Price 103.0 (+3.00%)
Support 101.2 (20MA) / Resistance 105.0 (volume-pressure)
----------------

Consolidation (top 10):
2317 2317 Corp range-bound
Price 104.0 (Neutral range)
Box 100.0~105.0 | Vol ratio 1.20
----------------
(KD passivation + bias screen; not investment advice)";
        assert_eq!(report.render(), expected);
    }

    #[test]
    fn one_empty_list_gets_explicit_line() {
        let report = Report::build(vec![], vec![boxed("2317", 1.2)], 10);
        let text = report.render();
        assert!(text.contains("Trend-Attack (top 10):\nNo qualifying symbols.\n"));
        assert!(text.contains("2317 2317 Corp range-bound"));
    }

    #[test]
    fn json_form_reads_back() {
        let report = Report::build(vec![trend("2330", 3.0)], vec![boxed("2317", 1.2)], 10);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""strategy":"consolidation""#));
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert_eq!(back.render(), report.render());
    }

    #[test]
    fn header_counts_are_pre_truncation() {
        let report = Report::build(
            vec![trend("A", 1.5), trend("B", 2.0), trend("C", 3.0)],
            vec![],
            1,
        );
        assert_eq!(report.trend_attack.len(), 1);
        assert!(report.render().contains("Trend-Attack: 3 | Consolidation: 0"));
    }
}
