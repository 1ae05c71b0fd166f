//! Integration tests for the scan loop.
//!
//! A scripted provider stands in for the chart API and a recording notifier
//! captures the delivered text, so every run is offline and deterministic.

use chrono::NaiveDate;
use kdscan_core::report::NO_SIGNALS;
use kdscan_core::{Bar, SignalState};
use kdscan_runner::{
    DataError, DataProvider, Lookback, Notifier, NotifyError, ScanConfig, Scanner, Universe,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

// ── Fixtures ─────────────────────────────────────────────────────────

fn bar(i: usize, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Bar {
    Bar {
        date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Duration::days(i as i64),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// Steady climb, then a 3% bullish day on ten times the volume.
fn breakout_bars() -> Vec<Bar> {
    let mut bars: Vec<Bar> = (0..64)
        .map(|i| {
            let close = 90.0 + 0.2 * i as f64;
            let open = close - 0.5;
            bar(i, open, close + 0.5, open - 0.5, close, 1000)
        })
        .collect();
    bars.push(bar(64, 103.0, 106.0, 102.5, 105.678, 10_000));
    bars
}

/// Ten quiet sessions in a 100~105 box with volume building at the end.
fn box_bars() -> Vec<Bar> {
    let mut bars: Vec<Bar> = (0..50).map(|i| bar(i, 94.5, 95.5, 94.0, 95.0, 100)).collect();
    let mut prev = 95.0;
    for close in [96.4, 97.8, 99.2, 100.6, 102.0] {
        bars.push(bar(bars.len(), prev, close + 0.5, prev - 0.5, close, 100));
        prev = close;
    }
    let volumes = [91, 91, 91, 91, 92, 92, 92, 120, 120, 120];
    for (j, &volume) in volumes.iter().take(9).enumerate() {
        let high = if j == 3 { 105.0 } else { 104.0 };
        let low = if j == 5 { 100.0 } else { 101.0 };
        bars.push(bar(bars.len(), 102.0, high, low, 103.0, volume));
    }
    bars.push(bar(bars.len(), 103.0, 104.5, 102.8, 103.5, volumes[9]));
    bars
}

fn flat_bars(n: usize) -> Vec<Bar> {
    (0..n).map(|i| bar(i, 50.0, 50.0, 50.0, 50.0, 100)).collect()
}

/// Serves fixed bars per code; unknown codes fail like a delisted ticker.
#[derive(Default)]
struct ScriptedProvider {
    bars: HashMap<String, Vec<Bar>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn with(mut self, code: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(code.to_string(), bars);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, symbol: &str, _lookback: Lookback) -> Result<Vec<Bar>, DataError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        self.bars
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn notify(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(NotifyError::Status {
                status: 401,
                body: "invalid token".into(),
            });
        }
        Ok(())
    }
}

fn quiet_config() -> ScanConfig {
    let mut config = ScanConfig::default();
    config.fetch.delay_ms = 0;
    config
}

fn mixed_universe() -> Universe {
    Universe::from_pairs([
        ("2330", "TSMC"),
        ("2317", "Hon Hai"),
        ("1101", "Taiwan Cement"),
        ("0050", "Taiwan 50"),
    ])
}

fn mixed_provider() -> ScriptedProvider {
    ScriptedProvider::default()
        .with("2330", breakout_bars())
        .with("2317", box_bars())
        .with("0050", flat_bars(30))
}

// ── Scan loop ────────────────────────────────────────────────────────

#[test]
fn failures_are_isolated_per_symbol() {
    let provider = mixed_provider();
    let notifier = RecordingNotifier::default();
    let scanner = Scanner::new(quiet_config(), mixed_universe(), &provider, &notifier).unwrap();

    let outcome = scanner.run();

    assert_eq!(outcome.scanned, 4);
    assert_eq!(outcome.evaluated, 2);
    assert_eq!(outcome.skipped.fetch_failed, 1);
    assert_eq!(outcome.skipped.insufficient_history, 1);
    assert!(outcome.delivered);

    let trend: Vec<&str> = outcome
        .report
        .trend_attack
        .iter()
        .map(|c| c.symbol.as_str())
        .collect();
    assert_eq!(trend, vec!["2330"]);
    assert_eq!(outcome.report.trend_attack[0].signal, SignalState::StrongPassivation);

    let boxed: Vec<&str> = outcome
        .report
        .consolidation
        .iter()
        .map(|c| c.symbol.as_str())
        .collect();
    assert!(boxed.contains(&"2317"));
}

#[test]
fn symbols_are_visited_in_code_order() {
    let provider = mixed_provider();
    let notifier = RecordingNotifier::default();
    let scanner = Scanner::new(quiet_config(), mixed_universe(), &provider, &notifier).unwrap();
    scanner.run();
    assert_eq!(provider.calls(), vec!["0050", "1101", "2317", "2330"]);
}

#[test]
fn delay_follows_every_symbol() {
    let provider = mixed_provider();
    let notifier = RecordingNotifier::default();
    let pauses = Mutex::new(Vec::new());

    let mut config = quiet_config();
    config.fetch.delay_ms = 5;
    {
        let scanner = Scanner::new(config, mixed_universe(), &provider, &notifier)
            .unwrap()
            .with_sleeper(|d| pauses.lock().unwrap().push(d));
        scanner.run();
    }

    let pauses = pauses.into_inner().unwrap();
    // Including after the failed fetch and the short series.
    assert_eq!(pauses, vec![Duration::from_millis(5); 4]);
}

#[test]
fn zero_delay_never_sleeps() {
    let provider = mixed_provider();
    let notifier = RecordingNotifier::default();
    let pauses = Mutex::new(0usize);
    {
        let scanner = Scanner::new(quiet_config(), mixed_universe(), &provider, &notifier)
            .unwrap()
            .with_sleeper(|_| *pauses.lock().unwrap() += 1);
        scanner.run();
    }
    assert_eq!(pauses.into_inner().unwrap(), 0);
}

#[test]
fn delivery_failure_does_not_fail_the_scan() {
    let provider = mixed_provider();
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };
    let scanner = Scanner::new(quiet_config(), mixed_universe(), &provider, &notifier).unwrap();

    let outcome = scanner.run();

    assert!(!outcome.delivered);
    assert_eq!(outcome.report.trend_attack_total, 1);
    assert_eq!(notifier.sent.lock().unwrap().as_slice(), &[outcome.text.clone()]);
}

#[test]
fn empty_universe_sends_explicit_no_signal_report() {
    let provider = ScriptedProvider::default();
    let notifier = RecordingNotifier::default();
    let scanner = Scanner::new(quiet_config(), Universe::default(), &provider, &notifier).unwrap();

    let outcome = scanner.run();

    assert_eq!(outcome.scanned, 0);
    assert!(outcome.report.is_empty());
    assert!(outcome.text.contains(NO_SIGNALS));
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}

#[test]
fn all_skipped_sends_explicit_no_signal_report() {
    let provider = ScriptedProvider::default().with("0050", flat_bars(10));
    let notifier = RecordingNotifier::default();
    let universe = Universe::from_pairs([("0050", "Taiwan 50"), ("9999", "Missing")]);
    let scanner = Scanner::new(quiet_config(), universe, &provider, &notifier).unwrap();

    let outcome = scanner.run();

    assert_eq!(outcome.skipped.total(), 2);
    assert!(outcome.text.contains("Trend-Attack: 0 | Consolidation: 0"));
    assert!(outcome.text.contains(NO_SIGNALS));
}

#[test]
fn top_n_truncates_but_header_counts_all() {
    let provider = ScriptedProvider::default()
        .with("2330", breakout_bars())
        .with("2454", breakout_bars())
        .with("3008", breakout_bars());
    let notifier = RecordingNotifier::default();
    let universe = Universe::from_pairs([("2330", "A"), ("2454", "B"), ("3008", "C")]);
    let mut config = quiet_config();
    config.report.top_n = 1;
    let scanner = Scanner::new(config, universe, &provider, &notifier).unwrap();

    let outcome = scanner.run();

    assert_eq!(outcome.report.trend_attack_total, 3);
    assert_eq!(outcome.report.trend_attack.len(), 1);
    // Equal keys keep code order.
    assert_eq!(outcome.report.trend_attack[0].symbol, "2330");
    assert!(outcome.text.contains("Trend-Attack (top 1):"));
}

#[test]
fn repeated_scans_render_identical_text() {
    let provider = mixed_provider();
    let notifier = RecordingNotifier::default();
    let scanner = Scanner::new(quiet_config(), mixed_universe(), &provider, &notifier).unwrap();

    let first = scanner.run();
    let second = scanner.run();

    assert_eq!(first.report, second.report);
    assert_eq!(first.text, second.text);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let provider = ScriptedProvider::default();
    let notifier = RecordingNotifier::default();
    let mut config = quiet_config();
    config.report.top_n = 0;
    assert!(Scanner::new(config, Universe::default(), &provider, &notifier).is_err());
}

#[test]
fn single_symbol_check_uses_universe_name() {
    let provider = mixed_provider();
    let notifier = RecordingNotifier::default();
    let scanner = Scanner::new(quiet_config(), mixed_universe(), &provider, &notifier).unwrap();

    let verdict = scanner.evaluate_symbol("2330").unwrap();
    assert_eq!(verdict.trend_attack.unwrap().name, "TSMC");

    assert!(scanner.evaluate_symbol("1101").is_err());
    assert!(notifier.sent.lock().unwrap().is_empty());
}

// ── Files ────────────────────────────────────────────────────────────

#[test]
fn config_and_universe_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("kdscan.toml");
    let universe_path = dir.path().join("universe.toml");

    std::fs::write(
        &config_path,
        "[report]\ntop_n = 3\n\n[fetch]\ndelay_ms = 0\nlookback = \"3mo\"\n",
    )
    .unwrap();
    std::fs::write(
        &universe_path,
        "[sectors.semis]\n\"2330\" = \"TSMC\"\n\n[sectors.etf]\n\"0050\" = \"Taiwan 50\"\n",
    )
    .unwrap();

    let config = ScanConfig::from_file(&config_path).unwrap();
    assert_eq!(config.report.top_n, 3);
    assert_eq!(config.fetch.lookback, Lookback::ThreeMonths);

    let universe = Universe::from_file(&universe_path).unwrap();
    assert_eq!(universe.codes(), vec!["0050", "2330"]);
}

#[test]
fn config_round_trips_through_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kdscan.toml");

    let mut config = ScanConfig::default();
    config.strategy.consolidation.pct_cap = 3.5;
    config.fetch.suffix = "TWO".into();
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();

    let loaded = ScanConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.fingerprint().unwrap(), config.fingerprint().unwrap());
}

#[test]
fn missing_files_report_their_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = ScanConfig::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
    let err = Universe::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}
