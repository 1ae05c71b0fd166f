//! kdscan CLI: daily KD screen over a Taiwan equity universe.
//!
//! Commands:
//! - `scan`: evaluate the whole universe and deliver the report (`--json` also
//!   writes the ranked report as JSON)
//! - `check`: print the snapshot and both verdicts for one code
//! - `universe`: print the universe as TOML
//! - `config`: print the default configuration as TOML

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kdscan_core::indicators::{Indicator, Sma, VolumeSma};
use kdscan_core::{BarSeries, Candidate, Setup, Verdict};
use kdscan_runner::{
    notifier_for, provider_for, Lookback, ScanConfig, Scanner, StdoutNotifier, Universe,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kdscan", about = "kdscan: KD passivation and bias screener")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the universe and deliver the report.
    Scan {
        /// Path to a TOML config file. Defaults are used without one.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a TOML universe file. Defaults to the built-in Taiwan list.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Use deterministic synthetic bars instead of the chart API.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Print the report instead of pushing it to LINE.
        #[arg(long, default_value_t = false)]
        stdout: bool,

        /// Candidates kept per strategy.
        #[arg(long)]
        top_n: Option<usize>,

        /// Pause after each symbol, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,

        /// History to fetch: 3mo or 6mo.
        #[arg(long)]
        lookback: Option<Lookback>,

        /// Also write the ranked report as JSON to stdout.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Evaluate one code and print every derived value.
    Check {
        /// Universe code (e.g., 2330).
        code: String,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a TOML universe file, used for the display name.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Use deterministic synthetic bars instead of the chart API.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Print the verdict as JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the universe as TOML.
    Universe {
        /// Path to a TOML universe file. Defaults to the built-in Taiwan list.
        #[arg(long)]
        universe: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Scan {
            config,
            universe,
            synthetic,
            stdout,
            top_n,
            delay_ms,
            lookback,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(n) = top_n {
                config.report.top_n = n;
            }
            if let Some(ms) = delay_ms {
                config.fetch.delay_ms = ms;
            }
            if let Some(lb) = lookback {
                config.fetch.lookback = lb;
            }
            run_scan(config, universe.as_deref(), synthetic, stdout, json)
        }
        Commands::Check {
            code,
            config,
            universe,
            synthetic,
            json,
        } => run_check(&code, config.as_deref(), universe.as_deref(), synthetic, json),
        Commands::Universe { universe } => {
            let universe = load_universe(universe.as_deref())?;
            print!("{}", universe.to_toml()?);
            Ok(())
        }
        Commands::Config => {
            print!("{}", ScanConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(p) => ScanConfig::from_file(p).with_context(|| format!("load config {}", p.display())),
        None => Ok(ScanConfig::default()),
    }
}

fn load_universe(path: Option<&Path>) -> Result<Universe> {
    match path {
        Some(p) => Universe::from_file(p).with_context(|| format!("load universe {}", p.display())),
        None => Ok(Universe::default_taiwan()),
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn run_scan(
    config: ScanConfig,
    universe_path: Option<&Path>,
    synthetic: bool,
    stdout: bool,
    json: bool,
) -> Result<()> {
    let universe = load_universe(universe_path)?;
    let provider = provider_for(&config.fetch, synthetic.then(today))?;
    let notifier = notifier_for(stdout);

    let scanner = Scanner::new(config, universe, provider.as_ref(), notifier.as_ref())
        .context("invalid configuration")?;
    let outcome = scanner.run();
    if json {
        let encoded =
            serde_json::to_string_pretty(&outcome.report).context("encode report as JSON")?;
        println!("{encoded}");
    }

    if synthetic {
        info!("report is based on SYNTHETIC data");
    }
    info!(
        scanned = outcome.scanned,
        fetch_failed = outcome.skipped.fetch_failed,
        insufficient_history = outcome.skipped.insufficient_history,
        invalid_series = outcome.skipped.invalid_series,
        "done"
    );
    Ok(())
}

fn run_check(
    code: &str,
    config_path: Option<&Path>,
    universe_path: Option<&Path>,
    synthetic: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let universe = load_universe(universe_path)?;
    let provider = provider_for(&config.fetch, synthetic.then(today))?;
    let notifier = StdoutNotifier;

    let scanner = Scanner::new(config, universe, provider.as_ref(), &notifier)
        .context("invalid configuration")?;
    let series = scanner
        .fetch_series(code)
        .with_context(|| format!("fetch {code}"))?;
    let verdict = scanner
        .evaluate_series(&series)
        .with_context(|| format!("evaluate {code}"))?;

    if json {
        let encoded = serde_json::to_string_pretty(&verdict).context("encode verdict as JSON")?;
        println!("{encoded}");
        return Ok(());
    }

    print_verdict(code, scanner.universe().name_of(code).unwrap_or(code), &verdict);
    print_recent(&series, &verdict, RECENT_SESSIONS);
    Ok(())
}

const RECENT_SESSIONS: usize = 5;

/// Trailing sessions with the series indicators alongside %K/%D.
fn print_recent(series: &BarSeries, verdict: &Verdict, sessions: usize) {
    let bars = series.bars();
    let columns: [Box<dyn Indicator>; 3] = [
        Box::new(Sma::new(5)),
        Box::new(Sma::new(20)),
        Box::new(VolumeSma::new(5)),
    ];
    let values: Vec<Vec<f64>> = columns.iter().map(|ind| ind.compute(bars)).collect();
    let osc = &verdict.snapshot.oscillator;

    println!();
    print!("  {:<10} {:>9} {:>12}", "date", "close", "volume");
    for ind in &columns {
        print!(" {:>10}", ind.name());
    }
    println!(" {:>6} {:>6}", "K", "D");

    let start = bars.len().saturating_sub(sessions);
    for i in start..bars.len() {
        let bar = &bars[i];
        print!("  {} {:>9.2} {:>12}", bar.date, bar.close, bar.volume);
        for column in &values {
            print!(" {:>10.2}", column[i]);
        }
        println!(" {:>6.1} {:>6.1}", osc.k()[i], osc.d()[i]);
    }
}

fn print_verdict(code: &str, name: &str, verdict: &Verdict) {
    let s = &verdict.snapshot;
    let (k, d) = s.kd();

    println!("{code} {name}");
    println!("  Price:        {:.2} ({:+.2}%)", s.price, s.pct_change);
    println!("  KD:           K {k:.1} / D {d:.1}");
    println!("  Signal:       {}", s.signal);
    println!("  Bias:         {:+.2}%", s.bias);
    println!(
        "  SMA 5/10/20/60: {:.2} / {:.2} / {:.2} / {:.2}",
        s.sma5, s.sma10, s.sma20, s.sma60
    );
    println!(
        "  Volume:       {:.0} (MA3 {:.0}, MA5 {:.0}, MA10 {:.0})",
        s.volume, s.vol_ma3, s.vol_ma5, s.vol_ma10
    );
    println!(
        "  Support:      {:.2} ({})",
        s.levels.support.price, s.levels.support.source
    );
    println!(
        "  Resistance:   {:.2} ({})",
        s.levels.resistance.price, s.levels.resistance.note
    );
    println!(
        "  Box (10d):    {:.2} ~ {:.2} (width {:.2}%)",
        s.box_low,
        s.box_high,
        s.box_width() * 100.0
    );
    println!("  Solid candle: {}", if s.candle_solid { "yes" } else { "no" });
    println!();
    println!("  Trend-Attack:  {}", describe(verdict.trend_attack.as_ref()));
    println!("  Consolidation: {}", describe(verdict.consolidation.as_ref()));
}

fn describe(candidate: Option<&Candidate>) -> String {
    match candidate.map(|c| c.setup) {
        None => "no".to_string(),
        Some(Setup::TrendAttack { volume_ratio }) => {
            format!("yes (volume {volume_ratio:.2}x the 5-day average)")
        }
        Some(Setup::Consolidation {
            volume_ratio,
            stage,
            ..
        }) => format!("yes ({stage}, 3/10 volume ratio {volume_ratio:.2})"),
    }
}
