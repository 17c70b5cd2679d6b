//! Confluence CLI — one-shot analysis, scans and the polling loop.
//!
//! Commands:
//! - `analyze`: fetch one symbol and print its decision and verdict
//! - `scan`: one parallel pass over the symbols of a runner config
//! - `watch`: poll the configured symbols until stopped or a cycle limit
//! - `rules`: print the default rule table as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use confluence_core::data::{
    CircuitBreaker, CsvProvider, FetchError, PriceSeriesProvider, SyntheticProvider,
    TwelveDataProvider,
};
use confluence_core::{evaluate, Interval, RuleConfig, SignalDecision, Thresholds, Verdict};
use confluence_runner::{
    scan, watch, JsonlNotifier, LogNotifier, Mode, Notifier, RunnerConfig, RunnerState,
    ScanRequest, WatchOptions, API_KEY_ENV,
};

#[derive(Parser)]
#[command(
    name = "confluence",
    about = "Confluence CLI — weighted indicator votes into CALL / PUT / WAIT"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Source {
    Twelvedata,
    Csv,
    Synthetic,
}

/// Where candles come from.
#[derive(clap::Args)]
struct SourceArgs {
    #[arg(long, value_enum, default_value_t = Source::Twelvedata)]
    source: Source,

    /// Directory of `<SYMBOL>_<interval>.csv` files (csv source).
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Seed for the synthetic source.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one symbol and print the decision.
    Analyze {
        #[arg(long)]
        symbol: String,

        /// Candle interval (5min, M5, 1h, H1, ...).
        #[arg(long, default_value = "5min")]
        interval: Interval,

        #[arg(long, default_value_t = 200)]
        candles: usize,

        /// Rule table TOML. Defaults to the built-in table.
        #[arg(long)]
        rules: Option<PathBuf>,

        #[arg(long)]
        min_votes: Option<usize>,

        #[arg(long)]
        min_confidence: Option<f64>,

        /// HTTP timeout in seconds (twelvedata source).
        #[arg(long, default_value_t = 20)]
        timeout: u64,

        #[command(flatten)]
        source: SourceArgs,

        /// Print the verdict as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run one scan over the symbols of a runner config.
    Scan {
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        /// Print every outcome as a JSON line.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Poll the configured symbols and notify new signals.
    Watch {
        #[arg(long)]
        config: PathBuf,

        /// Stop after this many cycles.
        #[arg(long)]
        cycles: Option<u64>,

        /// Also append signals to this JSONL file.
        #[arg(long)]
        signals_out: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the default rule table as TOML.
    Rules,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Analyze {
            symbol,
            interval,
            candles,
            rules,
            min_votes,
            min_confidence,
            timeout,
            source,
            json,
        } => run_analyze(
            &symbol,
            interval,
            candles,
            rules.as_deref(),
            min_votes,
            min_confidence,
            Duration::from_secs(timeout),
            &source,
            json,
        ),
        Commands::Scan {
            config,
            source,
            json,
        } => run_scan(&config, &source, json),
        Commands::Watch {
            config,
            cycles,
            signals_out,
            source,
        } => run_watch(&config, cycles, signals_out, &source),
        Commands::Rules => {
            print!("{}", RuleConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_target(true)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_provider(
    args: &SourceArgs,
    api_key: Option<String>,
    timeout: Duration,
) -> Result<Box<dyn PriceSeriesProvider>> {
    let provider: Box<dyn PriceSeriesProvider> = match args.source {
        Source::Twelvedata => {
            let key = api_key.ok_or(FetchError::MissingApiKey).with_context(|| {
                format!("set {API_KEY_ENV} or api_key in the runner config")
            })?;
            let breaker = Arc::new(CircuitBreaker::for_polling());
            Box::new(TwelveDataProvider::new(key, timeout, breaker)?)
        }
        Source::Csv => {
            if !args.data_dir.is_dir() {
                bail!("data directory does not exist: {}", args.data_dir.display());
            }
            Box::new(CsvProvider::new(&args.data_dir))
        }
        Source::Synthetic => Box::new(SyntheticProvider::new(args.seed)),
    };
    Ok(provider)
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    symbol: &str,
    interval: Interval,
    candles: usize,
    rules_path: Option<&Path>,
    min_votes: Option<usize>,
    min_confidence: Option<f64>,
    timeout: Duration,
    source: &SourceArgs,
    json: bool,
) -> Result<()> {
    let rules = match rules_path {
        Some(path) => RuleConfig::from_file(path)?,
        None => RuleConfig::default(),
    };
    let defaults = Thresholds::default();
    let thresholds = Thresholds::new(
        min_votes.unwrap_or(defaults.min_votes),
        min_confidence.unwrap_or(defaults.min_confidence),
    );

    let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
    let provider = build_provider(source, api_key, timeout)?;
    let series = provider
        .fetch_series(symbol, interval, candles)
        .with_context(|| format!("fetching {symbol} {interval}"))?;
    let verdict = evaluate(&series, &rules, &thresholds)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print_verdict(&verdict, &thresholds);
    }
    Ok(())
}

fn run_scan(config_path: &Path, source: &SourceArgs, json: bool) -> Result<()> {
    let config = RunnerConfig::from_file(config_path)?;
    info!(config = %config_path.display(), symbols = config.symbols.len(), "runner config loaded");
    let provider = build_provider(source, config.resolve_api_key(), config.fetch_timeout())?;
    let report = scan(provider.as_ref(), &ScanRequest::from_config(&config));

    for outcome in &report.outcomes {
        match (&outcome.result, json) {
            (Ok(verdict), true) => println!("{}", serde_json::to_string(verdict)?),
            (Ok(verdict), false) => print_line(verdict),
            (Err(e), true) => println!(
                "{}",
                serde_json::json!({ "symbol": outcome.symbol, "error": e.to_string() })
            ),
            (Err(e), false) => println!("{:<10} ERROR  {e}", outcome.symbol),
        }
    }
    if !json {
        println!();
        println!(
            "{} symbol(s), {} signal(s), {} failure(s)",
            report.outcomes.len(),
            report.signal_count(),
            report.failure_count()
        );
    }
    Ok(())
}

fn run_watch(
    config_path: &Path,
    cycles: Option<u64>,
    signals_out: Option<PathBuf>,
    source: &SourceArgs,
) -> Result<()> {
    let config = RunnerConfig::from_file(config_path)?;
    info!(config = %config_path.display(), symbols = config.symbols.len(), "runner config loaded");
    if config.mode == Mode::Manual {
        bail!("runner config is in manual mode; set mode = \"auto\" to watch");
    }
    let provider = build_provider(source, config.resolve_api_key(), config.fetch_timeout())?;

    let mut notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier)];
    if let Some(path) = signals_out {
        notifiers.push(Box::new(JsonlNotifier::new(path)));
    }

    let mut options = WatchOptions::new(config.poll_interval());
    options.max_cycles = cycles;

    let mut state = RunnerState::new(true, config.mode);
    let stop = AtomicBool::new(false);
    let summary = watch(
        provider.as_ref(),
        &ScanRequest::from_config(&config),
        &mut state,
        &notifiers,
        &options,
        &stop,
    );

    println!(
        "{} cycle(s), {} signal(s), {} failed fetch(es)",
        summary.cycles, summary.signals, summary.failures
    );
    for (symbol, direction, at) in state.summary() {
        println!("  {symbol:<10} {direction:<4} {at}");
    }
    Ok(())
}

fn print_line(verdict: &Verdict) {
    let d = verdict.decision();
    let status = match verdict {
        Verdict::Signal(_) => "SIGNAL".to_string(),
        Verdict::NoSignal { reason, .. } => format!("{reason:?}"),
    };
    println!(
        "{:<10} {:<4} {:>5.1}%  {:<2} votes  {}",
        d.symbol,
        d.direction,
        d.confidence,
        d.votes.len(),
        status
    );
}

fn print_verdict(verdict: &Verdict, thresholds: &Thresholds) {
    let d: &SignalDecision = verdict.decision();
    println!();
    println!("=== {} {} ===", d.symbol, d.interval);
    println!("Candle:      {}", d.generated_at);
    println!("Price:       {}", d.price);
    println!("Direction:   {}", d.direction);
    println!("Confidence:  {:.1}%", d.confidence);
    println!("Scores:      bull {:.1} / bear {:.1}", d.bull_score, d.bear_score);
    println!();
    println!("--- Votes ---");
    if d.votes.is_empty() {
        println!("(none)");
    }
    for vote in &d.votes {
        println!("{:<20} {:?} ({})", vote.name, vote.direction, vote.weight);
    }
    println!();
    println!("--- Indicators ---");
    for iv in &d.indicators {
        println!("{:<20} {:.5}", iv.name, iv.value);
    }
    println!();
    match verdict {
        Verdict::Signal(_) => println!(
            "SIGNAL (min_votes {}, min_confidence {})",
            thresholds.min_votes, thresholds.min_confidence
        ),
        Verdict::NoSignal { reason, .. } => println!("No signal: {reason:?}"),
    }
    println!();
}
