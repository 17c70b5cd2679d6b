//! Multi-symbol scan: fetch and evaluate every symbol in parallel.
//!
//! One symbol failing never aborts the others. Reports come back in the
//! order the symbols were requested.

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use confluence_core::data::{FetchError, PriceSeriesProvider};
use confluence_core::{evaluate, ConfluenceError, Interval, RuleConfig, Thresholds, Verdict};

use crate::config::RunnerConfig;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Engine(#[from] ConfluenceError),
}

/// What to scan and how to judge it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub symbols: Vec<String>,
    pub interval: Interval,
    pub candles: usize,
    pub rules: RuleConfig,
    pub thresholds: Thresholds,
}

impl ScanRequest {
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            symbols: config.symbols.clone(),
            interval: config.interval,
            candles: config.candles,
            rules: config.rules.clone(),
            thresholds: config.thresholds,
        }
    }
}

#[derive(Debug)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub result: Result<Verdict, ScanError>,
}

impl SymbolOutcome {
    pub fn signal(&self) -> Option<&Verdict> {
        self.result.as_ref().ok().filter(|v| v.is_signal())
    }
}

#[derive(Debug)]
pub struct ScanReport {
    pub outcomes: Vec<SymbolOutcome>,
}

impl ScanReport {
    pub fn signals(&self) -> impl Iterator<Item = &Verdict> {
        self.outcomes.iter().filter_map(SymbolOutcome::signal)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ScanError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.symbol.as_str(), e)))
    }

    pub fn signal_count(&self) -> usize {
        self.signals().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

fn scan_symbol<P>(provider: &P, request: &ScanRequest, symbol: &str) -> Result<Verdict, ScanError>
where
    P: PriceSeriesProvider + ?Sized,
{
    let series = provider.fetch_series(symbol, request.interval, request.candles)?;
    Ok(evaluate(&series, &request.rules, &request.thresholds)?)
}

/// Fetch and evaluate every symbol of `request`.
pub fn scan<P>(provider: &P, request: &ScanRequest) -> ScanReport
where
    P: PriceSeriesProvider + ?Sized,
{
    let outcomes: Vec<SymbolOutcome> = request
        .symbols
        .par_iter()
        .map(|symbol| {
            let result = scan_symbol(provider, request, symbol);
            match &result {
                Ok(verdict) if verdict.is_signal() => {
                    let d = verdict.decision();
                    info!(
                        symbol = %symbol,
                        direction = %d.direction,
                        confidence = d.confidence,
                        votes = d.votes.len(),
                        "signal"
                    );
                }
                Ok(_) => {}
                Err(e) => warn!(symbol = %symbol, provider = provider.name(), error = %e, "scan failed"),
            }
            SymbolOutcome {
                symbol: symbol.clone(),
                result,
            }
        })
        .collect();

    ScanReport { outcomes }
}
