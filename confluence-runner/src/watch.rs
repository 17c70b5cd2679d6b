//! Polling loop: scan, record new signals, notify, sleep, repeat.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use confluence_core::data::PriceSeriesProvider;

use crate::notify::Notifier;
use crate::scan::{scan, ScanRequest};
use crate::state::{RunnerState, SignalRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub poll_interval: Duration,
    /// Stop after this many cycles, skipped ones included.
    pub max_cycles: Option<u64>,
    /// Longest single sleep between stop-flag checks.
    pub sleep_slice: Duration,
}

impl WatchOptions {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            max_cycles: None,
            sleep_slice: Duration::from_millis(250),
        }
    }

    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleSummary {
    pub skipped: bool,
    pub scanned: usize,
    pub failed: usize,
    pub signals: usize,
    /// Signals already recorded on an earlier cycle.
    pub duplicates: usize,
    pub notify_failures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchSummary {
    pub cycles: u64,
    pub skipped: u64,
    pub signals: usize,
    pub failures: usize,
}

/// One scan cycle against `state`. Does nothing unless the state is polling.
pub fn run_cycle<P>(
    provider: &P,
    request: &ScanRequest,
    state: &mut RunnerState,
    notifiers: &[Box<dyn Notifier>],
) -> CycleSummary
where
    P: PriceSeriesProvider + ?Sized,
{
    if !state.is_polling() {
        debug!(enabled = state.enabled(), mode = ?state.mode(), "cycle skipped");
        return CycleSummary {
            skipped: true,
            ..CycleSummary::default()
        };
    }

    let report = scan(provider, request);
    let fingerprint = request.rules.fingerprint();
    let mut summary = CycleSummary {
        scanned: report.outcomes.len(),
        failed: report.failure_count(),
        ..CycleSummary::default()
    };

    for outcome in report.outcomes {
        let Some(decision) = outcome.result.ok().and_then(|v| v.into_signal()) else {
            continue;
        };
        let record = SignalRecord::new(decision, fingerprint.clone());
        if !state.record(record.clone()) {
            summary.duplicates += 1;
            continue;
        }
        summary.signals += 1;
        for notifier in notifiers {
            if let Err(e) = notifier.notify(&record) {
                summary.notify_failures += 1;
                error!(notifier = notifier.name(), symbol = %record.symbol(), error = %e, "notify failed");
            }
        }
    }

    info!(
        scanned = summary.scanned,
        failed = summary.failed,
        signals = summary.signals,
        duplicates = summary.duplicates,
        "cycle complete"
    );
    summary
}

/// Sleep up to `total`, waking every `slice` to check `stop`.
/// Returns true if stopped early.
fn sleep_until_stopped(total: Duration, slice: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    let slice = slice.max(Duration::from_millis(1));
    loop {
        if stop.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(slice.min(deadline - now));
    }
}

/// Run cycles every `options.poll_interval` until `stop` is raised or the
/// cycle limit is reached.
pub fn watch<P>(
    provider: &P,
    request: &ScanRequest,
    state: &mut RunnerState,
    notifiers: &[Box<dyn Notifier>],
    options: &WatchOptions,
    stop: &AtomicBool,
) -> WatchSummary
where
    P: PriceSeriesProvider + ?Sized,
{
    let mut summary = WatchSummary::default();
    info!(
        symbols = request.symbols.len(),
        interval = %request.interval,
        poll_secs = options.poll_interval.as_secs(),
        "watch started"
    );

    while !stop.load(Ordering::Relaxed) {
        let cycle = run_cycle(provider, request, state, notifiers);
        summary.cycles += 1;
        if cycle.skipped {
            summary.skipped += 1;
        }
        summary.signals += cycle.signals;
        summary.failures += cycle.failed;

        if options.max_cycles.is_some_and(|max| summary.cycles >= max) {
            break;
        }
        if sleep_until_stopped(options.poll_interval, options.sleep_slice, stop) {
            break;
        }
    }

    info!(cycles = summary.cycles, signals = summary.signals, "watch stopped");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    #[test]
    fn sleep_returns_early_when_stopped() {
        let stop = AtomicBool::new(true);
        let start = Instant::now();
        assert!(sleep_until_stopped(
            Duration::from_secs(60),
            Duration::from_millis(5),
            &stop
        ));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_runs_to_deadline() {
        let stop = AtomicBool::new(false);
        assert!(!sleep_until_stopped(
            Duration::from_millis(20),
            Duration::from_millis(5),
            &stop
        ));
    }

    #[test]
    fn disabled_state_skips_cycle() {
        let provider = confluence_core::data::SyntheticProvider::new(1);
        let request = ScanRequest::from_config(&crate::RunnerConfig::for_symbols(["EUR/USD"]));
        let mut state = RunnerState::new(false, Mode::Auto);
        let summary = run_cycle(&provider, &request, &mut state, &[]);
        assert!(summary.skipped);
        assert_eq!(summary.scanned, 0);
    }
}
