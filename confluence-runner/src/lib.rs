//! Confluence Runner — drives the signal engine over many symbols.
//!
//! This crate builds on `confluence-core` to provide:
//! - Runner configuration loaded from TOML
//! - Explicit runner state (enable flag, mode, last signals, recent feed)
//! - Parallel multi-symbol scans with per-symbol error isolation
//! - A polling loop with a cooperative stop flag
//! - Notifiers (tracing log, JSONL file)

pub mod config;
pub mod notify;
pub mod scan;
pub mod state;
pub mod watch;

pub use config::{ConfigError, Mode, RunnerConfig, API_KEY_ENV};
pub use notify::{JsonlNotifier, LogNotifier, Notifier, NotifyError};
pub use scan::{scan, ScanError, ScanReport, ScanRequest, SymbolOutcome};
pub use state::{RunnerState, SignalRecord, FEED_CAPACITY};
pub use watch::{run_cycle, watch, CycleSummary, WatchOptions, WatchSummary};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn runner_types_are_send_sync() {
        assert_send::<RunnerConfig>();
        assert_sync::<RunnerConfig>();
        assert_send::<RunnerState>();
        assert_sync::<RunnerState>();
        assert_send::<ScanRequest>();
        assert_sync::<ScanRequest>();
        assert_send::<ScanReport>();
        assert_send::<SignalRecord>();
        assert_sync::<SignalRecord>();
    }

    #[test]
    fn notifiers_are_send_sync() {
        assert_send::<LogNotifier>();
        assert_sync::<LogNotifier>();
        assert_send::<JsonlNotifier>();
        assert_sync::<JsonlNotifier>();
        assert_send::<Box<dyn Notifier>>();
        assert_sync::<Box<dyn Notifier>>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
        assert_send::<ScanError>();
        assert_sync::<ScanError>();
        assert_send::<NotifyError>();
        assert_sync::<NotifyError>();
    }
}
