//! Signal delivery.
//!
//! `LogNotifier` emits a tracing event; `JsonlNotifier` appends one JSON
//! object per line, so a partial write never corrupts earlier entries.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::state::SignalRecord;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize signal: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    fn notify(&self, record: &SignalRecord) -> Result<(), NotifyError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn notify(&self, record: &SignalRecord) -> Result<(), NotifyError> {
        let d = &record.decision;
        info!(
            symbol = %d.symbol,
            interval = %d.interval,
            direction = %d.direction,
            confidence = d.confidence,
            price = d.price,
            votes = ?d.vote_names(),
            at = %d.generated_at,
            "signal emitted"
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JsonlNotifier {
    path: PathBuf,
}

impl JsonlNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> NotifyError {
        NotifyError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Every record in the file, oldest first. A missing file reads as empty.
    pub fn load(&self) -> Result<Vec<SignalRecord>, NotifyError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(NotifyError::from))
            .collect()
    }
}

impl Notifier for JsonlNotifier {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn notify(&self, record: &SignalRecord) -> Result<(), NotifyError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{line}").map_err(|e| self.io_error(e))?;
        file.flush().map_err(|e| self.io_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use confluence_core::{ConfluenceVote, Direction, Interval, SignalDecision};

    fn record(price: f64) -> SignalRecord {
        SignalRecord::new(
            SignalDecision {
                symbol: "EUR/USD".into(),
                interval: Interval::M5,
                direction: Direction::Put,
                confidence: 91.0,
                bull_score: 0.0,
                bear_score: 9.1,
                votes: vec![ConfluenceVote::bearish("rsi_overbought", 2.0)],
                indicators: vec![],
                price,
                generated_at: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
            },
            "f00d",
        )
    }

    #[test]
    fn jsonl_appends_one_line_per_signal() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = JsonlNotifier::new(dir.path().join("nested").join("signals.jsonl"));
        notifier.notify(&record(1.1)).unwrap();
        notifier.notify(&record(1.2)).unwrap();

        let content = fs::read_to_string(notifier.path()).unwrap();
        assert_eq!(content.lines().count(), 2);

        let loaded = notifier.load().unwrap();
        assert_eq!(loaded, vec![record(1.1), record(1.2)]);
    }

    #[test]
    fn load_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = JsonlNotifier::new(dir.path().join("none.jsonl"));
        assert!(notifier.load().unwrap().is_empty());
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for append.
        let notifier = JsonlNotifier::new(dir.path());
        assert!(matches!(
            notifier.notify(&record(1.1)),
            Err(NotifyError::Io { .. })
        ));
    }

    #[test]
    fn log_notifier_never_fails() {
        assert!(LogNotifier.notify(&record(1.1)).is_ok());
        assert_eq!(LogNotifier.name(), "log");
    }
}
