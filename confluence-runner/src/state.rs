//! Runner state: enable flag, mode, last signal per symbol, recent feed.
//!
//! Owned by whoever drives the loop and passed by `&mut`. Nothing here is
//! global; two runners in one process keep separate state.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use confluence_core::{Direction, SignalDecision};

use crate::config::Mode;

/// Most recent signals kept in the feed.
pub const FEED_CAPACITY: usize = 200;

/// An emitted signal plus the fingerprint of the rule table that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub decision: SignalDecision,
    pub rules_fingerprint: String,
}

impl SignalRecord {
    pub fn new(decision: SignalDecision, rules_fingerprint: impl Into<String>) -> Self {
        Self {
            decision,
            rules_fingerprint: rules_fingerprint.into(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.decision.symbol
    }

    /// Same symbol, same candle, same direction.
    fn same_signal(&self, other: &SignalRecord) -> bool {
        self.decision.symbol == other.decision.symbol
            && self.decision.generated_at == other.decision.generated_at
            && self.decision.direction == other.decision.direction
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerState {
    enabled: bool,
    mode: Mode,
    last_signals: BTreeMap<String, SignalRecord>,
    feed: VecDeque<SignalRecord>,
}

impl Default for RunnerState {
    /// Disabled and manual until someone turns it on.
    fn default() -> Self {
        Self::new(false, Mode::Manual)
    }
}

impl RunnerState {
    pub fn new(enabled: bool, mode: Mode) -> Self {
        Self {
            enabled,
            mode,
            last_signals: BTreeMap::new(),
            feed: VecDeque::with_capacity(FEED_CAPACITY),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// True when the polling loop should scan on its own.
    pub fn is_polling(&self) -> bool {
        self.enabled && self.mode == Mode::Auto
    }

    /// Store a signal. Returns false if it repeats the symbol's last one.
    pub fn record(&mut self, record: SignalRecord) -> bool {
        if let Some(previous) = self.last_signals.get(record.symbol()) {
            if previous.same_signal(&record) {
                return false;
            }
        }
        if self.feed.len() == FEED_CAPACITY {
            self.feed.pop_front();
        }
        self.feed.push_back(record.clone());
        self.last_signals.insert(record.symbol().to_string(), record);
        true
    }

    pub fn last_signal(&self, symbol: &str) -> Option<&SignalRecord> {
        self.last_signals.get(symbol)
    }

    /// Newest first, at most `limit` entries.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &SignalRecord> {
        self.feed.iter().rev().take(limit)
    }

    pub fn feed_len(&self) -> usize {
        self.feed.len()
    }

    /// Latest direction and candle time per symbol.
    pub fn summary(&self) -> Vec<(&str, Direction, DateTime<Utc>)> {
        self.last_signals
            .iter()
            .map(|(symbol, r)| (symbol.as_str(), r.decision.direction, r.decision.generated_at))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use confluence_core::{ConfluenceVote, Interval};

    fn record(symbol: &str, minute: i64, direction: Direction) -> SignalRecord {
        let decision = SignalDecision {
            symbol: symbol.into(),
            interval: Interval::M5,
            direction,
            confidence: 95.0,
            bull_score: 9.5,
            bear_score: 0.0,
            votes: vec![ConfluenceVote::bullish("rsi_oversold", 2.0)],
            indicators: vec![],
            price: 1.1,
            generated_at: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
                + Duration::minutes(minute),
        };
        SignalRecord::new(decision, "abc")
    }

    #[test]
    fn default_is_disabled_manual() {
        let state = RunnerState::default();
        assert!(!state.enabled());
        assert_eq!(state.mode(), Mode::Manual);
        assert!(!state.is_polling());
    }

    #[test]
    fn polling_requires_enabled_and_auto() {
        let mut state = RunnerState::new(true, Mode::Manual);
        assert!(!state.is_polling());
        state.set_mode(Mode::Auto);
        assert!(state.is_polling());
        state.set_enabled(false);
        assert!(!state.is_polling());
    }

    #[test]
    fn duplicate_signal_is_recorded_once() {
        let mut state = RunnerState::new(true, Mode::Auto);
        assert!(state.record(record("EUR/USD", 0, Direction::Call)));
        assert!(!state.record(record("EUR/USD", 0, Direction::Call)));
        assert_eq!(state.feed_len(), 1);

        // New candle or new direction is a new signal.
        assert!(state.record(record("EUR/USD", 5, Direction::Call)));
        assert!(state.record(record("EUR/USD", 5, Direction::Put)));
        assert_eq!(state.feed_len(), 3);
        assert_eq!(
            state.last_signal("EUR/USD").unwrap().decision.direction,
            Direction::Put
        );
    }

    #[test]
    fn symbols_are_tracked_separately() {
        let mut state = RunnerState::new(true, Mode::Auto);
        assert!(state.record(record("EUR/USD", 0, Direction::Call)));
        assert!(state.record(record("GBP/USD", 0, Direction::Call)));
        assert_eq!(state.summary().len(), 2);
        assert!(state.last_signal("USD/JPY").is_none());
    }

    #[test]
    fn feed_is_capped_and_newest_first() {
        let mut state = RunnerState::new(true, Mode::Auto);
        for minute in 0..(FEED_CAPACITY as i64 + 10) {
            state.record(record("EUR/USD", minute, Direction::Call));
        }
        assert_eq!(state.feed_len(), FEED_CAPACITY);
        let newest: Vec<_> = state.recent(2).collect();
        assert_eq!(
            newest[0].decision.generated_at,
            Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
                + Duration::minutes(FEED_CAPACITY as i64 + 9)
        );
        assert!(newest[0].decision.generated_at > newest[1].decision.generated_at);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = RunnerState::new(true, Mode::Auto);
        state.record(record("EUR/USD", 0, Direction::Call));
        let json = serde_json::to_string(&state).unwrap();
        let back: RunnerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
