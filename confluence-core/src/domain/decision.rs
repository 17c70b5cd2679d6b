//! Votes and decisions produced by the confluence aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::interval::Interval;

/// Direction a single rule votes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Bullish,
    Bearish,
    Neutral,
}

/// One fired rule: a label, the direction it supports and its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceVote {
    pub name: String,
    pub direction: VoteDirection,
    pub weight: f64,
}

impl ConfluenceVote {
    pub fn new(name: impl Into<String>, direction: VoteDirection, weight: f64) -> Self {
        Self {
            name: name.into(),
            direction,
            weight,
        }
    }

    pub fn bullish(name: impl Into<String>, weight: f64) -> Self {
        Self::new(name, VoteDirection::Bullish, weight)
    }

    pub fn bearish(name: impl Into<String>, weight: f64) -> Self {
        Self::new(name, VoteDirection::Bearish, weight)
    }
}

/// Final signal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Call,
    Put,
    Wait,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Call => "CALL",
            Direction::Put => "PUT",
            Direction::Wait => "WAIT",
        };
        f.pad(s)
    }
}

/// Named indicator reading at the most recent candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValue {
    pub name: String,
    pub value: f64,
}

impl IndicatorValue {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Outcome of one analysis call. Immutable once produced.
///
/// `generated_at` is the timestamp of the candle the decision was computed
/// on, so analysing the same series twice yields identical decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDecision {
    pub symbol: String,
    pub interval: Interval,
    pub direction: Direction,
    /// Normalized to [0, 100].
    pub confidence: f64,
    pub bull_score: f64,
    pub bear_score: f64,
    /// Fired rules in rule-table order.
    pub votes: Vec<ConfluenceVote>,
    pub indicators: Vec<IndicatorValue>,
    pub price: f64,
    pub generated_at: DateTime<Utc>,
}

impl SignalDecision {
    pub fn vote_names(&self) -> Vec<&str> {
        self.votes.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn has_vote(&self, name: &str) -> bool {
        self.votes.iter().any(|v| v.name == name)
    }

    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators
            .iter()
            .find(|iv| iv.name == name)
            .map(|iv| iv.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn direction_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Direction::Call).unwrap(), "\"CALL\"");
        assert_eq!(Direction::Wait.to_string(), "WAIT");
    }

    #[test]
    fn decision_lookup_helpers() {
        let decision = SignalDecision {
            symbol: "EUR/USD".into(),
            interval: Interval::M5,
            direction: Direction::Call,
            confidence: 40.0,
            bull_score: 4.0,
            bear_score: 0.0,
            votes: vec![
                ConfluenceVote::bullish("rsi_oversold", 2.0),
                ConfluenceVote::bullish("macd_bull", 2.0),
            ],
            indicators: vec![IndicatorValue::new("rsi_14", 27.3)],
            price: 1.0852,
            generated_at: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
        };
        assert_eq!(decision.vote_names(), vec!["rsi_oversold", "macd_bull"]);
        assert!(decision.has_vote("macd_bull"));
        assert!(!decision.has_vote("bb_lower"));
        assert_eq!(decision.indicator("rsi_14"), Some(27.3));
        assert_eq!(decision.indicator("atr_14"), None);
    }
}
