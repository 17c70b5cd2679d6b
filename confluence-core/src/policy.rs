//! Decision policy: whether a decision is strong enough to emit.

use serde::{Deserialize, Serialize};

use crate::confluence::{analyze, RuleConfig};
use crate::domain::{CandleSeries, Direction, SignalDecision};
use crate::error::ConfluenceError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum number of fired rules, neutral ones included.
    pub min_votes: usize,
    /// Minimum confidence, in percent.
    pub min_confidence: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_votes: 5,
            min_confidence: 90.0,
        }
    }
}

impl Thresholds {
    pub fn new(min_votes: usize, min_confidence: f64) -> Self {
        Self {
            min_votes,
            min_confidence,
        }
    }

    pub fn validate(&self) -> Result<(), ConfluenceError> {
        if !self.min_confidence.is_finite() || !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(ConfluenceError::Configuration(format!(
                "min_confidence must be in [0, 100], got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }
}

/// Why a decision was not emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSignalReason {
    Wait,
    TooFewVotes,
    LowConfidence,
}

/// A decision that passed the thresholds, or one that did not and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verdict {
    Signal(SignalDecision),
    NoSignal {
        decision: SignalDecision,
        reason: NoSignalReason,
    },
}

impl Verdict {
    pub fn decision(&self) -> &SignalDecision {
        match self {
            Verdict::Signal(decision) => decision,
            Verdict::NoSignal { decision, .. } => decision,
        }
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, Verdict::Signal(_))
    }

    pub fn into_signal(self) -> Option<SignalDecision> {
        match self {
            Verdict::Signal(decision) => Some(decision),
            Verdict::NoSignal { .. } => None,
        }
    }
}

/// True iff the decision has a direction, enough votes and enough confidence.
pub fn decide(decision: &SignalDecision, min_votes: usize, min_confidence: f64) -> bool {
    decision.direction != Direction::Wait
        && decision.votes.len() >= min_votes
        && decision.confidence >= min_confidence
}

/// Same gate as [`decide`], naming the first failed condition.
pub fn classify(decision: SignalDecision, thresholds: &Thresholds) -> Verdict {
    let reason = if decision.direction == Direction::Wait {
        Some(NoSignalReason::Wait)
    } else if decision.votes.len() < thresholds.min_votes {
        Some(NoSignalReason::TooFewVotes)
    } else if decision.confidence < thresholds.min_confidence {
        Some(NoSignalReason::LowConfidence)
    } else {
        None
    };
    match reason {
        None => Verdict::Signal(decision),
        Some(reason) => Verdict::NoSignal { decision, reason },
    }
}

/// `analyze` followed by `classify`.
pub fn evaluate(
    series: &CandleSeries,
    config: &RuleConfig,
    thresholds: &Thresholds,
) -> Result<Verdict, ConfluenceError> {
    thresholds.validate()?;
    let decision = analyze(series, config)?;
    Ok(classify(decision, thresholds))
}
