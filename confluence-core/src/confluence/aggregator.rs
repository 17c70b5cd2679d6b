//! Turn a snapshot into votes, scores, a direction and a confidence.

use crate::domain::{ConfluenceVote, Direction, VoteDirection};

use super::rules::{EmaCrossMode, MacdMode, RuleConfig};
use super::snapshot::Snapshot;

/// Fired rules in rule-table order.
pub fn collect_votes(snapshot: &Snapshot, config: &RuleConfig) -> Vec<ConfluenceVote> {
    let mut votes = Vec::new();
    let price = snapshot.price;

    if let (Some(rule), Some((_, value))) = (&config.rsi, snapshot.rsi) {
        if value < rule.oversold {
            votes.push(ConfluenceVote::bullish("rsi_oversold", rule.weight));
        } else if value > rule.overbought {
            votes.push(ConfluenceVote::bearish("rsi_overbought", rule.weight));
        }
    }

    if let (Some(rule), Some(e)) = (&config.ema_cross, &snapshot.ema) {
        match rule.mode {
            EmaCrossMode::Cross => {
                let (fast, slow) = (e.fast, e.slow);
                if fast.previous <= slow.previous && fast.current > slow.current {
                    votes.push(ConfluenceVote::bullish("ema_cross_up", rule.weight));
                } else if fast.previous >= slow.previous && fast.current < slow.current {
                    votes.push(ConfluenceVote::bearish("ema_cross_down", rule.weight));
                }
            }
            EmaCrossMode::Trend => {
                if e.fast.current > e.slow.current {
                    votes.push(ConfluenceVote::bullish("ema_trend_up", rule.weight));
                } else if e.fast.current < e.slow.current {
                    votes.push(ConfluenceVote::bearish("ema_trend_down", rule.weight));
                }
            }
        }
    }

    if let (Some(rule), Some(m)) = (&config.macd, &snapshot.macd) {
        let (line, signal) = (m.line, m.signal);
        match rule.mode {
            MacdMode::Histogram => {
                if m.histogram > 0.0 && line.current > signal.current {
                    votes.push(ConfluenceVote::bullish("macd_bull", rule.weight));
                } else if m.histogram < 0.0 && line.current < signal.current {
                    votes.push(ConfluenceVote::bearish("macd_bear", rule.weight));
                }
            }
            MacdMode::Cross => {
                if line.previous <= signal.previous && line.current > signal.current {
                    votes.push(ConfluenceVote::bullish("macd_bull_cross", rule.weight));
                } else if line.previous >= signal.previous && line.current < signal.current {
                    votes.push(ConfluenceVote::bearish("macd_bear_cross", rule.weight));
                }
            }
        }
    }

    if let (Some(rule), Some(b)) = (&config.bollinger, &snapshot.bands) {
        if b.has_width() {
            if price <= b.lower {
                votes.push(ConfluenceVote::bullish("bb_lower", rule.weight));
            } else if price >= b.upper {
                votes.push(ConfluenceVote::bearish("bb_upper", rule.weight));
            }
        }
    }

    if let (Some(rule), Some(s)) = (&config.stochastic, &snapshot.stochastic) {
        if s.k < rule.oversold {
            votes.push(ConfluenceVote::bullish("stoch_oversold", rule.weight));
        } else if s.k > rule.overbought {
            votes.push(ConfluenceVote::bearish("stoch_overbought", rule.weight));
        }
    }

    let flags = &snapshot.patterns;
    if let Some(rule) = &config.engulfing {
        if flags.bullish_engulfing {
            votes.push(ConfluenceVote::bullish("bullish_engulfing", rule.weight));
        } else if flags.bearish_engulfing {
            votes.push(ConfluenceVote::bearish("bearish_engulfing", rule.weight));
        }
    }
    if let Some(rule) = &config.hammer {
        if flags.hammer {
            votes.push(ConfluenceVote::bullish("hammer", rule.weight));
        }
    }
    if let Some(rule) = &config.shooting_star {
        if flags.shooting_star {
            votes.push(ConfluenceVote::bearish("shooting_star", rule.weight));
        }
    }

    if let (Some(rule), Some(levels)) = (&config.support_resistance, &snapshot.levels) {
        if levels.near_support {
            votes.push(ConfluenceVote::bullish("support", rule.weight));
        }
        if levels.near_resistance {
            votes.push(ConfluenceVote::bearish("resistance", rule.weight));
        }
    }

    if let Some(rule) = &config.doji {
        if flags.doji {
            votes.push(ConfluenceVote::new("doji", VoteDirection::Neutral, rule.weight));
        }
    }

    // Equal to VWAP (always the case with no volume) is no vote.
    if let (Some(rule), Some(vwap)) = (&config.vwap, snapshot.vwap) {
        if price > vwap {
            votes.push(ConfluenceVote::bullish("above_vwap", rule.weight));
        } else if price < vwap {
            votes.push(ConfluenceVote::bearish("below_vwap", rule.weight));
        }
    }

    if let Some(rule) = &config.pinbar {
        if flags.pinbar_bull {
            votes.push(ConfluenceVote::bullish("pinbar_bull", rule.weight));
        } else if flags.pinbar_bear {
            votes.push(ConfluenceVote::bearish("pinbar_bear", rule.weight));
        }
    }

    votes
}

/// Summed weights per side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scores {
    pub bull: f64,
    pub bear: f64,
}

impl Scores {
    pub fn from_votes(votes: &[ConfluenceVote]) -> Self {
        votes.iter().fold(Self::default(), |mut acc, vote| {
            match vote.direction {
                VoteDirection::Bullish => acc.bull += vote.weight,
                VoteDirection::Bearish => acc.bear += vote.weight,
                VoteDirection::Neutral => {}
            }
            acc
        })
    }

    /// CALL if bulls lead, PUT if bears lead, WAIT on any tie.
    pub fn direction(&self) -> Direction {
        if self.bull > self.bear {
            Direction::Call
        } else if self.bear > self.bull {
            Direction::Put
        } else {
            Direction::Wait
        }
    }

    /// Winning side as a percentage of `max_possible`, clamped to [0, 100].
    pub fn confidence(&self, max_possible: f64) -> f64 {
        let best = self.bull.max(self.bear);
        if best <= 0.0 || max_possible <= 0.0 {
            return 0.0;
        }
        (best / max_possible * 100.0).clamp(0.0, 100.0)
    }
}
