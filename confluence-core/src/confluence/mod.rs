//! Confluence aggregation: rule table, indicator snapshot, votes and scores.
//!
//! `analyze` is a pure function of the candle series and the rule table.
//! It never reads the clock and never caches, so two calls on the same
//! inputs always produce the same decision.

pub mod aggregator;
pub mod rules;
pub mod snapshot;

pub use aggregator::{collect_votes, Scores};
pub use rules::{
    BollingerRule, DojiRule, EmaCrossMode, EmaCrossRule, MacdMode, MacdRule, PatternRule, RsiRule,
    RuleConfig, StochasticRule, SupportResistanceRule, DEFAULT_MIN_BARS,
};
pub use snapshot::Snapshot;

use tracing::debug;

use crate::domain::{CandleSeries, SignalDecision};
use crate::error::ConfluenceError;

/// Score the most recent candle of `series` against `config`.
pub fn analyze(
    series: &CandleSeries,
    config: &RuleConfig,
) -> Result<SignalDecision, ConfluenceError> {
    config.validate()?;

    let required = config.required_bars();
    let available = series.len();
    let last = match series.last() {
        Some(candle) if available >= required => *candle,
        _ => {
            return Err(ConfluenceError::InsufficientData {
                required,
                available,
            })
        }
    };

    let snapshot = Snapshot::compute(series.candles(), config);
    let votes = collect_votes(&snapshot, config);
    let scores = Scores::from_votes(&votes);
    let direction = scores.direction();
    let confidence = scores.confidence(config.max_possible_score());

    debug!(
        symbol = series.symbol(),
        interval = %series.interval(),
        bull = scores.bull,
        bear = scores.bear,
        votes = votes.len(),
        %direction,
        confidence,
        "analysis complete"
    );

    Ok(SignalDecision {
        symbol: series.symbol().to_string(),
        interval: series.interval(),
        direction,
        confidence,
        bull_score: scores.bull,
        bear_score: scores.bear,
        votes,
        indicators: snapshot.indicator_values(),
        price: last.close,
        generated_at: last.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, Interval};
    use crate::indicators::make_candles;

    fn series(closes: &[f64]) -> CandleSeries {
        CandleSeries::new("EUR/USD", Interval::M5, make_candles(closes)).unwrap()
    }

    #[test]
    fn rejects_short_series() {
        let s = series(&[1.0; 10]);
        let err = analyze(&s, &RuleConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ConfluenceError::InsufficientData {
                required: 30,
                available: 10
            }
        );
    }

    #[test]
    fn rejects_empty_series_even_without_floor() {
        let s = CandleSeries::new("EUR/USD", Interval::M5, vec![]).unwrap();
        let mut config = RuleConfig::empty();
        config.min_bars = 0;
        assert!(matches!(
            analyze(&s, &config),
            Err(ConfluenceError::InsufficientData { available: 0, .. })
        ));
    }

    #[test]
    fn rejects_invalid_rules_before_computing() {
        let mut config = RuleConfig::default();
        config.macd = Some(MacdRule {
            fast: 26,
            slow: 12,
            ..MacdRule::default()
        });
        let s = series(&[1.0; 40]);
        assert!(matches!(
            analyze(&s, &config),
            Err(ConfluenceError::Configuration(_))
        ));
    }

    #[test]
    fn decision_carries_last_candle() {
        let closes: Vec<f64> = (0..40).map(|i| 1.1 + 0.0005 * i as f64).collect();
        let s = series(&closes);
        let decision = analyze(&s, &RuleConfig::default()).unwrap();
        assert_eq!(decision.symbol, "EUR/USD");
        assert_eq!(decision.interval, Interval::M5);
        assert_eq!(decision.price, closes[39]);
        assert_eq!(decision.generated_at, s.last().unwrap().timestamp);
        assert!(decision.indicator("rsi_14").is_some());
    }

    #[test]
    fn empty_rule_table_waits() {
        let s = series(&[1.0; 40]);
        let decision = analyze(&s, &RuleConfig::empty()).unwrap();
        assert_eq!(decision.direction, Direction::Wait);
        assert_eq!(decision.confidence, 0.0);
        assert!(decision.votes.is_empty());
    }
}
