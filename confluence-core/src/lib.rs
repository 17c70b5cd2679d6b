//! Confluence Core — candle domain, indicators, confluence scoring, decision policy.
//!
//! This crate contains the signal engine:
//! - Domain types (candles, validated series, intervals, votes, decisions)
//! - Indicator library (EMA, SMA, RSI, MACD, Bollinger, Stochastic, ATR, patterns)
//! - Confluence aggregator: rule table → votes → scores → direction and confidence
//! - Decision policy gating on vote count and confidence
//! - Price series providers (TwelveData, CSV, synthetic)
//!
//! The engine is synchronous and holds no shared mutable state.

pub mod confluence;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod policy;

pub use confluence::{analyze, RuleConfig};
pub use domain::{
    Candle, CandleSeries, ConfluenceVote, Direction, IndicatorValue, Interval, SignalDecision,
    VoteDirection,
};
pub use error::ConfluenceError;
pub use policy::{classify, decide, evaluate, NoSignalReason, Thresholds, Verdict};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public engine types are Send + Sync so the runner
    /// can fan symbols out across threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<Candle>();
        require_sync::<Candle>();
        require_send::<CandleSeries>();
        require_sync::<CandleSeries>();
        require_send::<SignalDecision>();
        require_sync::<SignalDecision>();
        require_send::<Verdict>();
        require_sync::<Verdict>();

        // Configuration
        require_send::<RuleConfig>();
        require_sync::<RuleConfig>();
        require_send::<Thresholds>();
        require_sync::<Thresholds>();

        // Errors
        require_send::<ConfluenceError>();
        require_sync::<ConfluenceError>();
        require_send::<data::FetchError>();
        require_sync::<data::FetchError>();

        // Providers
        require_send::<data::TwelveDataProvider>();
        require_sync::<data::TwelveDataProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
    }

    #[test]
    fn indicators_are_object_safe_and_send_sync() {
        let boxed: Vec<Box<dyn indicators::Indicator>> = vec![
            Box::new(indicators::Rsi::new(14, indicators::RsiSmoothing::Wilder)),
            Box::new(indicators::Atr::new(14)),
        ];
        assert_eq!(boxed[0].name(), "rsi_14");
        assert_eq!(boxed[1].name(), "atr_14");
    }
}
