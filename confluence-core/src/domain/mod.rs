//! Domain types: candles, intervals, votes and decisions.

pub mod candle;
pub mod decision;
pub mod interval;

pub use candle::{Candle, CandleSeries};
pub use decision::{ConfluenceVote, Direction, IndicatorValue, SignalDecision, VoteDirection};
pub use interval::Interval;
