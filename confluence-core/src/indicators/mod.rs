//! Indicator library.
//!
//! Pure functions over price slices. Every series function returns a vector
//! of the same length as its input; how undefined leading values are filled
//! (NaN or a neutral reading) is documented per indicator.
//!
//! Single-series indicators the snapshot reads (EMA, RSI, ATR, VWAP) also
//! implement [`Indicator`] over candles. Multi-series indicators (MACD,
//! Bollinger, Stochastic) return a struct of lines from a free function.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod patterns;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod vwap;

pub use atr::{atr, true_range, Atr};
pub use bollinger::{bollinger, BollingerBands, MovingAverage};
pub use ema::{ema, Ema};
pub use macd::{macd, MacdSeries};
pub use patterns::{candle_patterns, support_resistance, PatternFlags, SupportResistance};
pub use rsi::{rsi, Rsi, RsiSmoothing, RSI_NEUTRAL};
pub use sma::sma;
pub use stochastic::{stochastic, StochasticSeries, STOCH_EPSILON};
pub use vwap::{vwap, Vwap};

use crate::domain::Candle;

/// An indicator computed over a whole candle history.
///
/// Output has the same length as the input. No value at index t may depend
/// on candles after t.
pub trait Indicator: Send + Sync {
    /// Label used in reports, e.g. "rsi_14" or "atr_14".
    fn name(&self) -> &str;

    /// Number of leading candles whose output is not a real reading.
    fn lookback(&self) -> usize;

    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Last value of an indicator series, if any.
pub fn latest(values: &[f64]) -> Option<f64> {
    values.last().copied()
}

/// Build candles from close prices for testing.
///
/// open = previous close (or close for the first candle), wicks of 0.1% of
/// the close on both sides, five minutes apart starting 2024-01-02 00:00 UTC.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let wick = close.abs() * 0.001;
            Candle::new(
                base + Duration::minutes(5 * i as i64),
                open,
                open.max(close) + wick,
                open.min(close) - wick,
                close,
            )
        })
        .collect()
}

/// Build candles from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Candle::new(base + Duration::minutes(5 * i as i64), open, high, low, close)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
