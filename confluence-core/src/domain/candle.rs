//! Candle and CandleSeries, the market data the engine consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interval::Interval;
use crate::error::ConfluenceError;

/// OHLCV candle for a single symbol and interval.
///
/// Volume is optional on input (many FX feeds omit it) and defaults to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// Absolute size of the real body.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Check the OHLC invariant: high >= max(open, close) >= min(open, close) >= low.
    ///
    /// Returns a short description of the first violation found.
    pub fn defect(&self) -> Option<&'static str> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Some("non-finite price");
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some("volume must be finite and non-negative");
        }
        if self.high < self.low {
            return Some("high < low");
        }
        if self.high < self.open.max(self.close) {
            return Some("high below open/close");
        }
        if self.low > self.open.min(self.close) {
            return Some("low above open/close");
        }
        None
    }

    pub fn is_sane(&self) -> bool {
        self.defect().is_none()
    }
}

/// Validated, time-ascending candles for one symbol and interval.
///
/// Only constructible through [`CandleSeries::new`], which rejects the whole
/// series on the first malformed candle. Read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleSeries {
    symbol: String,
    interval: Interval,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        candles: Vec<Candle>,
    ) -> Result<Self, ConfluenceError> {
        for (index, candle) in candles.iter().enumerate() {
            if let Some(reason) = candle.defect() {
                return Err(ConfluenceError::invalid_candle(index, reason));
            }
        }
        for (index, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(ConfluenceError::invalid_candle(
                    index + 1,
                    format!(
                        "timestamp {} does not follow {}",
                        pair[1].timestamp, pair[0].timestamp
                    ),
                ));
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            interval,
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 10, minute, 0).unwrap()
    }

    fn sample_candle() -> Candle {
        Candle::new(ts(0), 100.0, 105.0, 98.0, 103.0)
    }

    #[test]
    fn candle_is_sane() {
        assert!(sample_candle().is_sane());
    }

    #[test]
    fn candle_geometry() {
        let c = sample_candle();
        assert_eq!(c.body(), 3.0);
        assert_eq!(c.range(), 7.0);
        assert_eq!(c.upper_wick(), 2.0);
        assert_eq!(c.lower_wick(), 2.0);
        assert!(c.is_bullish());
    }

    #[test]
    fn candle_detects_non_finite() {
        let mut c = sample_candle();
        c.close = f64::NAN;
        assert_eq!(c.defect(), Some("non-finite price"));
    }

    #[test]
    fn candle_detects_high_below_low() {
        let mut c = sample_candle();
        c.high = 97.0;
        assert_eq!(c.defect(), Some("high < low"));
    }

    #[test]
    fn candle_detects_close_outside_range() {
        let mut c = sample_candle();
        c.close = 106.0;
        assert_eq!(c.defect(), Some("high below open/close"));
    }

    #[test]
    fn series_rejects_duplicate_timestamps() {
        let a = sample_candle();
        let b = Candle::new(ts(0), 103.0, 104.0, 101.0, 102.0);
        let err = CandleSeries::new("EUR/USD", Interval::M1, vec![a, b]).unwrap_err();
        assert!(matches!(err, ConfluenceError::InvalidCandle { index: 1, .. }));
    }

    #[test]
    fn series_rejects_bad_candle_anywhere() {
        let a = sample_candle();
        let mut b = Candle::new(ts(1), 103.0, 104.0, 101.0, 102.0);
        b.low = f64::INFINITY;
        let err = CandleSeries::new("EUR/USD", Interval::M1, vec![a, b]).unwrap_err();
        assert!(matches!(err, ConfluenceError::InvalidCandle { index: 1, .. }));
    }

    #[test]
    fn series_accessors() {
        let a = sample_candle();
        let b = Candle::new(ts(1), 103.0, 104.0, 101.0, 102.0).with_volume(10.0);
        let series = CandleSeries::new("EUR/USD", Interval::M1, vec![a, b]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![103.0, 102.0]);
        assert_eq!(series.last().unwrap().volume, 10.0);
        assert_eq!(series.symbol(), "EUR/USD");
    }

    #[test]
    fn volume_defaults_to_zero_when_missing() {
        let json = r#"{"timestamp":"2024-01-02T10:00:00Z","open":1.0,"high":1.2,"low":0.9,"close":1.1}"#;
        let c: Candle = serde_json::from_str(json).unwrap();
        assert_eq!(c.volume, 0.0);
    }
}
