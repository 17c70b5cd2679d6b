//! Seeded random-walk candles for offline runs and tests.
//!
//! Each (seed, symbol, interval) triple maps to its own RNG stream through
//! a BLAKE3-derived sub-seed, so a symbol's series does not depend on which
//! other symbols were requested or in what order.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{FetchError, PriceSeriesProvider};
use super::twelvedata::MAX_OUTPUT_SIZE;
use crate::domain::{Candle, CandleSeries, Interval};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    start_price: f64,
    /// Per-candle volatility as a fraction of price.
    volatility: f64,
    end: DateTime<Utc>,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 1.1,
            volatility: 0.0008,
            end: Utc
                .with_ymd_and_hms(2024, 1, 2, 12, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    /// Timestamp of the last generated candle.
    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.end = end;
        self
    }

    fn sub_seed(&self, symbol: &str, interval: Interval) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(interval.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// `size` candles ending at the configured end, at most
    /// [`MAX_OUTPUT_SIZE`] like the live feed.
    pub fn generate(&self, symbol: &str, interval: Interval, size: usize) -> Vec<Candle> {
        let size = size.min(MAX_OUTPUT_SIZE);
        let mut rng = StdRng::seed_from_u64(self.sub_seed(symbol, interval));
        let step = interval.seconds();
        let at = |i: usize| Duration::seconds(step * i as i64);
        let first = self.end - at(size.saturating_sub(1));

        let mut close = self.start_price;
        let mut candles = Vec::with_capacity(size);
        for i in 0..size {
            let open = close;
            let drift: f64 = rng.gen_range(-1.0..1.0);
            close = (open * (1.0 + drift * self.volatility)).max(f64::MIN_POSITIVE);
            let upper: f64 = rng.gen_range(0.0..0.5);
            let lower: f64 = rng.gen_range(0.0..0.5);
            let high = open.max(close) * (1.0 + upper * self.volatility);
            let low = open.min(close) * (1.0 - lower * self.volatility);
            let volume = rng.gen_range(100.0..10_000.0_f64).round();
            candles.push(
                Candle::new(first + at(i), open, high, low, close).with_volume(volume),
            );
        }
        candles
    }
}

impl PriceSeriesProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        size: usize,
    ) -> Result<CandleSeries, FetchError> {
        Ok(CandleSeries::new(
            symbol,
            interval,
            self.generate(symbol, interval, size),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_series() {
        let a = SyntheticProvider::new(7).generate("EUR/USD", Interval::M5, 50);
        let b = SyntheticProvider::new(7).generate("EUR/USD", Interval::M5, 50);
        assert_eq!(a, b);
    }

    #[test]
    fn symbols_get_independent_streams() {
        let p = SyntheticProvider::new(7);
        let eur = p.generate("EUR/USD", Interval::M5, 20);
        let gbp = p.generate("GBP/USD", Interval::M5, 20);
        assert_ne!(eur, gbp);
    }

    #[test]
    fn series_is_valid_and_ends_at_end() {
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let p = SyntheticProvider::new(1).ending_at(end);
        let series = p.fetch_series("USD/JPY", Interval::M15, 200).unwrap();
        assert_eq!(series.len(), 200);
        assert_eq!(series.last().unwrap().timestamp, end);
        assert!(series.candles().iter().all(Candle::is_sane));
    }

    #[test]
    fn oversized_request_is_clamped() {
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let p = SyntheticProvider::new(1).ending_at(end);
        let candles = p.generate("EUR/USD", Interval::M1, usize::MAX);
        assert_eq!(candles.len(), MAX_OUTPUT_SIZE);
        assert_eq!(candles.last().unwrap().timestamp, end);
        assert_eq!(
            candles[0].timestamp,
            end - Duration::minutes(MAX_OUTPUT_SIZE as i64 - 1)
        );
        assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn zero_size_is_empty() {
        let series = SyntheticProvider::new(1)
            .fetch_series("EUR/USD", Interval::M1, 0)
            .unwrap();
        assert!(series.is_empty());
    }
}
