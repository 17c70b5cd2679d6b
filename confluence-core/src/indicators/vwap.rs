//! Volume Weighted Average Price (VWAP), cumulative from the first candle.
//!
//! VWAP[t] = sum(typical * volume) / sum(volume) over candles 0..=t,
//! typical = (high + low + close) / 3.
//!
//! Where no volume has traded yet (including feeds that report none at all)
//! the reading falls back to the close, so every index is defined.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Vwap {
    name: String,
}

impl Vwap {
    pub fn new() -> Self {
        Self {
            name: "vwap".to_string(),
        }
    }
}

impl Default for Vwap {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        vwap(&highs, &lows, &closes, &volumes)
    }
}

pub fn vwap(high: &[f64], low: &[f64], close: &[f64], volume: &[f64]) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len()).min(volume.len());
    let mut result = Vec::with_capacity(n);
    let mut cum_volume = 0.0;
    let mut cum_weighted = 0.0;
    for i in 0..n {
        let typical = (high[i] + low[i] + close[i]) / 3.0;
        cum_volume += volume[i];
        cum_weighted += typical * volume[i];
        result.push(if cum_volume > 0.0 {
            cum_weighted / cum_volume
        } else {
            close[i]
        });
    }
    result
}
