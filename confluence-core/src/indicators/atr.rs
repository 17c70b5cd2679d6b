//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR applies Wilder smoothing (alpha = 1/period) to TR[1..], seeded with
//! the mean of the first `period` true ranges that have a previous close.
//! Lookback: period. Reported for context; no rule votes on it.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        atr(&highs, &lows, &closes, self.period)
    }
}

/// True range per index. TR[0] = high[0] - low[0] (no previous close).
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    let mut tr = Vec::with_capacity(n);
    for i in 0..n {
        let hl = high[i] - low[i];
        if i == 0 {
            tr.push(hl);
            continue;
        }
        let pc = close[i - 1];
        tr.push(hl.max((high[i] - pc).abs()).max((low[i] - pc).abs()));
    }
    tr
}

/// Wilder-smoothed ATR. Indices before `period` are NaN.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let tr = true_range(high, low, close);
    let n = tr.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n <= period {
        return result;
    }

    let p = period as f64;
    let mut prev = tr[1..=period].iter().sum::<f64>() / p;
    result[period] = prev;
    for i in (period + 1)..n {
        prev = (prev * (p - 1.0) + tr[i]) / p;
        result[i] = prev;
    }
    result
}
