//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA[0] = x[0]. Every index is defined; there is no warmup gap.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        ema(&closes, self.period)
    }
}

/// EMA of an arbitrary series. Used directly by MACD for the signal line.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return result;
    };

    let alpha = 2.0 / (period.max(1) as f64 + 1.0);
    let mut prev = first;
    result.push(prev);
    for &v in &values[1..] {
        prev = alpha * v + (1.0 - alpha) * prev;
        result.push(prev);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_input() {
        let result = ema(&[100.0, 200.0, 300.0], 1);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5, seed = 10
        // EMA[1] = 0.5*11 + 0.5*10 = 10.5
        // EMA[2] = 0.5*12 + 0.5*10.5 = 11.25
        // EMA[3] = 0.5*13 + 0.5*11.25 = 12.125
        let result = ema(&[10.0, 11.0, 12.0, 13.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert_approx(result[3], 12.125, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_same_length_and_defined_everywhere() {
        let result = ema(&[1.0, 2.0, 3.0, 4.0, 5.0], 20);
        assert_eq!(result.len(), 5);
        assert!(result.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn ema_empty_input() {
        assert!(ema(&[], 9).is_empty());
    }

    #[test]
    fn ema_constant_series_is_constant() {
        let result = ema(&[1.25; 30], 9);
        assert!(result.iter().all(|&v| (v - 1.25).abs() < DEFAULT_EPSILON));
    }

    #[test]
    fn indicator_matches_free_function() {
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let indicator = Ema::new(3);
        assert_eq!(indicator.name(), "ema_3");
        assert_eq!(indicator.lookback(), 0);
        assert_eq!(indicator.compute(&candles), ema(&closes, 3));
    }
}
