//! Relative Strength Index (RSI).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), with two smoothing variants:
//! - Wilder: seed with the mean of the first `period` changes, then
//!   avg = (prev * (period - 1) + current) / period.
//! - Simple: rolling mean of the last `period` gains and losses.
//!
//! Lookback: period. Undefined leading values read 50 (neutral).
//! Edge cases: avg_loss == 0 → 100; both averages zero → 50.

use serde::{Deserialize, Serialize};

use super::Indicator;
use crate::domain::Candle;

/// Value used where RSI is undefined.
pub const RSI_NEUTRAL: f64 = 50.0;

/// Averaging method for gains and losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSmoothing {
    #[default]
    Wilder,
    Simple,
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    smoothing: RsiSmoothing,
    name: String,
}

impl Rsi {
    pub fn new(period: usize, smoothing: RsiSmoothing) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            smoothing,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        rsi(&closes, self.period, self.smoothing)
    }
}

/// RSI over `values`. Same length as the input.
pub fn rsi(values: &[f64], period: usize, smoothing: RsiSmoothing) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![RSI_NEUTRAL; n];
    if period == 0 || n <= period {
        return result;
    }

    // gains[i] / losses[i] describe the move from values[i-1] to values[i]
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let change = values[i] - values[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else {
            losses[i] = -change;
        }
    }

    let p = period as f64;
    let mut avg_gain = gains[1..=period].iter().sum::<f64>() / p;
    let mut avg_loss = losses[1..=period].iter().sum::<f64>() / p;
    result[period] = rsi_from_averages(avg_gain, avg_loss);

    for i in (period + 1)..n {
        match smoothing {
            RsiSmoothing::Wilder => {
                avg_gain = (avg_gain * (p - 1.0) + gains[i]) / p;
                avg_loss = (avg_loss * (p - 1.0) + losses[i]) / p;
            }
            RsiSmoothing::Simple => {
                avg_gain = gains[(i + 1 - period)..=i].iter().sum::<f64>() / p;
                avg_loss = losses[(i + 1 - period)..=i].iter().sum::<f64>() / p;
            }
        }
        result[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        RSI_NEUTRAL
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
