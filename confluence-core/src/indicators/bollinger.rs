//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA or EMA of close over `period` ([`MovingAverage`])
//! - Upper: middle + k * stddev(close, period)
//! - Lower: middle - k * stddev(close, period)
//!
//! Population stddev (divide by N) over the same window as the basis.
//! Lookback: period - 1; all three bands are NaN before that.

use serde::{Deserialize, Serialize};

use super::ema::ema;
use super::sma::sma;

/// Basis for the middle band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovingAverage {
    #[default]
    Simple,
    Exponential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerBands {
    /// Upper minus lower at index `i`. NaN where undefined.
    pub fn width(&self, i: usize) -> f64 {
        self.upper[i] - self.lower[i]
    }
}

pub fn bollinger(values: &[f64], period: usize, k: f64, basis: MovingAverage) -> BollingerBands {
    let n = values.len();
    let mut upper = vec![f64::NAN; n];
    let mut middle = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];
    if period == 0 || n < period {
        return BollingerBands {
            upper,
            middle,
            lower,
        };
    }

    let mid = match basis {
        MovingAverage::Simple => sma(values, period),
        MovingAverage::Exponential => ema(values, period),
    };

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        let sd = variance.sqrt();
        middle[i] = mid[i];
        upper[i] = mid[i] + k * sd;
        lower[i] = mid[i] - k * sd;
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}
