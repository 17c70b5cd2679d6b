//! Moving Average Convergence Divergence (MACD).
//!
//! line = EMA(close, fast) - EMA(close, slow)
//! signal = EMA(line, signal_period)
//! histogram = line - signal
//!
//! Built on first-value-seeded EMAs, so every index is defined.

use super::ema::ema;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&line, signal);
    let histogram = line.iter().zip(&signal_line).map(|(l, s)| l - s).collect();
    MacdSeries {
        line,
        signal: signal_line,
        histogram,
    }
}
