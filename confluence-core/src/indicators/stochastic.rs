//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over `k_period`
//! %D = SMA(%K, d_period)
//!
//! The denominator is floored at [`STOCH_EPSILON`]. A window whose range is
//! zero reads 50. Undefined leading values of both lines are filled with 50.

pub const STOCH_EPSILON: f64 = 1e-12;

const STOCH_NEUTRAL: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    d_period: usize,
) -> StochasticSeries {
    let n = high.len().min(low.len()).min(close.len());
    let mut k = vec![STOCH_NEUTRAL; n];
    let mut d = vec![STOCH_NEUTRAL; n];
    if k_period == 0 || d_period == 0 || n < k_period {
        return StochasticSeries { k, d };
    }

    for i in (k_period - 1)..n {
        let start = i + 1 - k_period;
        let hh = high[start..=i].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ll = low[start..=i].iter().copied().fold(f64::INFINITY, f64::min);
        let range = hh - ll;
        k[i] = if range <= 0.0 {
            STOCH_NEUTRAL
        } else {
            (100.0 * (close[i] - ll) / range.max(STOCH_EPSILON)).clamp(0.0, 100.0)
        };
    }

    let first_d = (k_period - 1).saturating_add(d_period - 1);
    for i in first_d..n {
        d[i] = k[i + 1 - d_period..=i].iter().sum::<f64>() / d_period as f64;
    }

    StochasticSeries { k, d }
}
