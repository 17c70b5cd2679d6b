//! Indicator readings at the most recent candle.
//!
//! Each enabled rule's indicators are computed once over the whole series;
//! only the last value (or last two, for crossovers) is kept. Nothing is
//! cached between calls.

use crate::domain::{Candle, IndicatorValue};
use crate::indicators::{
    bollinger, candle_patterns, latest, macd, stochastic, support_resistance, Atr, Ema,
    Indicator, PatternFlags, Rsi, SupportResistance, Vwap,
};

use super::rules::RuleConfig;

/// Value on the previous and the current candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    pub previous: f64,
    pub current: f64,
}

impl Pair {
    fn last_two(values: &[f64]) -> Self {
        let n = values.len();
        let current = values.last().copied().unwrap_or(f64::NAN);
        let previous = if n >= 2 { values[n - 2] } else { current };
        Self { previous, current }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaReading {
    pub fast_period: usize,
    pub slow_period: usize,
    pub fast: Pair,
    pub slow: Pair,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdReading {
    pub line: Pair,
    pub signal: Pair,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandsReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BandsReading {
    /// True when both bands are defined and apart.
    pub fn has_width(&self) -> bool {
        let width = self.upper - self.lower;
        width.is_finite() && width > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticReading {
    pub k: f64,
    pub d: f64,
}

/// Everything the vote rules look at, for one series and one rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub price: f64,
    pub rsi: Option<(usize, f64)>,
    pub ema: Option<EmaReading>,
    pub macd: Option<MacdReading>,
    pub bands: Option<BandsReading>,
    pub stochastic: Option<StochasticReading>,
    pub atr: Option<(usize, f64)>,
    pub vwap: Option<f64>,
    pub patterns: PatternFlags,
    pub levels: Option<SupportResistance>,
}

impl Snapshot {
    /// Readings for every enabled rule. `config` must already be validated.
    pub fn compute(candles: &[Candle], config: &RuleConfig) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let price = closes.last().copied().unwrap_or(f64::NAN);

        let rsi_reading = config.rsi.as_ref().and_then(|r| {
            latest(&Rsi::new(r.period, r.smoothing).compute(candles)).map(|v| (r.period, v))
        });

        let ema_reading = config.ema_cross.as_ref().map(|r| EmaReading {
            fast_period: r.fast,
            slow_period: r.slow,
            fast: Pair::last_two(&Ema::new(r.fast).compute(candles)),
            slow: Pair::last_two(&Ema::new(r.slow).compute(candles)),
        });

        let macd_reading = config.macd.as_ref().and_then(|r| {
            let m = macd(&closes, r.fast, r.slow, r.signal);
            Some(MacdReading {
                line: Pair::last_two(&m.line),
                signal: Pair::last_two(&m.signal),
                histogram: latest(&m.histogram)?,
            })
        });

        let bands = config.bollinger.as_ref().and_then(|r| {
            let b = bollinger(&closes, r.period, r.k, r.basis);
            Some(BandsReading {
                upper: *b.upper.last()?,
                middle: *b.middle.last()?,
                lower: *b.lower.last()?,
            })
        });

        let stoch = config.stochastic.as_ref().and_then(|r| {
            let s = stochastic(&highs, &lows, &closes, r.k_period, r.d_period);
            Some(StochasticReading {
                k: *s.k.last()?,
                d: *s.d.last()?,
            })
        });

        let atr_reading = latest(&Atr::new(config.atr_period).compute(candles))
            .filter(|v| v.is_finite())
            .map(|v| (config.atr_period, v));

        let vwap_reading = config
            .vwap
            .as_ref()
            .and_then(|_| latest(&Vwap::new().compute(candles)));

        let doji_ratio = config.doji.as_ref().map_or(
            crate::indicators::patterns::DEFAULT_DOJI_BODY_RATIO,
            |r| r.body_ratio,
        );
        let patterns = candle_patterns(candles, doji_ratio);

        let levels = config
            .support_resistance
            .as_ref()
            .and_then(|r| support_resistance(candles, r.lookback, r.tolerance));

        Self {
            price,
            rsi: rsi_reading,
            ema: ema_reading,
            macd: macd_reading,
            bands,
            stochastic: stoch,
            atr: atr_reading,
            vwap: vwap_reading,
            patterns,
            levels,
        }
    }

    /// Named readings for reports. Undefined (NaN) readings are left out.
    pub fn indicator_values(&self) -> Vec<IndicatorValue> {
        let mut out = Vec::new();
        let mut push = |name: String, value: f64| {
            if value.is_finite() {
                out.push(IndicatorValue::new(name, value));
            }
        };

        if let Some((period, value)) = self.rsi {
            push(format!("rsi_{period}"), value);
        }
        if let Some(e) = &self.ema {
            push(format!("ema_{}", e.fast_period), e.fast.current);
            push(format!("ema_{}", e.slow_period), e.slow.current);
        }
        if let Some(m) = &self.macd {
            push("macd".into(), m.line.current);
            push("macd_signal".into(), m.signal.current);
            push("macd_hist".into(), m.histogram);
        }
        if let Some(b) = &self.bands {
            push("bb_upper".into(), b.upper);
            push("bb_middle".into(), b.middle);
            push("bb_lower".into(), b.lower);
        }
        if let Some(s) = &self.stochastic {
            push("stoch_k".into(), s.k);
            push("stoch_d".into(), s.d);
        }
        if let Some((period, value)) = self.atr {
            push(format!("atr_{period}"), value);
        }
        if let Some(value) = self.vwap {
            push("vwap".into(), value);
        }
        if let Some(l) = &self.levels {
            push("support".into(), l.support);
            push("resistance".into(), l.resistance);
        }
        out
    }
}
