//! Candlestick patterns and support/resistance touches.
//!
//! Patterns are evaluated on the last one or two candles only.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// Default body/range ratio at or below which a candle is a doji.
pub const DEFAULT_DOJI_BODY_RATIO: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFlags {
    pub bullish_engulfing: bool,
    pub bearish_engulfing: bool,
    pub hammer: bool,
    pub shooting_star: bool,
    /// Long lower wick, short upper wick, either candle color.
    pub pinbar_bull: bool,
    /// Long upper wick, short lower wick, either candle color.
    pub pinbar_bear: bool,
    pub doji: bool,
}

impl PatternFlags {
    pub fn any(&self) -> bool {
        self.bullish_engulfing
            || self.bearish_engulfing
            || self.hammer
            || self.shooting_star
            || self.pinbar_bull
            || self.pinbar_bear
            || self.doji
    }
}

/// Flag the patterns formed by the most recent candle(s).
pub fn candle_patterns(candles: &[Candle], doji_body_ratio: f64) -> PatternFlags {
    let mut flags = PatternFlags::default();
    let Some(cur) = candles.last() else {
        return flags;
    };

    if let Some(prev) = candles.len().checked_sub(2).map(|i| &candles[i]) {
        flags.bullish_engulfing = prev.is_bearish()
            && cur.is_bullish()
            && cur.close >= prev.open
            && cur.open <= prev.close;
        flags.bearish_engulfing = prev.is_bullish()
            && cur.is_bearish()
            && cur.close <= prev.open
            && cur.open >= prev.close;
    }

    let body = cur.body();
    flags.hammer =
        cur.is_bullish() && cur.lower_wick() >= 2.0 * body && cur.upper_wick() < body;
    flags.shooting_star =
        cur.is_bearish() && cur.upper_wick() >= 2.0 * body && cur.lower_wick() < body;

    let range = cur.range();
    if range > 0.0 {
        flags.pinbar_bull = cur.lower_wick() > 2.0 * body && cur.upper_wick() < body;
        flags.pinbar_bear = cur.upper_wick() > 2.0 * body && cur.lower_wick() < body;
    }
    flags.doji = range > 0.0 && body <= doji_body_ratio * range;

    flags
}

/// Lowest low / highest high over the trailing window and whether the last
/// close touches either within `tolerance` (a fraction, 0.002 = 0.2%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
    pub near_support: bool,
    pub near_resistance: bool,
}

/// `None` when there are fewer than `lookback` candles.
pub fn support_resistance(
    candles: &[Candle],
    lookback: usize,
    tolerance: f64,
) -> Option<SupportResistance> {
    if lookback == 0 || candles.len() < lookback {
        return None;
    }
    let window = &candles[candles.len() - lookback..];
    let support = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let resistance = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let close = window[lookback - 1].close;
    Some(SupportResistance {
        support,
        resistance,
        near_support: close <= support * (1.0 + tolerance),
        near_resistance: close >= resistance * (1.0 - tolerance),
    })
}
