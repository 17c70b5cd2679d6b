//! Rule table: which indicators vote, with what parameters and weight.
//!
//! Every rule is optional. A rule that is absent (`None`, or missing from a
//! TOML file) is disabled. [`RuleConfig::default`] enables the standard
//! eight-rule table; support/resistance, doji, VWAP and pin bars are opt-in.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfluenceError;
use crate::indicators::patterns::DEFAULT_DOJI_BODY_RATIO;
use crate::indicators::{MovingAverage, RsiSmoothing};

/// Floor for [`RuleConfig::required_bars`] unless overridden.
pub const DEFAULT_MIN_BARS: usize = 30;

fn default_min_bars() -> usize {
    DEFAULT_MIN_BARS
}

fn default_atr_period() -> usize {
    14
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiRule {
    pub period: usize,
    pub smoothing: RsiSmoothing,
    pub oversold: f64,
    pub overbought: f64,
    pub weight: f64,
}

impl Default for RsiRule {
    fn default() -> Self {
        Self {
            period: 14,
            smoothing: RsiSmoothing::Wilder,
            oversold: 30.0,
            overbought: 70.0,
            weight: 2.0,
        }
    }
}

/// How the EMA pair votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmaCrossMode {
    /// Vote only on the bar where fast crosses slow.
    #[default]
    Cross,
    /// Vote on every bar according to which EMA is on top.
    Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaCrossRule {
    pub fast: usize,
    pub slow: usize,
    pub mode: EmaCrossMode,
    pub weight: f64,
}

impl EmaCrossRule {
    /// 9/21 state comparison at weight 1.
    pub fn trend() -> Self {
        Self {
            mode: EmaCrossMode::Trend,
            weight: 1.0,
            ..Self::default()
        }
    }
}

impl Default for EmaCrossRule {
    fn default() -> Self {
        Self {
            fast: 9,
            slow: 21,
            mode: EmaCrossMode::Cross,
            weight: 2.0,
        }
    }
}

/// How MACD votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdMode {
    /// Vote while histogram and line agree on a side.
    #[default]
    Histogram,
    /// Vote only on the bar where the line crosses its signal.
    Cross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdRule {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub mode: MacdMode,
    pub weight: f64,
}

impl MacdRule {
    /// 12/26/9 signal-line crossover.
    pub fn cross() -> Self {
        Self {
            mode: MacdMode::Cross,
            ..Self::default()
        }
    }
}

impl Default for MacdRule {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            mode: MacdMode::Histogram,
            weight: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerRule {
    pub period: usize,
    pub k: f64,
    pub basis: MovingAverage,
    pub weight: f64,
}

impl Default for BollingerRule {
    fn default() -> Self {
        Self {
            period: 20,
            k: 2.0,
            basis: MovingAverage::Simple,
            weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticRule {
    pub k_period: usize,
    pub d_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub weight: f64,
}

impl Default for StochasticRule {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
            oversold: 20.0,
            overbought: 80.0,
            weight: 1.0,
        }
    }
}

/// Weight-only rule for the candlestick patterns and the VWAP side check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternRule {
    pub weight: f64,
}

impl Default for PatternRule {
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportResistanceRule {
    pub lookback: usize,
    /// Fraction of price, 0.002 = 0.2%.
    pub tolerance: f64,
    pub weight: f64,
}

impl Default for SupportResistanceRule {
    fn default() -> Self {
        Self {
            lookback: 20,
            tolerance: 0.002,
            weight: 1.0,
        }
    }
}

/// Doji votes neutral: it shows up in the vote list and counts toward the
/// minimum vote count, but adds to neither score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DojiRule {
    pub body_ratio: f64,
    pub weight: f64,
}

impl Default for DojiRule {
    fn default() -> Self {
        Self {
            body_ratio: DEFAULT_DOJI_BODY_RATIO,
            weight: 1.0,
        }
    }
}

/// The full rule table. Field order is the order in which votes are listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    #[serde(default)]
    pub rsi: Option<RsiRule>,
    #[serde(default)]
    pub ema_cross: Option<EmaCrossRule>,
    #[serde(default)]
    pub macd: Option<MacdRule>,
    #[serde(default)]
    pub bollinger: Option<BollingerRule>,
    #[serde(default)]
    pub stochastic: Option<StochasticRule>,
    #[serde(default)]
    pub engulfing: Option<PatternRule>,
    #[serde(default)]
    pub hammer: Option<PatternRule>,
    #[serde(default)]
    pub shooting_star: Option<PatternRule>,
    #[serde(default)]
    pub support_resistance: Option<SupportResistanceRule>,
    #[serde(default)]
    pub doji: Option<DojiRule>,
    #[serde(default)]
    pub vwap: Option<PatternRule>,
    #[serde(default)]
    pub pinbar: Option<PatternRule>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_bars: DEFAULT_MIN_BARS,
            atr_period: default_atr_period(),
            rsi: Some(RsiRule::default()),
            ema_cross: Some(EmaCrossRule::default()),
            macd: Some(MacdRule::default()),
            bollinger: Some(BollingerRule::default()),
            stochastic: Some(StochasticRule::default()),
            engulfing: Some(PatternRule::default()),
            hammer: Some(PatternRule::default()),
            shooting_star: Some(PatternRule::default()),
            support_resistance: None,
            doji: None,
            vwap: None,
            pinbar: None,
        }
    }
}

impl RuleConfig {
    /// A table with every rule disabled.
    pub fn empty() -> Self {
        Self {
            min_bars: DEFAULT_MIN_BARS,
            atr_period: default_atr_period(),
            rsi: None,
            ema_cross: None,
            macd: None,
            bollinger: None,
            stochastic: None,
            engulfing: None,
            hammer: None,
            shooting_star: None,
            support_resistance: None,
            doji: None,
            vwap: None,
            pinbar: None,
        }
    }

    /// Parse a rule table from TOML and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfluenceError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfluenceError::config(format!("failed to parse rules: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfluenceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfluenceError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfluenceError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfluenceError::config(format!("failed to serialize rules: {e}")))
    }

    pub fn validate(&self) -> Result<(), ConfluenceError> {
        check_period("atr_period", self.atr_period)?;
        if let Some(r) = &self.rsi {
            check_period("rsi.period", r.period)?;
            check_weight("rsi", r.weight)?;
            check_bands("rsi", r.oversold, r.overbought)?;
        }
        if let Some(r) = &self.ema_cross {
            check_period("ema_cross.fast", r.fast)?;
            check_period("ema_cross.slow", r.slow)?;
            check_fast_slow("ema_cross", r.fast, r.slow)?;
            check_weight("ema_cross", r.weight)?;
        }
        if let Some(r) = &self.macd {
            check_period("macd.fast", r.fast)?;
            check_period("macd.slow", r.slow)?;
            check_period("macd.signal", r.signal)?;
            check_fast_slow("macd", r.fast, r.slow)?;
            check_weight("macd", r.weight)?;
        }
        if let Some(r) = &self.bollinger {
            check_period("bollinger.period", r.period)?;
            if !r.k.is_finite() || r.k <= 0.0 {
                return Err(ConfluenceError::config(format!(
                    "bollinger.k must be positive, got {}",
                    r.k
                )));
            }
            check_weight("bollinger", r.weight)?;
        }
        if let Some(r) = &self.stochastic {
            check_period("stochastic.k_period", r.k_period)?;
            check_period("stochastic.d_period", r.d_period)?;
            check_bands("stochastic", r.oversold, r.overbought)?;
            check_weight("stochastic", r.weight)?;
        }
        for (name, rule) in [
            ("engulfing", &self.engulfing),
            ("hammer", &self.hammer),
            ("shooting_star", &self.shooting_star),
            ("vwap", &self.vwap),
            ("pinbar", &self.pinbar),
        ] {
            if let Some(r) = rule {
                check_weight(name, r.weight)?;
            }
        }
        if let Some(r) = &self.support_resistance {
            check_period("support_resistance.lookback", r.lookback)?;
            if !r.tolerance.is_finite() || r.tolerance < 0.0 || r.tolerance >= 1.0 {
                return Err(ConfluenceError::config(format!(
                    "support_resistance.tolerance must be in [0, 1), got {}",
                    r.tolerance
                )));
            }
            check_weight("support_resistance", r.weight)?;
        }
        if let Some(r) = &self.doji {
            if !r.body_ratio.is_finite() || r.body_ratio <= 0.0 || r.body_ratio > 1.0 {
                return Err(ConfluenceError::config(format!(
                    "doji.body_ratio must be in (0, 1], got {}",
                    r.body_ratio
                )));
            }
            check_weight("doji", r.weight)?;
        }
        Ok(())
    }

    /// Candles needed before [`analyze`](super::analyze) will run.
    ///
    /// The largest window any enabled rule reads, plus two bars for
    /// crossover and two-candle pattern checks, floored at `min_bars`.
    /// EMA pairs and MACD count their slow period: the seeded EMA is
    /// defined from the first bar but has not settled before then.
    pub fn required_bars(&self) -> usize {
        let windows = [
            self.rsi.as_ref().map(|r| r.period),
            self.ema_cross.as_ref().map(|r| r.slow),
            self.macd.as_ref().map(|r| r.slow),
            self.bollinger.as_ref().map(|r| r.period),
            self.stochastic
                .as_ref()
                .map(|r| r.k_period.saturating_add(r.d_period).saturating_sub(1)),
            self.support_resistance.as_ref().map(|r| r.lookback),
        ];
        let largest = windows.into_iter().flatten().max().unwrap_or(0);
        largest.saturating_add(2).max(self.min_bars)
    }

    /// Largest score either side can reach with this table.
    ///
    /// Each rule counts once per side it can vote for; neutral rules count
    /// for neither.
    pub fn max_possible_score(&self) -> f64 {
        let two_sided = [
            self.rsi.as_ref().map(|r| r.weight),
            self.ema_cross.as_ref().map(|r| r.weight),
            self.macd.as_ref().map(|r| r.weight),
            self.bollinger.as_ref().map(|r| r.weight),
            self.stochastic.as_ref().map(|r| r.weight),
            self.engulfing.as_ref().map(|r| r.weight),
            self.support_resistance.as_ref().map(|r| r.weight),
            self.vwap.as_ref().map(|r| r.weight),
            self.pinbar.as_ref().map(|r| r.weight),
        ]
        .into_iter()
        .flatten()
        .sum::<f64>();
        let bull = two_sided + self.hammer.as_ref().map_or(0.0, |r| r.weight);
        let bear = two_sided + self.shooting_star.as_ref().map_or(0.0, |r| r.weight);
        bull.max(bear)
    }

    /// Number of enabled rules.
    pub fn enabled_rules(&self) -> usize {
        [
            self.rsi.is_some(),
            self.ema_cross.is_some(),
            self.macd.is_some(),
            self.bollinger.is_some(),
            self.stochastic.is_some(),
            self.engulfing.is_some(),
            self.hammer.is_some(),
            self.shooting_star.is_some(),
            self.support_resistance.is_some(),
            self.doji.is_some(),
            self.vwap.is_some(),
            self.pinbar.is_some(),
        ]
        .iter()
        .filter(|&&on| on)
        .count()
    }

    /// BLAKE3 hex digest of the canonical JSON form.
    ///
    /// Two tables with identical rules and parameters share a fingerprint, so
    /// emitted signals can name the rule set that produced them.
    pub fn fingerprint(&self) -> String {
        // Plain numeric and enum fields only; JSON serialization cannot fail.
        let json = serde_json::to_string(self).expect("RuleConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn check_period(name: &str, period: usize) -> Result<(), ConfluenceError> {
    if period == 0 {
        return Err(ConfluenceError::config(format!("{name} must be > 0")));
    }
    Ok(())
}

fn check_weight(name: &str, weight: f64) -> Result<(), ConfluenceError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(ConfluenceError::config(format!(
            "{name}.weight must be finite and non-negative, got {weight}"
        )));
    }
    Ok(())
}

fn check_fast_slow(name: &str, fast: usize, slow: usize) -> Result<(), ConfluenceError> {
    if fast >= slow {
        return Err(ConfluenceError::config(format!(
            "{name}: fast period ({fast}) must be < slow period ({slow})"
        )));
    }
    Ok(())
}

fn check_bands(name: &str, low: f64, high: f64) -> Result<(), ConfluenceError> {
    let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
    if !in_range(low) || !in_range(high) || low >= high {
        return Err(ConfluenceError::config(format!(
            "{name}: thresholds must satisfy 0 <= oversold < overbought <= 100, got {low}/{high}"
        )));
    }
    Ok(())
}
