//! Candle interval.
//!
//! Accepts both the provider spelling (`5min`, `1h`, `1day`) and the trader
//! shorthand (`M5`, `H1`, `D1`). Always serializes to the provider spelling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    M1,
    M5,
    M15,
    M30,
    M45,
    H1,
    H2,
    H4,
    D1,
}

impl Interval {
    pub const ALL: [Interval; 9] = [
        Interval::M1,
        Interval::M5,
        Interval::M15,
        Interval::M30,
        Interval::M45,
        Interval::H1,
        Interval::H2,
        Interval::H4,
        Interval::D1,
    ];

    /// Provider spelling, as sent in the `interval` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::M1 => "1min",
            Interval::M5 => "5min",
            Interval::M15 => "15min",
            Interval::M30 => "30min",
            Interval::M45 => "45min",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::D1 => "1day",
        }
    }

    pub fn seconds(self) -> i64 {
        match self {
            Interval::M1 => 60,
            Interval::M5 => 300,
            Interval::M15 => 900,
            Interval::M30 => 1_800,
            Interval::M45 => 2_700,
            Interval::H1 => 3_600,
            Interval::H2 => 7_200,
            Interval::H4 => 14_400,
            Interval::D1 => 86_400,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let interval = match s.trim().to_ascii_lowercase().as_str() {
            "1min" | "m1" => Interval::M1,
            "5min" | "m5" => Interval::M5,
            "15min" | "m15" => Interval::M15,
            "30min" | "m30" => Interval::M30,
            "45min" | "m45" => Interval::M45,
            "1h" | "h1" => Interval::H1,
            "2h" | "h2" => Interval::H2,
            "4h" | "h4" => Interval::H4,
            "1day" | "d1" => Interval::D1,
            other => return Err(format!("unsupported interval: {other}")),
        };
        Ok(interval)
    }
}

impl TryFrom<String> for Interval {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_spellings() {
        assert_eq!("M5".parse::<Interval>().unwrap(), Interval::M5);
        assert_eq!("5min".parse::<Interval>().unwrap(), Interval::M5);
        assert_eq!("h1".parse::<Interval>().unwrap(), Interval::H1);
        assert_eq!("1day".parse::<Interval>().unwrap(), Interval::D1);
    }

    #[test]
    fn rejects_unknown() {
        assert!("7min".parse::<Interval>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for interval in Interval::ALL {
            assert_eq!(interval.to_string().parse::<Interval>().unwrap(), interval);
        }
    }

    #[test]
    fn serde_uses_provider_spelling() {
        let json = serde_json::to_string(&Interval::M15).unwrap();
        assert_eq!(json, "\"15min\"");
        let back: Interval = serde_json::from_str("\"M15\"").unwrap();
        assert_eq!(back, Interval::M15);
    }
}
