//! The tri-valued sentiment domain

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel written to target cells that carry no label yet
pub const UNLABELED: i64 = -1;

/// Sentiment label: 0 negative, 2 neutral, 4 positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Polarity {
    Negative,
    Neutral,
    Positive,
}

impl Polarity {
    pub const ALL: [Polarity; 3] = [Polarity::Negative, Polarity::Neutral, Polarity::Positive];

    pub fn value(self) -> i64 {
        match self {
            Polarity::Negative => 0,
            Polarity::Neutral => 2,
            Polarity::Positive => 4,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Polarity::Negative),
            2 => Some(Polarity::Neutral),
            4 => Some(Polarity::Positive),
            _ => None,
        }
    }

    /// Parse a table cell such as `"4"` or `"4.0"`
    pub fn parse_cell(cell: &str) -> Option<Self> {
        parse_integer_cell(cell).and_then(Self::from_value)
    }
}

/// Integral value of a cell, accepting `"2"` and `"2.0"`
pub fn parse_integer_cell(cell: &str) -> Option<i64> {
    let trimmed = cell.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

impl TryFrom<i64> for Polarity {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("{} is not a polarity value (0, 2, 4)", value))
    }
}

impl From<Polarity> for i64 {
    fn from(p: Polarity) -> Self {
        p.value()
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_round_trip() {
        for p in Polarity::ALL {
            assert_eq!(Polarity::from_value(p.value()), Some(p));
        }
        assert_eq!(Polarity::from_value(1), None);
        assert_eq!(Polarity::from_value(UNLABELED), None);
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(Polarity::parse_cell(" 4 "), Some(Polarity::Positive));
        assert_eq!(Polarity::parse_cell("0.0"), Some(Polarity::Negative));
        assert_eq!(Polarity::parse_cell("2.5"), None);
        assert_eq!(Polarity::parse_cell("pos"), None);
    }

    #[test]
    fn test_serde_uses_numbers() {
        assert_eq!(serde_json::to_string(&Polarity::Positive).unwrap(), "4");
        let p: Polarity = serde_json::from_str("0").unwrap();
        assert_eq!(p, Polarity::Negative);
        assert!(serde_json::from_str::<Polarity>("3").is_err());
    }
}
