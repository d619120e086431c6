//! Period and interval descriptors for a historical-price request.
//!
//! Both accept a fixed vocabulary of well-known values plus any other
//! non-empty string, which is passed to the provider untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} '{value}' contains whitespace")]
    Whitespace { kind: &'static str, value: String },
}

fn check_descriptor(kind: &'static str, s: &str) -> Result<(), DescriptorError> {
    if s.is_empty() {
        return Err(DescriptorError::Empty { kind });
    }
    if s.chars().any(char::is_whitespace) {
        return Err(DescriptorError::Whitespace {
            kind,
            value: s.to_string(),
        });
    }
    Ok(())
}

/// How far back the history reaches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    FiveYears,
    Max,
    /// Any other value the provider understands (e.g. `2y`, `ytd`).
    Other(String),
}

impl Period {
    pub fn as_str(&self) -> &str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::FiveYears => "5y",
            Period::Max => "max",
            Period::Other(s) => s,
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::OneYear
    }
}

impl FromStr for Period {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        check_descriptor("period", s)?;
        Ok(match s {
            "1mo" => Period::OneMonth,
            "3mo" => Period::ThreeMonths,
            "6mo" => Period::SixMonths,
            "1y" => Period::OneYear,
            "5y" => Period::FiveYears,
            "max" => Period::Max,
            other => Period::Other(other.to_string()),
        })
    }
}

impl TryFrom<String> for Period {
    type Error = DescriptorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling interval of the history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
    /// Any other value the provider understands (e.g. `1h`, `5d`).
    Other(String),
}

impl Interval {
    pub fn as_str(&self) -> &str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
            Interval::Other(s) => s,
        }
    }

    /// Sub-daily intervals (`1m`, `15m`, `1h`, ...) carry a time of day.
    pub fn is_intraday(&self) -> bool {
        match self {
            Interval::Other(s) => s.ends_with('m') || s.ends_with('h'),
            _ => false,
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Daily
    }
}

impl FromStr for Interval {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        check_descriptor("interval", s)?;
        Ok(match s {
            "1d" => Interval::Daily,
            "1wk" => Interval::Weekly,
            "1mo" => Interval::Monthly,
            other => Interval::Other(other.to_string()),
        })
    }
}

impl TryFrom<String> for Interval {
    type Error = DescriptorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Interval> for String {
    fn from(i: Interval) -> Self {
        i.as_str().to_string()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (period, interval) pair every batch of a run is fetched with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub period: Period,
    pub interval: Interval,
}

impl HistoryRequest {
    pub fn new(period: Period, interval: Interval) -> Self {
        Self { period, interval }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_periods_parse_to_variants() {
        assert_eq!("1mo".parse::<Period>().unwrap(), Period::OneMonth);
        assert_eq!("max".parse::<Period>().unwrap(), Period::Max);
        assert_eq!(" 5y ".parse::<Period>().unwrap(), Period::FiveYears);
    }

    #[test]
    fn unknown_values_pass_through() {
        let p: Period = "ytd".parse().unwrap();
        assert_eq!(p, Period::Other("ytd".into()));
        assert_eq!(p.as_str(), "ytd");

        let i: Interval = "1h".parse().unwrap();
        assert_eq!(i.to_string(), "1h");
        assert!(i.is_intraday());
    }

    #[test]
    fn monthly_interval_is_not_intraday() {
        let i: Interval = "1mo".parse().unwrap();
        assert_eq!(i, Interval::Monthly);
        assert!(!i.is_intraday());
        assert!(!Interval::Other("5d".into()).is_intraday());
    }

    #[test]
    fn empty_and_spaced_values_rejected() {
        assert!(matches!(
            "".parse::<Period>(),
            Err(DescriptorError::Empty { kind: "period" })
        ));
        assert!(matches!(
            "1 d".parse::<Interval>(),
            Err(DescriptorError::Whitespace { .. })
        ));
    }

    #[test]
    fn serde_uses_provider_strings() {
        let req = HistoryRequest::new(Period::SixMonths, Interval::Weekly);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"period":"6mo","interval":"1wk"}"#);
        let back: HistoryRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }
}
