//! Signal: the outcome of one strategy run.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Entry decision. The wire strings are what the store and the notifier app read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "NO ENTRY")]
    NoEntry,
}

impl SignalType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::NoEntry => "NO ENTRY",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal type: {0:?}")]
pub struct UnknownSignalType(pub String);

impl FromStr for SignalType {
    type Err = UnknownSignalType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            "NO ENTRY" => Ok(Self::NoEntry),
            other => Err(UnknownSignalType(other.to_string())),
        }
    }
}

/// A computed signal with the context it was derived from.
///
/// `stochastic` is `None` when %K was undefined on the last bar (flat
/// high/low window). Runs that never reached the computation carry the
/// default `Some(0.0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub signal_type: SignalType,
    pub reason: String,
    pub price: f64,
    pub stochastic: Option<f64>,
    pub timestamp: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_roundtrip() {
        for t in [SignalType::Buy, SignalType::Sell, SignalType::NoEntry] {
            assert_eq!(t.as_str().parse::<SignalType>().unwrap(), t);
            assert_eq!(t.to_string(), t.as_str());
        }
    }

    #[test]
    fn no_entry_keeps_its_space() {
        let json = serde_json::to_string(&SignalType::NoEntry).unwrap();
        assert_eq!(json, "\"NO ENTRY\"");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = "HOLD".parse::<SignalType>().unwrap_err();
        assert_eq!(err, UnknownSignalType("HOLD".into()));
    }
}
