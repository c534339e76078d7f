//! Data schemas and symbology types understood by the feed gateway.

use crate::error::BridgeError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Record schema requested in a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Schema {
    Mbo,
    Mbp1,
    Mbp10,
    Trades,
    Tbbo,
    Tcbbo,
    Ohlcv1S,
    Ohlcv1M,
    Ohlcv1H,
    Ohlcv1D,
    OhlcvEod,
    Bbo1S,
    Bbo1M,
    Cmbp1,
    Cbbo1S,
    Cbbo1M,
    Definition,
    Statistics,
    Status,
    Imbalance,
}

impl Schema {
    /// Canonical gateway name for the schema.
    pub fn as_str(self) -> &'static str {
        match self {
            Schema::Mbo => "mbo",
            Schema::Mbp1 => "mbp-1",
            Schema::Mbp10 => "mbp-10",
            Schema::Trades => "trades",
            Schema::Tbbo => "tbbo",
            Schema::Tcbbo => "tcbbo",
            Schema::Ohlcv1S => "ohlcv-1s",
            Schema::Ohlcv1M => "ohlcv-1m",
            Schema::Ohlcv1H => "ohlcv-1h",
            Schema::Ohlcv1D => "ohlcv-1d",
            Schema::OhlcvEod => "ohlcv-eod",
            Schema::Bbo1S => "bbo-1s",
            Schema::Bbo1M => "bbo-1m",
            Schema::Cmbp1 => "cmbp-1",
            Schema::Cbbo1S => "cbbo-1s",
            Schema::Cbbo1M => "cbbo-1m",
            Schema::Definition => "definition",
            Schema::Statistics => "statistics",
            Schema::Status => "status",
            Schema::Imbalance => "imbalance",
        }
    }

    /// All schemas, in gateway enumeration order.
    pub fn all() -> &'static [Schema] {
        &[
            Schema::Mbo,
            Schema::Mbp1,
            Schema::Mbp10,
            Schema::Trades,
            Schema::Tbbo,
            Schema::Tcbbo,
            Schema::Ohlcv1S,
            Schema::Ohlcv1M,
            Schema::Ohlcv1H,
            Schema::Ohlcv1D,
            Schema::OhlcvEod,
            Schema::Bbo1S,
            Schema::Bbo1M,
            Schema::Cmbp1,
            Schema::Cbbo1S,
            Schema::Cbbo1M,
            Schema::Definition,
            Schema::Statistics,
            Schema::Status,
            Schema::Imbalance,
        ]
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Schema {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mbo" => Ok(Schema::Mbo),
            "mbp-1" => Ok(Schema::Mbp1),
            "mbp-10" => Ok(Schema::Mbp10),
            "trades" => Ok(Schema::Trades),
            "tbbo" => Ok(Schema::Tbbo),
            "tcbbo" => Ok(Schema::Tcbbo),
            "ohlcv-1s" => Ok(Schema::Ohlcv1S),
            "ohlcv-1m" => Ok(Schema::Ohlcv1M),
            "ohlcv-1h" => Ok(Schema::Ohlcv1H),
            "ohlcv-1d" => Ok(Schema::Ohlcv1D),
            "ohlcv-eod" => Ok(Schema::OhlcvEod),
            "bbo-1s" => Ok(Schema::Bbo1S),
            "bbo-1m" => Ok(Schema::Bbo1M),
            "cmbp-1" => Ok(Schema::Cmbp1),
            "cbbo-1s" => Ok(Schema::Cbbo1S),
            "cbbo-1m" => Ok(Schema::Cbbo1M),
            "definition" => Ok(Schema::Definition),
            "statistics" => Ok(Schema::Statistics),
            "status" => Ok(Schema::Status),
            "imbalance" => Ok(Schema::Imbalance),
            other => Err(BridgeError::UnknownSchema(other.to_string())),
        }
    }
}

/// Symbology type for subscription symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SType {
    /// Raw ticker symbols as published by the venue.
    #[default]
    RawSymbol,
    /// Numeric instrument ids.
    InstrumentId,
}

impl SType {
    /// Integer mapping used at the boundary. Out-of-range values are
    /// rejected rather than defaulted.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(SType::RawSymbol),
            1 => Some(SType::InstrumentId),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_schema_round_trips_through_its_name() {
        for &schema in Schema::all() {
            assert_eq!(schema.as_str().parse::<Schema>().ok(), Some(schema));
        }
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let err = "mbp-100".parse::<Schema>().unwrap_err();
        assert!(matches!(err, BridgeError::UnknownSchema(s) if s == "mbp-100"));
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("MBO".parse::<Schema>().is_err());
    }
}
