//! Subscription requests and their admission checks.
//!
//! Every check here runs before anything is sent to the feed, so a rejected
//! request performs no partial subscription.

use crate::error::{BridgeError, Result};
use crate::schema::{SType, Schema};

/// Upper bound on symbols per subscription.
pub const MAX_SYMBOLS: usize = 100_000;
/// Upper bound on a single symbol's byte length.
pub const MAX_SYMBOL_LEN: usize = 1_024;
/// Upper bound on the aggregate byte size of all symbols in one request.
pub const MAX_TOTAL_SYMBOL_BYTES: usize = 10 * 1024 * 1024;

/// Latest accepted replay timestamp: 2200-01-01T00:00:00Z in Unix nanoseconds.
pub const MAX_TIMESTAMP_NS: u64 = 7_258_118_400_000_000_000;

/// One subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub dataset: String,
    pub schema: Schema,
    pub stype: SType,
    pub symbols: Vec<String>,
    /// Replay start, nanoseconds since the Unix epoch. `None` subscribes from
    /// the live edge.
    pub start: Option<u64>,
    /// Request an initial snapshot before streaming updates.
    pub snapshot: bool,
}

impl Subscription {
    pub fn new(dataset: impl Into<String>, schema: Schema, symbols: Vec<String>) -> Self {
        Self {
            dataset: dataset.into(),
            schema,
            stype: SType::default(),
            symbols,
            start: None,
            snapshot: false,
        }
    }

    pub fn with_start(mut self, start_ns: u64) -> Self {
        self.start = Some(start_ns);
        self
    }

    pub fn with_snapshot(mut self) -> Self {
        self.snapshot = true;
        self
    }

    /// Admission check. Fails fast with a configuration error and leaves the
    /// feed untouched.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.is_empty() {
            return Err(BridgeError::config("dataset cannot be empty"));
        }
        if self.symbols.is_empty() {
            return Err(BridgeError::config("symbol list cannot be empty"));
        }
        if self.symbols.len() > MAX_SYMBOLS {
            return Err(BridgeError::config(format!(
                "symbol count {} exceeds maximum of {MAX_SYMBOLS}",
                self.symbols.len()
            )));
        }
        let mut total = 0usize;
        for (i, sym) in self.symbols.iter().enumerate() {
            if sym.is_empty() {
                return Err(BridgeError::config(format!("symbol at index {i} is empty")));
            }
            if sym.len() > MAX_SYMBOL_LEN {
                return Err(BridgeError::config(format!(
                    "symbol at index {i} exceeds maximum length of {MAX_SYMBOL_LEN}"
                )));
            }
            total += sym.len();
            if total > MAX_TOTAL_SYMBOL_BYTES {
                return Err(BridgeError::config(format!(
                    "total symbol data exceeds maximum of {MAX_TOTAL_SYMBOL_BYTES} bytes"
                )));
            }
        }
        if let Some(start) = self.start {
            if start > MAX_TIMESTAMP_NS {
                return Err(BridgeError::config(
                    "replay timestamp too large (after year 2200)",
                ));
            }
        }
        Ok(())
    }
}

/// Validate a boundary timestamp before it becomes a replay start.
///
/// Timestamps before the Unix epoch or after year 2200 are rejected; the
/// upper bound keeps the value well inside `u64` nanosecond range.
pub fn replay_start_from_ns(start_ns: i64) -> Result<u64> {
    if start_ns < 0 {
        return Err(BridgeError::config(
            "replay timestamp cannot be negative (before Unix epoch)",
        ));
    }
    let ns = start_ns as u64;
    if ns > MAX_TIMESTAMP_NS {
        return Err(BridgeError::config(
            "replay timestamp too large (after year 2200)",
        ));
    }
    Ok(ns)
}
