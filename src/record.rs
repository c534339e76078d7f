//! Record and handshake-metadata types delivered by the feed.

use crate::schema::{SType, Schema};
use bytes::Bytes;
use serde::Serialize;

/// One wire record as delivered by the feed.
///
/// `bytes` holds the full encoded record, header included, and is the exact
/// buffer exposed to caller callbacks. Callback arguments are only valid for
/// the duration of the call; `Bytes` keeps the backing storage alive while
/// the record itself is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Record type tag from the wire header.
    pub rtype: u8,
    /// Encoded record bytes.
    pub bytes: Bytes,
}

impl Record {
    pub fn new(rtype: u8, bytes: impl Into<Bytes>) -> Self {
        Self {
            rtype,
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One symbol mapping reported in handshake metadata.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SymbolMapping {
    pub raw_symbol: String,
    pub symbol: String,
}

/// Handshake metadata returned by the gateway when a session starts.
///
/// Crosses the boundary as JSON; push mode delivers it through the metadata
/// callback, pull mode returns it synchronously from `start`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Metadata {
    pub version: u8,
    pub dataset: String,
    pub schema: Option<Schema>,
    /// Session start, nanoseconds since the Unix epoch.
    pub start: u64,
    /// Session end, nanoseconds since the Unix epoch; 0 for open-ended live
    /// sessions.
    pub end: u64,
    pub limit: u64,
    pub stype_in: Option<SType>,
    pub stype_out: SType,
    pub ts_out: bool,
    pub symbol_cstr_len: usize,
    pub symbols: Vec<String>,
    pub partial: Vec<String>,
    pub not_found: Vec<String>,
    pub mappings: Vec<SymbolMapping>,
}

impl Metadata {
    /// Serialize to the JSON document handed across the boundary.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: 3,
            dataset: String::new(),
            schema: None,
            start: 0,
            end: 0,
            limit: 0,
            stype_in: Some(SType::RawSymbol),
            stype_out: SType::RawSymbol,
            ts_out: false,
            symbol_cstr_len: 71,
            symbols: Vec::new(),
            partial: Vec::new(),
            not_found: Vec::new(),
            mappings: Vec::new(),
        }
    }
}
