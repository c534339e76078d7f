//! Error types for tickbridge
//!
//! This module defines the main error type used throughout the crate and the
//! handle-validation error set surfaced across the C boundary.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for tickbridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Validation failures for opaque handle tokens.
///
/// The checks run in this order and short-circuit on the first failure, so a
/// caller always learns the *first* thing wrong with a token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    #[error("handle is null")]
    Null,

    #[error("handle token is malformed (corrupted or foreign)")]
    BadToken,

    #[error("handle is not registered (stale or already destroyed)")]
    NotRegistered,

    #[error("handle refers to a different object kind")]
    WrongKind,

    #[error("handle target has been detached (destroy in progress)")]
    Detached,
}

/// Main error type for tickbridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("invalid handle: {0}")]
    Handle(#[from] HandleError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    #[error("client not initialized")]
    NotInitialized,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("output buffer too small: {needed} bytes required, {capacity} available")]
    BufferTooSmall { needed: usize, capacity: usize },

    #[error("record callback panicked")]
    CallbackPanic,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Shorthand for a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        BridgeError::Config(msg.into())
    }

    /// Shorthand for a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        BridgeError::Transport(msg.into())
    }

    /// True for errors that represent a bounded wait expiring rather than a
    /// failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout(_))
    }
}
