//! Diagnostic log sink handed to the feed client.
//!
//! The wrapped feed dereferences its log sink on the first diagnostic event,
//! so every client constructs a [`StderrSink`] unconditionally at creation
//! time and never passes a null sink. Crate-internal diagnostics use
//! `tracing`; this shim is only the boundary-facing stream the embedding
//! runtime can observe and tune via `tickbridge_live_set_log_level`.

use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity, ordered by ordinal: Debug < Info < Warning < Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl LogLevel {
    /// Map a boundary integer to a level. Out-of-range values are rejected.
    pub fn from_i32(level: i32) -> Option<Self> {
        match level {
            0 => Some(LogLevel::Debug),
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Warning),
            3 => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Sink for feed diagnostics.
pub trait LogSink: Send + Sync {
    /// Whether a message at `level` would be emitted.
    fn should_log(&self, level: LogLevel) -> bool;

    /// Emit one diagnostic message.
    fn receive(&self, level: LogLevel, message: &str);
}

/// Default sink: writes to stderr with a level tag and an explicit flush per
/// message, so diagnostics stay visible even on abrupt process termination.
///
/// The minimum severity is adjustable at runtime; the default is Info.
pub struct StderrSink {
    min_level: AtomicU8,
}

impl StderrSink {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            min_level: AtomicU8::new(min_level as u8),
        }
    }

    /// Change the minimum severity. Messages below it are filtered out.
    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn min_level(&self) -> LogLevel {
        match self.min_level.load(Ordering::Relaxed) {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warning,
            _ => LogLevel::Error,
        }
    }
}

impl Default for StderrSink {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl LogSink for StderrSink {
    fn should_log(&self, level: LogLevel) -> bool {
        level as u8 >= self.min_level.load(Ordering::Relaxed)
    }

    fn receive(&self, level: LogLevel, message: &str) {
        if !self.should_log(level) {
            return;
        }
        let mut err = std::io::stderr().lock();
        // Unbuffered on purpose; losing diagnostics on a crash is worse than
        // the syscall per message.
        let _ = writeln!(err, "[Tickbridge {}] {}", level.tag(), message);
        let _ = err.flush();
    }
}
