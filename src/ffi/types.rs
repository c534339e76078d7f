//! C-compatible types for the boundary layer.
//!
//! Everything here has a stable ABI layout so it can be consumed from C,
//! Python (ctypes/cffi), Go (cgo), Java (JNI/JNA), .NET (P/Invoke), and any
//! other language with C FFI support.

use crate::error::{BridgeError, HandleError};
use std::os::raw::{c_char, c_void};

/// Opaque handle token.
///
/// Issued by `tickbridge_live_create` / `tickbridge_pull_create` and
/// validated on every call. The value is a token, not an address; `0` is
/// never a valid handle.
pub type TickbridgeHandle = u64;

/// Invoked once per delivered record. `bytes` points at `len` bytes of the
/// raw record payload and is only valid for the duration of the call;
/// `rtype` is the record's type discriminant. Return `0` to keep streaming,
/// any other value to stop.
pub type RecordCallback =
    Option<unsafe extern "C" fn(bytes: *const u8, len: usize, rtype: u8, user_data: *mut c_void) -> i32>;

/// Invoked once with the session handshake metadata as a NUL-terminated JSON
/// string of `len` bytes. The pointer is only valid for the duration of the
/// call.
pub type MetadataCallback =
    Option<unsafe extern "C" fn(json: *const c_char, len: usize, user_data: *mut c_void)>;

/// Invoked on stream errors with a NUL-terminated message and a reserved
/// code. `-999` is a panic inside the record callback; `-1` is a transport
/// failure.
pub type ErrorCallback =
    Option<unsafe extern "C" fn(message: *const c_char, code: i32, user_data: *mut c_void)>;

/// Status codes returned by every fallible boundary function.
///
/// `0` is success and `1` is the one reserved positive value, a timeout on a
/// bounded wait. Every failure is a distinct negative so callers can branch
/// without parsing the message buffer.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Operation completed successfully.
    Ok = 0,
    /// A bounded wait elapsed before the condition held. Not a failure.
    TimedOut = 1,
    /// The handle argument was zero.
    NullHandle = -2,
    /// The handle's tag or generation bits are malformed; the value was
    /// never issued by this library or has been corrupted.
    BadToken = -3,
    /// The handle is not (or no longer) registered.
    NotRegistered = -4,
    /// The handle refers to an object of a different kind.
    WrongKind = -5,
    /// The handle's target is being destroyed by another thread.
    Detached = -6,
    /// A non-handle argument failed validation.
    InvalidArgument = -7,
    /// The schema name is not one of the supported set.
    UnknownSchema = -8,
    /// The operation needs a feed session that has not been built yet.
    NotInitialized = -9,
    /// The transport reported a failure.
    Transport = -10,
    /// The stream was fail-stopped after a panic in a caller callback.
    CallbackPanic = -11,
    /// The caller-provided output buffer is too small for the result.
    BufferTooSmall = -12,
    /// Serializing the result failed.
    Serialization = -13,
    /// A panic was caught at the boundary.
    Panic = -14,
    /// Invariant violation inside the library.
    Internal = -15,
}

impl StatusCode {
    pub fn from_handle_error(err: &HandleError) -> Self {
        match err {
            HandleError::Null => StatusCode::NullHandle,
            HandleError::BadToken => StatusCode::BadToken,
            HandleError::NotRegistered => StatusCode::NotRegistered,
            HandleError::WrongKind => StatusCode::WrongKind,
            HandleError::Detached => StatusCode::Detached,
        }
    }

    pub fn from_error(err: &BridgeError) -> Self {
        match err {
            BridgeError::Handle(handle) => Self::from_handle_error(handle),
            BridgeError::Config(_) => StatusCode::InvalidArgument,
            BridgeError::UnknownSchema(_) => StatusCode::UnknownSchema,
            BridgeError::NotInitialized => StatusCode::NotInitialized,
            BridgeError::Transport(_) => StatusCode::Transport,
            BridgeError::Timeout(_) => StatusCode::TimedOut,
            BridgeError::BufferTooSmall { .. } => StatusCode::BufferTooSmall,
            BridgeError::CallbackPanic => StatusCode::CallbackPanic,
            BridgeError::Serialization(_) => StatusCode::Serialization,
            BridgeError::Internal(_) => StatusCode::Internal,
        }
    }
}
