//! C boundary for the streaming client wrappers.
//!
//! This module exposes a **stable C ABI** so the client can be driven from
//! C, Python (ctypes / cffi), Go (cgo), Java (JNI / JNA), .NET (P/Invoke),
//! and any other language with C FFI support.
//!
//! # Quick start (C)
//!
//! ```c
//! #include "tickbridge.h"
//!
//! char err[256];
//! tickbridge_handle h = 0;
//! tickbridge_live_create_ex(key, "GLBX.MDP3", 0, 1, 30, &h, err, sizeof err);
//!
//! const char *syms[] = { "ESZ5" };
//! tickbridge_live_subscribe(h, "trades", 0, syms, 1, err, sizeof err);
//! tickbridge_live_start(h, on_record, on_error, ctx, err, sizeof err);
//! /* ... */
//! tickbridge_live_stop_and_wait(h, 5000, err, sizeof err);
//! tickbridge_live_destroy(h, err, sizeof err);
//! ```
//!
//! # Handles
//!
//! Handles are opaque `uint64_t` tokens validated on every call; `0` is
//! never valid. A stale, corrupted, double-destroyed, or wrong-kind token
//! fails with a distinct negative status code instead of touching freed
//! memory.
//!
//! # Error handling
//!
//! Every fallible function returns `0` on success, `1` for an expired
//! bounded wait, and a distinct negative code per failure kind
//! ([`StatusCode`]). The caller's message buffer (pointer + capacity,
//! always NUL-terminated) receives a human-readable description.
//!
//! # Thread safety
//!
//! Any handle may be used from multiple threads concurrently; destruction
//! is race-free against in-flight calls on other threads.

pub mod handle;
pub mod live;
pub mod pull;
pub mod types;
mod util;

pub use handle::{HandleKind, HandleObject, HandleRegistry};
pub use types::{
    ErrorCallback, MetadataCallback, RecordCallback, StatusCode, TickbridgeHandle,
};

use std::os::raw::c_char;

/// Library version as a static NUL-terminated string. Never null; the
/// caller must not free it.
#[no_mangle]
pub extern "C" fn tickbridge_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

/// Number of currently registered handles. Diagnostic; a nonzero value at
/// process exit means leaked handles.
#[no_mangle]
pub extern "C" fn tickbridge_handle_count() -> usize {
    HandleRegistry::global().len()
}
