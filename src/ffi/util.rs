//! Pointer-handling helpers shared by the boundary entry points.

use crate::error::{BridgeError, Result};
use crate::ffi::types::StatusCode;
use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Ceiling on caller-declared message-buffer capacity. A capacity above this
/// is treated as a corrupted argument and clamped rather than trusted.
pub(crate) const MAX_MESSAGE_CAPACITY: usize = 64 * 1024;

/// Copy `msg` into a caller-owned buffer, truncating to fit.
///
/// The buffer is always NUL-terminated when it has any capacity at all; a
/// null pointer or zero capacity is a silent no-op. Multi-byte UTF-8
/// sequences are never split by the truncation.
pub(crate) fn copy_message(msg: &str, buf: *mut c_char, capacity: usize) {
    if buf.is_null() || capacity == 0 {
        return;
    }
    let capacity = capacity.min(MAX_MESSAGE_CAPACITY);
    let mut len = msg.len().min(capacity - 1);
    while len > 0 && !msg.is_char_boundary(len) {
        len -= 1;
    }
    // Caller guarantees `buf` points at `capacity` writable bytes; that is
    // the whole contract of a message-buffer parameter.
    unsafe {
        std::ptr::copy_nonoverlapping(msg.as_ptr(), buf as *mut u8, len);
        *buf.add(len) = 0;
    }
}

/// Read a caller-provided NUL-terminated string.
///
/// # Safety
///
/// `ptr`, when non-null, must point at a NUL-terminated byte sequence.
pub(crate) unsafe fn read_cstr(ptr: *const c_char, what: &str) -> Result<String> {
    if ptr.is_null() {
        return Err(BridgeError::config(format!("{what} pointer is null")));
    }
    let raw = unsafe { CStr::from_ptr(ptr) };
    raw.to_str()
        .map(str::to_owned)
        .map_err(|_| BridgeError::config(format!("{what} is not valid UTF-8")))
}

/// Copy a caller-provided array of NUL-terminated strings.
///
/// Null elements are rejected; count and length ceilings are enforced later
/// by subscription validation, which sees the owned copies.
///
/// # Safety
///
/// `symbols`, when non-null, must point at `count` valid C-string pointers.
pub(crate) unsafe fn collect_symbols(
    symbols: *const *const c_char,
    count: usize,
) -> Result<Vec<String>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if symbols.is_null() {
        return Err(BridgeError::config("symbol array pointer is null"));
    }
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let ptr = unsafe { *symbols.add(i) };
        if ptr.is_null() {
            return Err(BridgeError::config(format!("symbol at index {i} is null")));
        }
        out.push(unsafe { read_cstr(ptr, "symbol")? });
    }
    Ok(out)
}

/// Assemble a subscription from boundary arguments.
///
/// # Safety
///
/// `schema` must be NUL-terminated; `symbols`, when non-null, must point at
/// `symbol_count` valid C-string pointers.
pub(crate) unsafe fn build_subscription(
    dataset: String,
    schema: *const c_char,
    stype: i32,
    symbols: *const *const c_char,
    symbol_count: usize,
) -> Result<crate::subscription::Subscription> {
    let schema: crate::schema::Schema = unsafe { read_cstr(schema, "schema")? }.parse()?;
    let stype = crate::schema::SType::from_i32(stype)
        .ok_or_else(|| BridgeError::config(format!("unknown stype value {stype}")))?;
    let symbols = unsafe { collect_symbols(symbols, symbol_count)? };
    let mut sub = crate::subscription::Subscription::new(dataset, schema, symbols);
    sub.stype = stype;
    Ok(sub)
}

/// Run one boundary operation: no panic ever crosses, and the caller's
/// message buffer always holds a NUL-terminated string afterwards — empty on
/// success, the failure description otherwise.
pub(crate) fn boundary(
    err_buf: *mut c_char,
    err_cap: usize,
    op: impl FnOnce() -> Result<StatusCode>,
) -> i32 {
    match catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(code)) => {
            copy_message("", err_buf, err_cap);
            code as i32
        }
        Ok(Err(err)) => {
            copy_message(&err.to_string(), err_buf, err_cap);
            StatusCode::from_error(&err) as i32
        }
        Err(panic) => {
            let msg = panic_message(panic.as_ref());
            copy_message(&format!("panic in library call: {msg}"), err_buf, err_cap);
            StatusCode::Panic as i32
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Caller-supplied context pointer carried verbatim into callbacks.
///
/// The wrapper never dereferences it, only hands it back, so threading it
/// through the delivery worker is sound as long as the caller's own callback
/// contract is.
#[derive(Clone, Copy)]
pub(crate) struct UserData(pub *mut c_void);

impl UserData {
    /// Accessor rather than field access: closures that mention `self.0`
    /// would capture the raw pointer field under disjoint capture and lose
    /// the `Send` impl below; a method call captures the wrapper itself.
    pub(crate) fn get(self) -> *mut c_void {
        self.0
    }
}

unsafe impl Send for UserData {}
unsafe impl Sync for UserData {}
