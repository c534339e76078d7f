//! Pull-mode boundary functions (`tickbridge_pull_*`).
//!
//! The caller drives consumption: `tickbridge_pull_next_record` copies one
//! record into a caller-owned buffer per call, with a millisecond timeout to
//! make the wait bounded. No thread is spawned on the caller's behalf.

use super::handle::{HandleKind, HandleObject, HandleRegistry};
use super::types::{StatusCode, TickbridgeHandle};
use super::util::{boundary, build_subscription, read_cstr};
use crate::client::PullClient;
use crate::config::{LiveConfig, UpgradePolicy};
use crate::error::{BridgeError, Result};
use crate::subscription::replay_start_from_ns;
use std::os::raw::c_char;
use std::sync::Arc;
use std::time::Duration;

fn registry() -> &'static HandleRegistry {
    HandleRegistry::global()
}

/// Create a pull-mode client. When `dataset` is non-empty the feed session
/// is built eagerly; otherwise the first subscription supplies it.
///
/// # Safety
///
/// `api_key` must be NUL-terminated; `dataset` may be null; `out_handle`
/// must point at writable storage; `err_buf`, when non-null, must point at
/// `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_create(
    api_key: *const c_char,
    dataset: *const c_char,
    send_ts_out: i32,
    upgrade_policy: i32,
    heartbeat_secs: i32,
    out_handle: *mut TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let key = unsafe { read_cstr(api_key, "api key")? };
        let dataset = if dataset.is_null() {
            String::new()
        } else {
            unsafe { read_cstr(dataset, "dataset")? }
        };
        if out_handle.is_null() {
            return Err(BridgeError::config("output handle pointer is null"));
        }
        let config = LiveConfig::new(key)?
            .with_dataset(dataset.clone())
            .with_send_ts_out(send_ts_out != 0)
            .with_upgrade_policy(UpgradePolicy::from_i32(upgrade_policy))
            .with_heartbeat_secs(heartbeat_secs);
        let client = PullClient::new(config);
        if !dataset.is_empty() {
            client.initialize()?;
        }
        let token = registry().register(HandleObject::Pull(Arc::new(client)));
        unsafe { *out_handle = token };
        Ok(StatusCode::Ok)
    })
}

fn resolve(handle: TickbridgeHandle) -> Result<Arc<PullClient>> {
    Ok(registry().resolve_pull(handle)?)
}

/// Subscribe to a schema over a set of symbols.
///
/// # Safety
///
/// `schema` must be NUL-terminated; `symbols` must point at `symbol_count`
/// NUL-terminated strings; `err_buf` as elsewhere.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_subscribe(
    handle: TickbridgeHandle,
    schema: *const c_char,
    stype: i32,
    symbols: *const *const c_char,
    symbol_count: usize,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = resolve(handle)?;
        let sub =
            unsafe { build_subscription(client.dataset(), schema, stype, symbols, symbol_count)? };
        client.subscribe(sub)?;
        Ok(StatusCode::Ok)
    })
}

/// Subscribe with intraday replay from `start_ns` (Unix nanoseconds).
///
/// # Safety
///
/// Same contract as [`tickbridge_pull_subscribe`].
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_subscribe_with_replay(
    handle: TickbridgeHandle,
    schema: *const c_char,
    stype: i32,
    symbols: *const *const c_char,
    symbol_count: usize,
    start_ns: i64,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = resolve(handle)?;
        let sub =
            unsafe { build_subscription(client.dataset(), schema, stype, symbols, symbol_count)? }
                .with_start(replay_start_from_ns(start_ns)?);
        client.subscribe(sub)?;
        Ok(StatusCode::Ok)
    })
}

/// Subscribe requesting an initial snapshot before live data.
///
/// # Safety
///
/// Same contract as [`tickbridge_pull_subscribe`].
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_subscribe_with_snapshot(
    handle: TickbridgeHandle,
    schema: *const c_char,
    stype: i32,
    symbols: *const *const c_char,
    symbol_count: usize,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = resolve(handle)?;
        let sub =
            unsafe { build_subscription(client.dataset(), schema, stype, symbols, symbol_count)? }
                .with_snapshot();
        client.subscribe(sub)?;
        Ok(StatusCode::Ok)
    })
}

/// Complete the session handshake and write the metadata as NUL-terminated
/// JSON into `out_json`. `out_len` receives the JSON length (or, on
/// `BufferTooSmall`, the capacity required including the terminator).
///
/// # Safety
///
/// `out_json` must point at `json_cap` writable bytes; `out_len` must point
/// at writable storage.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_start(
    handle: TickbridgeHandle,
    out_json: *mut c_char,
    json_cap: usize,
    out_len: *mut usize,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = resolve(handle)?;
        if out_json.is_null() || out_len.is_null() {
            return Err(BridgeError::config("output pointer is null"));
        }
        let metadata = client.start()?;
        let json = metadata.to_json()?;
        if json.len() + 1 > json_cap {
            unsafe { *out_len = json.len() + 1 };
            return Err(BridgeError::BufferTooSmall {
                needed: json.len() + 1,
                capacity: json_cap,
            });
        }
        // Fits by the check above; copied directly so metadata larger than
        // the diagnostic-message clamp is not truncated.
        unsafe {
            std::ptr::copy_nonoverlapping(json.as_ptr(), out_json as *mut u8, json.len());
            *out_json.add(json.len()) = 0;
            *out_len = json.len();
        }
        Ok(StatusCode::Ok)
    })
}

/// Fetch the next record into a caller-owned buffer.
///
/// Returns `0` with the record copied and `out_len`/`out_rtype` filled,
/// `1` when `timeout_ms` elapsed with no record (`out_len` is zeroed), or a
/// negative code on failure. A negative `timeout_ms` blocks indefinitely.
///
/// # Safety
///
/// `out_buf` must point at `buf_cap` writable bytes; `out_len` and
/// `out_rtype` must point at writable storage.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_next_record(
    handle: TickbridgeHandle,
    out_buf: *mut u8,
    buf_cap: usize,
    out_len: *mut usize,
    out_rtype: *mut u8,
    timeout_ms: i64,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = resolve(handle)?;
        if out_len.is_null() || out_rtype.is_null() {
            return Err(BridgeError::config("output pointer is null"));
        }
        let timeout = if timeout_ms < 0 {
            None
        } else {
            Some(Duration::from_millis(timeout_ms as u64))
        };
        match client.next_record(timeout)? {
            None => {
                unsafe { *out_len = 0 };
                Ok(StatusCode::TimedOut)
            }
            Some(record) => {
                if record.len() > buf_cap {
                    unsafe { *out_len = record.len() };
                    return Err(BridgeError::BufferTooSmall {
                        needed: record.len(),
                        capacity: buf_cap,
                    });
                }
                // An empty record never touches `out_buf`; even a zero-length
                // copy through a null pointer would be undefined behavior.
                if !record.is_empty() {
                    if out_buf.is_null() {
                        return Err(BridgeError::config("record buffer pointer is null"));
                    }
                    unsafe {
                        std::ptr::copy_nonoverlapping(
                            record.bytes.as_ref().as_ptr(),
                            out_buf,
                            record.len(),
                        );
                    }
                }
                unsafe {
                    *out_len = record.len();
                    *out_rtype = record.rtype;
                }
                Ok(StatusCode::Ok)
            }
        }
    })
}

/// Re-establish the session on the existing feed instance.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_reconnect(
    handle: TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        resolve(handle)?.reconnect()?;
        Ok(StatusCode::Ok)
    })
}

/// Re-issue every subscription made on this session.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_resubscribe(
    handle: TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        resolve(handle)?.resubscribe()?;
        Ok(StatusCode::Ok)
    })
}

/// Tell the transport to stop delivering. Idempotent.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_stop(
    handle: TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        resolve(handle)?.stop();
        Ok(StatusCode::Ok)
    })
}

/// Destroy the handle: detach, release the feed, retire the token. A second
/// destroy of the same token fails with `NotRegistered` and has no effect.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_pull_destroy(
    handle: TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let object = registry().detach(handle, HandleKind::Pull)?;
        if let HandleObject::Pull(client) = &object {
            client.stop();
        }
        registry().remove(handle);
        drop(object);
        Ok(StatusCode::Ok)
    })
}
