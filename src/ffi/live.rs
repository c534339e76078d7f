//! Push-mode boundary functions (`tickbridge_live_*`).
//!
//! Every function validates its handle token against the global registry,
//! catches panics, and reports failures both as a status code and as a
//! NUL-terminated message in the caller's buffer.

use super::handle::{HandleKind, HandleObject, HandleRegistry};
use super::types::{
    ErrorCallback, MetadataCallback, RecordCallback, StatusCode, TickbridgeHandle,
};
use super::util::{boundary, build_subscription, read_cstr, UserData};
use crate::client::{Callbacks, KeepGoing, LiveClient};
use crate::config::{LiveConfig, UpgradePolicy};
use crate::error::{BridgeError, Result};
use crate::logging::LogLevel;
use crate::record::{Metadata, Record};
use crate::subscription::replay_start_from_ns;
use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Bound on the worker join inside destroy. A worker stuck past this is
/// abandoned detached rather than blocking the caller forever.
const DESTROY_TIMEOUT: Duration = Duration::from_secs(5);

fn c_string(s: &str) -> CString {
    CString::new(s).unwrap_or_default()
}

fn registry() -> &'static HandleRegistry {
    HandleRegistry::global()
}

fn register_live(client: LiveClient, out_handle: *mut TickbridgeHandle) -> Result<StatusCode> {
    if out_handle.is_null() {
        return Err(BridgeError::config("output handle pointer is null"));
    }
    let token = registry().register(HandleObject::Live(Arc::new(client)));
    unsafe { *out_handle = token };
    Ok(StatusCode::Ok)
}

fn build_callbacks(
    on_record: RecordCallback,
    on_metadata: MetadataCallback,
    on_error: ErrorCallback,
    user_data: *mut c_void,
) -> Result<Callbacks> {
    let record_cb =
        on_record.ok_or_else(|| BridgeError::config("record callback is required"))?;
    let user = UserData(user_data);

    let mut callbacks = Callbacks::new(Box::new(move |record: &Record| {
        let keep = unsafe {
            record_cb(record.bytes.as_ref().as_ptr(), record.len(), record.rtype, user.get())
        };
        if keep == 0 {
            KeepGoing::Continue
        } else {
            KeepGoing::Stop
        }
    }));

    if let Some(metadata_cb) = on_metadata {
        callbacks = callbacks.with_metadata(Box::new(move |metadata: &Metadata| {
            match metadata.to_json() {
                Ok(json) => {
                    let len = json.len();
                    let c = c_string(&json);
                    unsafe { metadata_cb(c.as_ptr(), len, user.get()) };
                }
                Err(err) => warn!(error = %err, "failed to serialize session metadata"),
            }
        }));
    }

    if let Some(error_cb) = on_error {
        callbacks = callbacks.with_error(Box::new(move |message: &str, code: i32| {
            let c = c_string(message);
            unsafe { error_cb(c.as_ptr(), code, user.get()) };
        }));
    }

    Ok(callbacks)
}

/// Create a push-mode client with default configuration.
///
/// # Safety
///
/// `api_key` must be a valid NUL-terminated string; `out_handle` must point
/// at writable storage; `err_buf`, when non-null, must point at `err_cap`
/// writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_create(
    api_key: *const c_char,
    out_handle: *mut TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let key = unsafe { read_cstr(api_key, "api key")? };
        let config = LiveConfig::new(key)?;
        register_live(LiveClient::new(config), out_handle)
    })
}

/// Create a push-mode client with full configuration. When `dataset` is
/// non-empty the feed session is built eagerly and a bad dataset fails here
/// rather than at first subscribe.
///
/// `send_ts_out` is a boolean (non-zero = true), `upgrade_policy` maps
/// 0 to as-is and anything else to upgrade-to-latest, and `heartbeat_secs`
/// of zero or below disables heartbeats.
///
/// # Safety
///
/// Same contract as [`tickbridge_live_create`]; `dataset` may be null for
/// "not yet known".
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_create_ex(
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
        let config = LiveConfig::new(key)?
            .with_dataset(dataset.clone())
            .with_send_ts_out(send_ts_out != 0)
            .with_upgrade_policy(UpgradePolicy::from_i32(upgrade_policy))
            .with_heartbeat_secs(heartbeat_secs);
        let client = LiveClient::new(config);
        if !dataset.is_empty() {
            client.initialize()?;
        }
        register_live(client, out_handle)
    })
}

/// Subscribe to a schema over a set of symbols.
///
/// # Safety
///
/// `schema` must be NUL-terminated; `symbols` must point at `symbol_count`
/// NUL-terminated strings; `err_buf` as elsewhere.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_subscribe(
    handle: TickbridgeHandle,
    schema: *const c_char,
    stype: i32,
    symbols: *const *const c_char,
    symbol_count: usize,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = registry().resolve_live(handle)?;
        let sub = unsafe { build_subscription(client.dataset(), schema, stype, symbols, symbol_count)? };
        client.subscribe(sub)?;
        Ok(StatusCode::Ok)
    })
}

/// Subscribe with intraday replay from `start_ns` (Unix nanoseconds).
///
/// # Safety
///
/// Same contract as [`tickbridge_live_subscribe`].
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_subscribe_with_replay(
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
        let client = registry().resolve_live(handle)?;
        let sub = unsafe { build_subscription(client.dataset(), schema, stype, symbols, symbol_count)? }
            .with_start(replay_start_from_ns(start_ns)?);
        client.subscribe(sub)?;
        Ok(StatusCode::Ok)
    })
}

/// Subscribe requesting an initial snapshot before live data.
///
/// # Safety
///
/// Same contract as [`tickbridge_live_subscribe`].
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_subscribe_with_snapshot(
    handle: TickbridgeHandle,
    schema: *const c_char,
    stype: i32,
    symbols: *const *const c_char,
    symbol_count: usize,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = registry().resolve_live(handle)?;
        let sub = unsafe { build_subscription(client.dataset(), schema, stype, symbols, symbol_count)? }
            .with_snapshot();
        client.subscribe(sub)?;
        Ok(StatusCode::Ok)
    })
}

/// Begin push-mode delivery. `on_record` is required; `on_error` receives
/// stream failures (`-1` transport, `-999` callback panic).
///
/// # Safety
///
/// The callbacks and `user_data` must remain valid until the stream is
/// stopped and joined or the handle is destroyed.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_start(
    handle: TickbridgeHandle,
    on_record: RecordCallback,
    on_error: ErrorCallback,
    user_data: *mut c_void,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = registry().resolve_live(handle)?;
        let callbacks = build_callbacks(on_record, None, on_error, user_data)?;
        client.start(callbacks)?;
        Ok(StatusCode::Ok)
    })
}

/// [`tickbridge_live_start`] plus a metadata callback invoked once with the
/// session handshake metadata as JSON.
///
/// # Safety
///
/// Same contract as [`tickbridge_live_start`].
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_start_ex(
    handle: TickbridgeHandle,
    on_record: RecordCallback,
    on_metadata: MetadataCallback,
    on_error: ErrorCallback,
    user_data: *mut c_void,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = registry().resolve_live(handle)?;
        let callbacks = build_callbacks(on_record, on_metadata, on_error, user_data)?;
        client.start(callbacks)?;
        Ok(StatusCode::Ok)
    })
}

/// Request the stream to stop. Returns immediately; pair with
/// [`tickbridge_live_stop_and_wait`] for a bounded join.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_stop(
    handle: TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        registry().resolve_live(handle)?.stop();
        Ok(StatusCode::Ok)
    })
}

/// Stop the stream and wait up to `timeout_ms` for the delivery worker to
/// exit. Returns `1` if the worker is still running when the bound elapses;
/// the wait can be retried.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_stop_and_wait(
    handle: TickbridgeHandle,
    timeout_ms: u64,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = registry().resolve_live(handle)?;
        client.stop();
        client.block_for_stop(Duration::from_millis(timeout_ms))?;
        Ok(StatusCode::Ok)
    })
}

/// Re-establish the session on the existing feed instance.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_reconnect(
    handle: TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        registry().resolve_live(handle)?.reconnect()?;
        Ok(StatusCode::Ok)
    })
}

/// Re-issue every subscription made on this session.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_resubscribe(
    handle: TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        registry().resolve_live(handle)?.resubscribe()?;
        Ok(StatusCode::Ok)
    })
}

/// Write the coarse connection state to `out_state`: 0 disconnected,
/// 2 connected, 3 streaming.
///
/// # Safety
///
/// `out_state` must point at writable storage.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_connection_state(
    handle: TickbridgeHandle,
    out_state: *mut i32,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = registry().resolve_live(handle)?;
        if out_state.is_null() {
            return Err(BridgeError::config("output state pointer is null"));
        }
        unsafe { *out_state = client.connection_state() as i32 };
        Ok(StatusCode::Ok)
    })
}

/// Set the minimum diagnostic level: 0 debug, 1 info, 2 warning, 3 error.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_set_log_level(
    handle: TickbridgeHandle,
    level: i32,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let client = registry().resolve_live(handle)?;
        let level = LogLevel::from_i32(level)
            .ok_or_else(|| BridgeError::config(format!("unknown log level {level}")))?;
        client.set_log_level(level);
        Ok(StatusCode::Ok)
    })
}

/// Destroy the handle: detach it from the registry (concurrent callers see
/// a detached handle, not a dangling one), run the full shutdown sequence,
/// then retire the token. A second destroy of the same token fails with
/// `NotRegistered` and has no effect.
///
/// # Safety
///
/// `err_buf`, when non-null, must point at `err_cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tickbridge_live_destroy(
    handle: TickbridgeHandle,
    err_buf: *mut c_char,
    err_cap: usize,
) -> i32 {
    boundary(err_buf, err_cap, || {
        let object = registry().detach(handle, HandleKind::Live)?;
        if let HandleObject::Live(client) = &object {
            client.shutdown(DESTROY_TIMEOUT);
        }
        registry().remove(handle);
        drop(object);
        Ok(StatusCode::Ok)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::memory::MemoryHub;
    use bytes::Bytes;
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
    use std::thread;

    struct TestSink {
        records: AtomicUsize,
        errors: AtomicUsize,
        last_code: AtomicI32,
        stop_after: usize,
    }

    impl TestSink {
        fn new() -> Self {
            Self {
                records: AtomicUsize::new(0),
                errors: AtomicUsize::new(0),
                last_code: AtomicI32::new(0),
                stop_after: usize::MAX,
            }
        }
    }

    unsafe extern "C" fn on_record(
        _bytes: *const u8,
        _len: usize,
        _rtype: u8,
        user_data: *mut c_void,
    ) -> i32 {
        let sink = unsafe { &*(user_data as *const TestSink) };
        let seen = sink.records.fetch_add(1, Ordering::SeqCst) + 1;
        i32::from(seen >= sink.stop_after)
    }

    unsafe extern "C" fn on_error(_message: *const c_char, code: i32, user_data: *mut c_void) {
        let sink = unsafe { &*(user_data as *const TestSink) };
        sink.errors.fetch_add(1, Ordering::SeqCst);
        sink.last_code.store(code, Ordering::SeqCst);
    }

    fn err_buf() -> Vec<c_char> {
        vec![0; 256]
    }

    fn message(buf: &[c_char]) -> String {
        unsafe { CStr::from_ptr(buf.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    fn create(dataset: &str) -> TickbridgeHandle {
        let key = CString::new("db-test-key").unwrap();
        let ds = CString::new(dataset).unwrap();
        let mut handle: TickbridgeHandle = 0;
        let mut buf = err_buf();
        let rc = unsafe {
            tickbridge_live_create_ex(
                key.as_ptr(),
                ds.as_ptr(),
                0,
                1,
                30,
                &mut handle,
                buf.as_mut_ptr(),
                buf.len(),
            )
        };
        assert_eq!(rc, StatusCode::Ok as i32, "{}", message(&buf));
        handle
    }

    fn subscribe(handle: TickbridgeHandle, symbols: &[&str]) -> i32 {
        let schema = CString::new("trades").unwrap();
        let owned: Vec<CString> = symbols
            .iter()
            .map(|s| CString::new(*s).unwrap())
            .collect();
        let ptrs: Vec<*const c_char> = owned.iter().map(|s| s.as_ptr()).collect();
        let mut buf = err_buf();
        unsafe {
            tickbridge_live_subscribe(
                handle,
                schema.as_ptr(),
                0,
                ptrs.as_ptr(),
                ptrs.len(),
                buf.as_mut_ptr(),
                buf.len(),
            )
        }
    }

    fn destroy(handle: TickbridgeHandle) -> i32 {
        let mut buf = err_buf();
        unsafe { tickbridge_live_destroy(handle, buf.as_mut_ptr(), buf.len()) }
    }

    #[test]
    fn full_stream_lifecycle_over_the_boundary() {
        let hub = MemoryHub::register("test.ffi.live");
        let handle = create("test.ffi.live");
        assert_eq!(subscribe(handle, &["ESZ5"]), StatusCode::Ok as i32);

        let sink = Box::new(TestSink::new());
        let sink_ptr = &*sink as *const TestSink as *mut c_void;
        let mut buf = err_buf();
        let rc = unsafe {
            tickbridge_live_start(
                handle,
                Some(on_record),
                Some(on_error),
                sink_ptr,
                buf.as_mut_ptr(),
                buf.len(),
            )
        };
        assert_eq!(rc, StatusCode::Ok as i32, "{}", message(&buf));

        let publisher = thread::spawn(move || {
            for _ in 0..5 {
                hub.publish(Record::new(1, Bytes::from_static(b"tick")));
                thread::sleep(Duration::from_millis(10));
            }
        });
        publisher.join().expect("publisher thread");

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while sink.records.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(sink.records.load(Ordering::SeqCst) > 0);

        let mut buf = err_buf();
        let rc =
            unsafe { tickbridge_live_stop_and_wait(handle, 2_000, buf.as_mut_ptr(), buf.len()) };
        assert_eq!(rc, StatusCode::Ok as i32, "{}", message(&buf));

        assert_eq!(destroy(handle), StatusCode::Ok as i32);
        MemoryHub::unregister("test.ffi.live");
    }

    #[test]
    fn destroyed_handle_is_rejected_and_double_destroy_is_safe() {
        let _hub = MemoryHub::register("test.ffi.destroy");
        let handle = create("test.ffi.destroy");
        assert_eq!(destroy(handle), StatusCode::Ok as i32);

        assert_eq!(
            subscribe(handle, &["ESZ5"]),
            StatusCode::NotRegistered as i32
        );
        assert_eq!(destroy(handle), StatusCode::NotRegistered as i32);
        MemoryHub::unregister("test.ffi.destroy");
    }

    #[test]
    fn null_and_garbage_handles_fail_with_distinct_codes() {
        let mut buf = err_buf();
        assert_eq!(
            unsafe { tickbridge_live_stop(0, buf.as_mut_ptr(), buf.len()) },
            StatusCode::NullHandle as i32
        );
        assert_eq!(
            unsafe { tickbridge_live_stop(0xDEAD_BEEF, buf.as_mut_ptr(), buf.len()) },
            StatusCode::BadToken as i32
        );
        assert!(!message(&buf).is_empty());
    }

    #[test]
    fn unknown_schema_is_rejected_before_the_transport() {
        let hub = MemoryHub::register("test.ffi.schema");
        let handle = create("test.ffi.schema");

        let schema = CString::new("quotes-extreme").unwrap();
        let sym = CString::new("ESZ5").unwrap();
        let ptrs = [sym.as_ptr()];
        let mut buf = err_buf();
        let rc = unsafe {
            tickbridge_live_subscribe(
                handle,
                schema.as_ptr(),
                0,
                ptrs.as_ptr(),
                1,
                buf.as_mut_ptr(),
                buf.len(),
            )
        };
        assert_eq!(rc, StatusCode::UnknownSchema as i32);
        assert!(message(&buf).contains("quotes-extreme"));
        assert_eq!(hub.subscription_count(), 0);

        assert_eq!(destroy(handle), StatusCode::Ok as i32);
        MemoryHub::unregister("test.ffi.schema");
    }

    #[test]
    fn start_without_record_callback_is_invalid() {
        let _hub = MemoryHub::register("test.ffi.nocb");
        let handle = create("test.ffi.nocb");
        let mut buf = err_buf();
        let rc = unsafe {
            tickbridge_live_start(
                handle,
                None,
                None,
                std::ptr::null_mut(),
                buf.as_mut_ptr(),
                buf.len(),
            )
        };
        assert_eq!(rc, StatusCode::InvalidArgument as i32);
        assert_eq!(destroy(handle), StatusCode::Ok as i32);
        MemoryHub::unregister("test.ffi.nocb");
    }

    #[test]
    fn connection_state_tracks_the_lifecycle() {
        let _hub = MemoryHub::register("test.ffi.state");
        let key = CString::new("db-test-key").unwrap();
        let mut handle: TickbridgeHandle = 0;
        let mut buf = err_buf();
        let rc = unsafe {
            tickbridge_live_create(key.as_ptr(), &mut handle, buf.as_mut_ptr(), buf.len())
        };
        assert_eq!(rc, StatusCode::Ok as i32);

        let mut state = -1;
        let rc = unsafe {
            tickbridge_live_connection_state(handle, &mut state, buf.as_mut_ptr(), buf.len())
        };
        assert_eq!(rc, StatusCode::Ok as i32);
        assert_eq!(state, 0);

        // Subscribing builds the feed and moves the state to connected.
        let schema = CString::new("trades").unwrap();
        let sym = CString::new("ESZ5").unwrap();
        let ptrs = [sym.as_ptr()];
        let dataset = CString::new("test.ffi.state").unwrap();
        let mut handle2: TickbridgeHandle = 0;
        let rc = unsafe {
            tickbridge_live_create_ex(
                key.as_ptr(),
                dataset.as_ptr(),
                0,
                1,
                30,
                &mut handle2,
                buf.as_mut_ptr(),
                buf.len(),
            )
        };
        assert_eq!(rc, StatusCode::Ok as i32);
        let rc = unsafe {
            tickbridge_live_subscribe(
                handle2,
                schema.as_ptr(),
                0,
                ptrs.as_ptr(),
                1,
                buf.as_mut_ptr(),
                buf.len(),
            )
        };
        assert_eq!(rc, StatusCode::Ok as i32);
        let rc = unsafe {
            tickbridge_live_connection_state(handle2, &mut state, buf.as_mut_ptr(), buf.len())
        };
        assert_eq!(rc, StatusCode::Ok as i32);
        assert_eq!(state, 2);

        assert_eq!(destroy(handle), StatusCode::Ok as i32);
        assert_eq!(destroy(handle2), StatusCode::Ok as i32);
        MemoryHub::unregister("test.ffi.state");
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let _hub = MemoryHub::register("test.ffi.loglevel");
        let handle = create("test.ffi.loglevel");
        let mut buf = err_buf();
        assert_eq!(
            unsafe { tickbridge_live_set_log_level(handle, 9, buf.as_mut_ptr(), buf.len()) },
            StatusCode::InvalidArgument as i32
        );
        assert_eq!(
            unsafe { tickbridge_live_set_log_level(handle, 2, buf.as_mut_ptr(), buf.len()) },
            StatusCode::Ok as i32
        );
        assert_eq!(destroy(handle), StatusCode::Ok as i32);
        MemoryHub::unregister("test.ffi.loglevel");
    }
}
