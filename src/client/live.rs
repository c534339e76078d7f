//! Push-mode streaming client.
//!
//! The wrapper owns the delivery thread, the caller's callback set, and the
//! shutdown protocol. Records flow: feed session → owned worker thread →
//! callback-invocation lock → caller callback. The worker is the only thread
//! that ever runs caller code, and it is joined before the wrapper's state is
//! released, so a callback can never observe freed state.

use crate::client::{
    Callbacks, ConnectionState, KeepGoing, CALLBACK_PANIC_CODE, TRANSPORT_ERROR_CODE,
};
use crate::config::LiveConfig;
use crate::error::{BridgeError, Result};
use crate::feed::{self, Feed};
use crate::logging::{LogLevel, LogSink, StderrSink};
use crate::record::{Metadata, Record};
use crate::subscription::Subscription;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// How long the worker waits on the feed before re-checking the running flag.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Bound on the join performed when a client is dropped without an explicit
/// shutdown.
const DROP_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// State shared between the wrapper and its delivery worker.
struct Shared {
    /// Checked on every message with acquire ordering; cleared with release
    /// ordering by stop/shutdown so the worker's next check observes it
    /// without taking the callback lock.
    running: AtomicBool,
    /// The callback-invocation lock. Acquiring it during shutdown phase 3 is
    /// the proof that no callback is mid-execution.
    callbacks: Mutex<Option<Callbacks>>,
    /// Records delivered without incident, used to name the offender when a
    /// callback fails.
    delivered: AtomicU64,
    /// Boundary-facing diagnostic stream; stream failures are echoed here as
    /// well as through the error callback.
    log_sink: Arc<StderrSink>,
}

impl Shared {
    /// One delivery, exactly in protocol order: lock, re-check running,
    /// invoke, convert a panic to a single error-callback report plus
    /// fail-stop, unlock, report whether to continue.
    fn deliver_record(&self, record: &Record) -> KeepGoing {
        let mut guard = self.callbacks.lock();
        if !self.running.load(Ordering::Acquire) {
            return KeepGoing::Stop;
        }
        if let Some(cbs) = guard.as_mut() {
            let delivered = self.delivered.load(Ordering::Relaxed);
            match panic::catch_unwind(AssertUnwindSafe(|| (cbs.on_record)(record))) {
                Ok(keep) => {
                    self.delivered.store(delivered + 1, Ordering::Relaxed);
                    if keep == KeepGoing::Stop {
                        self.running.store(false, Ordering::Release);
                    }
                }
                Err(_) => {
                    // Fail-stop: the caller's object graph is in an unknown
                    // state, so the whole stream halts rather than skipping.
                    warn!(
                        rtype = record.rtype,
                        delivered, "record callback panicked; stopping stream"
                    );
                    let msg = format!(
                        "record callback panicked on record rtype {:#04x} after {delivered} deliveries",
                        record.rtype
                    );
                    self.log_sink.receive(LogLevel::Error, &msg);
                    if let Some(on_error) = &cbs.on_error {
                        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
                            on_error(&msg, CALLBACK_PANIC_CODE)
                        }));
                    }
                    self.running.store(false, Ordering::Release);
                }
            }
        }
        drop(guard);
        if self.running.load(Ordering::Acquire) {
            KeepGoing::Continue
        } else {
            KeepGoing::Stop
        }
    }

    fn deliver_metadata(&self, metadata: &Metadata) {
        let mut guard = self.callbacks.lock();
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        if let Some(cbs) = guard.as_mut() {
            if let Some(on_metadata) = cbs.on_metadata.as_mut() {
                if panic::catch_unwind(AssertUnwindSafe(|| on_metadata(metadata))).is_err() {
                    // Same fail-stop rule as a record-callback panic: the
                    // caller's state is suspect, so the stream halts.
                    warn!("metadata callback panicked; stopping stream");
                    let msg = "metadata callback panicked";
                    self.log_sink.receive(LogLevel::Error, msg);
                    if let Some(on_error) = &cbs.on_error {
                        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
                            on_error(msg, CALLBACK_PANIC_CODE)
                        }));
                    }
                    self.running.store(false, Ordering::Release);
                }
            }
        }
    }

    fn report_error(&self, message: &str, code: i32) {
        self.log_sink.receive(LogLevel::Error, message);
        let guard = self.callbacks.lock();
        if let Some(cbs) = guard.as_ref() {
            if let Some(on_error) = &cbs.on_error {
                let _ = panic::catch_unwind(AssertUnwindSafe(|| on_error(message, code)));
            }
        }
    }
}

struct Worker {
    handle: JoinHandle<()>,
    done_rx: Receiver<()>,
}

/// Push-mode streaming client wrapper.
pub struct LiveClient {
    config: Mutex<LiveConfig>,
    log_sink: Arc<StderrSink>,
    /// Built at most once per wrapper; reconnect operates on the same
    /// instance, never a rebuild.
    feed: Mutex<Option<Arc<dyn Feed>>>,
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl LiveClient {
    /// Create an unconnected client. The feed is built lazily by the first
    /// subscribe, or eagerly via [`LiveClient::initialize`].
    pub fn new(config: LiveConfig) -> Self {
        let log_sink = Arc::new(StderrSink::default());
        Self {
            config: Mutex::new(config),
            log_sink: Arc::clone(&log_sink),
            feed: Mutex::new(None),
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                callbacks: Mutex::new(None),
                delivered: AtomicU64::new(0),
                log_sink: Arc::clone(&log_sink),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Build the feed now. Requires the dataset to be configured.
    pub fn initialize(&self) -> Result<()> {
        self.ensure_feed().map(|_| ())
    }

    /// Whether the underlying feed has been built.
    pub fn is_initialized(&self) -> bool {
        self.feed.lock().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// The boundary-facing diagnostic sink. Never null by construction.
    pub fn log_sink(&self) -> &Arc<StderrSink> {
        &self.log_sink
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.log_sink.set_min_level(level);
    }

    /// The configured dataset; empty until set by config or first subscribe.
    pub fn dataset(&self) -> String {
        self.config.lock().dataset.clone()
    }

    /// Build-under-lock: the mutex held across construction guarantees
    /// exactly one feed even when first callers race.
    fn ensure_feed(&self) -> Result<Arc<dyn Feed>> {
        let mut guard = self.feed.lock();
        if let Some(existing) = guard.as_ref() {
            return Ok(Arc::clone(existing));
        }
        let config = self.config.lock().clone();
        let built = feed::connect(&config)?;
        *guard = Some(Arc::clone(&built));
        debug!(dataset = %config.dataset, "feed session built");
        Ok(built)
    }

    fn current_feed(&self) -> Result<Arc<dyn Feed>> {
        self.feed.lock().clone().ok_or(BridgeError::NotInitialized)
    }

    /// Validate and issue one subscription. A rejected request performs no
    /// partial subscription and does not build the feed.
    pub fn subscribe(&self, sub: Subscription) -> Result<()> {
        sub.validate()?;
        {
            let mut config = self.config.lock();
            if config.dataset.is_empty() {
                config.dataset = sub.dataset.clone();
            }
        }
        let feed = self.ensure_feed()?;
        feed.subscribe(&sub)
    }

    /// Begin push-mode delivery.
    ///
    /// Spawns the delivery worker, which completes the handshake, reports
    /// metadata through the optional metadata callback, then streams records
    /// into the record callback. Fails with `NotInitialized` before the feed
    /// is built, and refuses to start while a previous stream is active.
    pub fn start(&self, callbacks: Callbacks) -> Result<()> {
        let feed = self.current_feed()?;
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(BridgeError::Internal(
                "stream already started; stop and wait before restarting".into(),
            ));
        }
        *self.shared.callbacks.lock() = Some(callbacks);
        self.shared.delivered.store(0, Ordering::Relaxed);
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let (done_tx, done_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("tickbridge-live".into())
            .spawn(move || deliver_loop(shared, feed, done_tx))
            .map_err(|e| {
                self.shared.running.store(false, Ordering::Release);
                BridgeError::Internal(format!("failed to spawn delivery thread: {e}"))
            })?;
        *worker = Some(Worker { handle, done_rx });
        Ok(())
    }

    /// Phase 1 only: request the stream to stop. Non-destructive; the caller
    /// may later resume with [`LiveClient::start`] or proceed to destroy.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
    }

    /// Bounded wait for the delivery worker to exit, then join it.
    ///
    /// Returns `Timeout` if the worker is still running when the bound
    /// elapses; the worker is left in place so the wait can be retried.
    ///
    /// The worker lock is held for the whole wait. The delivery thread never
    /// takes it, so this cannot deadlock, and it keeps a concurrent `start`
    /// from observing an empty slot and spawning a second worker mid-wait.
    pub fn block_for_stop(&self, timeout: Duration) -> Result<()> {
        let mut guard = self.worker.lock();
        let Some(worker) = guard.as_ref() else {
            return Ok(());
        };
        match worker.done_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(worker) = guard.take() {
                    let _ = worker.handle.join();
                }
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => Err(BridgeError::Timeout(timeout)),
        }
    }

    /// The four-phase teardown. Each phase is a precondition for the next:
    /// (1) clear the running flag so any in-flight delivery observes it,
    /// (2) bounded join of the worker, (3) acquire the callback lock —
    /// uncontended by now, but the acquisition proves no callback is
    /// mid-execution — and drop the callback set, (4) release the feed.
    /// Errors during teardown are swallowed; cleanup must complete.
    pub fn shutdown(&self, timeout: Duration) {
        self.shared.running.store(false, Ordering::Release);
        if let Err(err) = self.block_for_stop(timeout) {
            warn!(error = %err, "delivery worker did not exit within shutdown bound");
        }
        drop(self.shared.callbacks.lock().take());
        self.feed.lock().take();
    }

    /// Re-establish the session on the existing feed instance.
    pub fn reconnect(&self) -> Result<()> {
        let feed = self.current_feed()?;
        self.shared.running.store(false, Ordering::Release);
        feed.reconnect()
    }

    /// Re-issue every subscription made on the existing feed instance.
    pub fn resubscribe(&self) -> Result<()> {
        self.current_feed()?.resubscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        if !self.is_initialized() {
            ConnectionState::Disconnected
        } else if self.is_running() {
            ConnectionState::Streaming
        } else {
            ConnectionState::Connected
        }
    }
}

impl std::fmt::Debug for LiveClient {
    // Manual impl: the callback set and feed are unprintable trait objects.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveClient")
            .field("dataset", &self.dataset())
            .field("initialized", &self.is_initialized())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        self.shutdown(DROP_SHUTDOWN_TIMEOUT);
    }
}

/// Delivery worker body: handshake, then poll-and-deliver until stopped or
/// the transport fails. Exit is signalled on `done` and is the sole
/// mechanism `block_for_stop` waits on.
fn deliver_loop(shared: Arc<Shared>, feed: Arc<dyn Feed>, done: Sender<()>) {
    match feed.start() {
        Ok(metadata) => shared.deliver_metadata(&metadata),
        Err(err) => {
            shared.report_error(&err.to_string(), TRANSPORT_ERROR_CODE);
            shared.running.store(false, Ordering::Release);
        }
    }

    while shared.running.load(Ordering::Acquire) {
        match feed.recv(Some(POLL_INTERVAL)) {
            Ok(None) => continue,
            Ok(Some(record)) => {
                if shared.deliver_record(&record) == KeepGoing::Stop {
                    break;
                }
            }
            Err(err) => {
                shared.report_error(&err.to_string(), TRANSPORT_ERROR_CODE);
                shared.running.store(false, Ordering::Release);
                break;
            }
        }
    }

    feed.stop();
    debug!("delivery worker exited");
    let _ = done.send(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::memory::MemoryHub;
    use crate::schema::Schema;
    use bytes::Bytes;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    fn client_for(dataset: &str) -> LiveClient {
        LiveClient::new(
            LiveConfig::new("db-test-key")
                .expect("valid key")
                .with_dataset(dataset),
        )
    }

    fn sub_for(dataset: &str) -> Subscription {
        Subscription::new(dataset, Schema::Trades, vec!["ESZ5".into()])
    }

    fn record(rtype: u8) -> Record {
        Record::new(rtype, Bytes::from_static(b"\xde\xad\xbe\xef"))
    }

    #[test]
    fn racing_first_callers_build_exactly_one_feed() {
        let hub = MemoryHub::register("test.live.race");
        let client = Arc::new(client_for("test.live.race"));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let client = Arc::clone(&client);
                thread::spawn(move || client.subscribe(sub_for("test.live.race")))
            })
            .collect();
        for t in threads {
            t.join().expect("subscriber thread").expect("subscribe ok");
        }

        assert_eq!(hub.sessions_opened(), 1);
        assert_eq!(hub.subscription_count(), 8);
        MemoryHub::unregister("test.live.race");
    }

    #[test]
    fn records_flow_to_the_record_callback() {
        let hub = MemoryHub::register("test.live.flow");
        let client = client_for("test.live.flow");
        client.subscribe(sub_for("test.live.flow")).unwrap();

        let (tx, rx) = mpsc::channel();
        client
            .start(Callbacks::new(Box::new(move |rec: &Record| {
                tx.send((rec.rtype, rec.bytes.to_vec())).ok();
                KeepGoing::Continue
            })))
            .unwrap();

        assert_eq!(hub.publish(record(0xA0)), 1);
        let (rtype, bytes) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(rtype, 0xA0);
        assert_eq!(bytes, b"\xde\xad\xbe\xef");

        client.shutdown(Duration::from_secs(2));
        MemoryHub::unregister("test.live.flow");
    }

    #[test]
    fn metadata_is_delivered_before_records() {
        let hub = MemoryHub::register("test.live.metadata");
        let client = client_for("test.live.metadata");
        client.subscribe(sub_for("test.live.metadata")).unwrap();

        let (tx, rx) = mpsc::channel();
        let md_tx = tx.clone();
        client
            .start(
                Callbacks::new(Box::new(move |_: &Record| {
                    tx.send("record").ok();
                    KeepGoing::Continue
                }))
                .with_metadata(Box::new(move |md: &Metadata| {
                    assert_eq!(md.dataset, "test.live.metadata");
                    md_tx.send("metadata").ok();
                })),
            )
            .unwrap();

        hub.publish(record(1));
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "metadata");
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "record");

        client.shutdown(Duration::from_secs(2));
        MemoryHub::unregister("test.live.metadata");
    }

    #[test]
    fn callback_panic_fail_stops_the_stream() {
        let hub = MemoryHub::register("test.live.panic");
        let client = client_for("test.live.panic");
        client.subscribe(sub_for("test.live.panic")).unwrap();

        let invocations = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        let (err_tx, err_rx) = mpsc::channel();

        let inv = Arc::clone(&invocations);
        let errs = Arc::clone(&errors);
        client
            .start(
                Callbacks::new(Box::new(move |_: &Record| {
                    let n = inv.fetch_add(1, Ordering::SeqCst) + 1;
                    if n == 3 {
                        panic!("consumer bug on third record");
                    }
                    KeepGoing::Continue
                }))
                .with_error(Box::new(move |msg, code| {
                    assert_eq!(code, CALLBACK_PANIC_CODE);
                    assert!(msg.contains("after 2 deliveries"), "message: {msg}");
                    errs.fetch_add(1, Ordering::SeqCst);
                    err_tx.send(()).ok();
                })),
            )
            .unwrap();

        for i in 0..5 {
            hub.publish(record(i));
        }

        err_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("error callback fires");
        client.block_for_stop(Duration::from_secs(2)).unwrap();

        // The panicking third invocation is the last; nothing after it.
        assert_eq!(invocations.load(Ordering::SeqCst), 3);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert!(!client.is_running());

        client.shutdown(Duration::from_secs(1));
        MemoryHub::unregister("test.live.panic");
    }

    #[test]
    fn metadata_callback_panic_fail_stops_the_stream() {
        let hub = MemoryHub::register("test.live.mdpanic");
        let client = client_for("test.live.mdpanic");
        client.subscribe(sub_for("test.live.mdpanic")).unwrap();

        let errors = Arc::new(AtomicUsize::new(0));
        let records = Arc::new(AtomicUsize::new(0));

        let errs = Arc::clone(&errors);
        let recs = Arc::clone(&records);
        client
            .start(
                Callbacks::new(Box::new(move |_: &Record| {
                    recs.fetch_add(1, Ordering::SeqCst);
                    KeepGoing::Continue
                }))
                .with_metadata(Box::new(move |_: &Metadata| {
                    panic!("consumer bug in metadata handler");
                }))
                .with_error(Box::new(move |_msg, code| {
                    assert_eq!(code, CALLBACK_PANIC_CODE);
                    errs.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();

        // The panic during the handshake report halts the stream before any
        // record is delivered.
        client.block_for_stop(Duration::from_secs(2)).unwrap();
        assert!(!client.is_running());
        assert_eq!(errors.load(Ordering::SeqCst), 1);

        hub.publish(record(1));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(records.load(Ordering::SeqCst), 0);

        client.shutdown(Duration::from_secs(1));
        MemoryHub::unregister("test.live.mdpanic");
    }

    #[test]
    fn restart_during_pending_wait_is_refused() {
        let _hub = MemoryHub::register("test.live.pendingwait");
        let client = client_for("test.live.pendingwait");
        client.subscribe(sub_for("test.live.pendingwait")).unwrap();
        client
            .start(Callbacks::new(Box::new(|_: &Record| KeepGoing::Continue)))
            .unwrap();

        // No stop was requested, so the bounded wait times out with the
        // worker still installed; a restart attempt must still be refused.
        let err = client
            .block_for_stop(Duration::from_millis(50))
            .unwrap_err();
        assert!(err.is_timeout());

        let err = client
            .start(Callbacks::new(Box::new(|_: &Record| KeepGoing::Continue)))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Internal(_)));

        client.shutdown(Duration::from_secs(2));
        MemoryHub::unregister("test.live.pendingwait");
    }

    #[test]
    fn debug_output_reflects_client_state() {
        let _hub = MemoryHub::register("test.live.debug");
        let client = client_for("test.live.debug");
        let rendered = format!("{client:?}");
        assert!(rendered.contains("LiveClient"), "rendered: {rendered}");
        assert!(rendered.contains("test.live.debug"), "rendered: {rendered}");
        MemoryHub::unregister("test.live.debug");
    }

    #[test]
    fn record_callback_can_request_stop() {
        let hub = MemoryHub::register("test.live.selfstop");
        let client = client_for("test.live.selfstop");
        client.subscribe(sub_for("test.live.selfstop")).unwrap();

        let (tx, rx) = mpsc::channel();
        client
            .start(Callbacks::new(Box::new(move |_: &Record| {
                tx.send(()).ok();
                KeepGoing::Stop
            })))
            .unwrap();

        hub.publish(record(1));
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        client.block_for_stop(Duration::from_secs(2)).unwrap();
        assert!(!client.is_running());

        MemoryHub::unregister("test.live.selfstop");
    }

    #[test]
    fn stop_is_resumable() {
        let hub = MemoryHub::register("test.live.resume");
        let client = client_for("test.live.resume");
        client.subscribe(sub_for("test.live.resume")).unwrap();

        let (tx1, _rx1) = mpsc::channel();
        client
            .start(Callbacks::new(Box::new(move |_: &Record| {
                tx1.send(()).ok();
                KeepGoing::Continue
            })))
            .unwrap();

        client.stop();
        client.block_for_stop(Duration::from_secs(2)).unwrap();
        assert_eq!(client.connection_state(), ConnectionState::Connected);

        // The feed was stopped by the exiting worker; re-establish and go
        // again on the same instance.
        client.reconnect().unwrap();
        let (tx2, rx2) = mpsc::channel();
        client
            .start(Callbacks::new(Box::new(move |rec: &Record| {
                tx2.send(rec.rtype).ok();
                KeepGoing::Continue
            })))
            .unwrap();

        hub.publish(record(7));
        assert_eq!(rx2.recv_timeout(Duration::from_secs(2)).unwrap(), 7);

        client.shutdown(Duration::from_secs(2));
        MemoryHub::unregister("test.live.resume");
    }

    #[test]
    fn shutdown_returns_only_after_worker_exit() {
        let hub = MemoryHub::register("test.live.shutdown");
        let client = client_for("test.live.shutdown");
        client.subscribe(sub_for("test.live.shutdown")).unwrap();
        client
            .start(Callbacks::new(Box::new(|_: &Record| KeepGoing::Continue)))
            .unwrap();

        client.shutdown(Duration::from_secs(5));

        assert!(!client.is_running());
        assert!(client.worker.lock().is_none());
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
        // The worker stopped the session on its way out, so the hub reaches
        // nobody.
        assert_eq!(hub.publish(record(1)), 0);
        MemoryHub::unregister("test.live.shutdown");
    }

    #[test]
    fn rejected_subscription_touches_nothing() {
        let hub = MemoryHub::register("test.live.reject");
        let client = client_for("test.live.reject");

        let empty = Subscription::new("test.live.reject", Schema::Trades, vec![]);
        assert!(matches!(client.subscribe(empty), Err(BridgeError::Config(_))));

        assert_eq!(hub.subscription_count(), 0);
        assert!(!client.is_initialized());
        MemoryHub::unregister("test.live.reject");
    }

    #[test]
    fn start_and_reconnect_require_initialization() {
        let client = client_for("test.live.uninit");
        let err = client
            .start(Callbacks::new(Box::new(|_: &Record| KeepGoing::Continue)))
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotInitialized));
        assert!(matches!(client.reconnect(), Err(BridgeError::NotInitialized)));
        assert!(matches!(
            client.resubscribe(),
            Err(BridgeError::NotInitialized)
        ));
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn double_start_is_refused() {
        let _hub = MemoryHub::register("test.live.double");
        let client = client_for("test.live.double");
        client.subscribe(sub_for("test.live.double")).unwrap();
        client
            .start(Callbacks::new(Box::new(|_: &Record| KeepGoing::Continue)))
            .unwrap();

        let err = client
            .start(Callbacks::new(Box::new(|_: &Record| KeepGoing::Continue)))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Internal(_)));

        client.shutdown(Duration::from_secs(2));
        MemoryHub::unregister("test.live.double");
    }
}
