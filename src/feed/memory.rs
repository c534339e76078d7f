//! In-process feed: a process-global hub per dataset fanning records out to
//! connected sessions over channels.
//!
//! This is the collaborator the crate ships for embedded use and tests.
//! Publishers push [`Record`]s into a [`MemoryHub`]; each connected
//! [`MemoryFeed`] receives its own copy. The hub keeps a log of issued
//! subscriptions so callers can verify that rejected requests never reached
//! the transport.

use crate::config::LiveConfig;
use crate::error::{BridgeError, Result};
use crate::feed::Feed;
use crate::record::{Metadata, Record};
use crate::subscription::Subscription;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::debug;

static HUBS: OnceLock<RwLock<HashMap<String, Arc<MemoryHub>>>> = OnceLock::new();

fn hubs() -> &'static RwLock<HashMap<String, Arc<MemoryHub>>> {
    HUBS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Process-global record source for one dataset.
pub struct MemoryHub {
    dataset: String,
    inner: Mutex<HubInner>,
}

struct HubInner {
    next_session: u64,
    closed: bool,
    consumers: HashMap<u64, Sender<Record>>,
    subscriptions: Vec<Subscription>,
    sessions_opened: u64,
}

impl MemoryHub {
    /// Register a hub for `dataset`, replacing any previous one.
    pub fn register(dataset: impl Into<String>) -> Arc<MemoryHub> {
        let dataset = dataset.into();
        let hub = Arc::new(MemoryHub {
            dataset: dataset.clone(),
            inner: Mutex::new(HubInner {
                next_session: 1,
                closed: false,
                consumers: HashMap::new(),
                subscriptions: Vec::new(),
                sessions_opened: 0,
            }),
        });
        hubs().write().insert(dataset, Arc::clone(&hub));
        hub
    }

    /// Look up the hub serving `dataset`.
    pub fn lookup(dataset: &str) -> Option<Arc<MemoryHub>> {
        hubs().read().get(dataset).cloned()
    }

    /// Remove the hub for `dataset` from the registry. Existing sessions keep
    /// their channels until the hub itself is closed.
    pub fn unregister(dataset: &str) {
        hubs().write().remove(dataset);
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Deliver one record to every connected session. Returns the number of
    /// sessions reached.
    pub fn publish(&self, record: Record) -> usize {
        let inner = self.inner.lock();
        if inner.closed {
            return 0;
        }
        let mut reached = 0;
        for tx in inner.consumers.values() {
            if tx.send(record.clone()).is_ok() {
                reached += 1;
            }
        }
        reached
    }

    /// Tear the hub down: connected sessions observe a transport failure on
    /// their next receive.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.consumers.clear();
        debug!(dataset = %self.dataset, "memory hub closed");
    }

    /// Number of subscriptions issued to this hub since registration.
    pub fn subscription_count(&self) -> usize {
        self.inner.lock().subscriptions.len()
    }

    /// Copies of every subscription issued to this hub.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.inner.lock().subscriptions.clone()
    }

    /// Number of sessions ever opened against this hub. One wrapper that
    /// lazily builds its feed exactly once contributes exactly one.
    pub fn sessions_opened(&self) -> u64 {
        self.inner.lock().sessions_opened
    }

    fn attach(&self) -> Result<(u64, Receiver<Record>)> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(BridgeError::transport(format!(
                "gateway for dataset {} is closed",
                self.dataset
            )));
        }
        let id = inner.next_session;
        inner.next_session += 1;
        inner.sessions_opened += 1;
        let (tx, rx) = unbounded();
        inner.consumers.insert(id, tx);
        Ok((id, rx))
    }

    fn detach(&self, session: u64) {
        self.inner.lock().consumers.remove(&session);
    }

    fn record_subscription(&self, sub: &Subscription) {
        self.inner.lock().subscriptions.push(sub.clone());
    }
}

struct SessionState {
    id: u64,
    rx: Receiver<Record>,
}

/// One connected session against a [`MemoryHub`].
pub struct MemoryFeed {
    hub: Arc<MemoryHub>,
    send_ts_out: bool,
    session: Mutex<SessionState>,
    subs: Mutex<Vec<Subscription>>,
    stopped: AtomicBool,
}

impl MemoryFeed {
    /// Open a session against `hub`.
    pub fn connect(hub: Arc<MemoryHub>, config: &LiveConfig) -> Result<Self> {
        let (id, rx) = hub.attach()?;
        debug!(dataset = %hub.dataset, session = id, "memory feed connected");
        Ok(Self {
            hub,
            send_ts_out: config.send_ts_out,
            session: Mutex::new(SessionState { id, rx }),
            subs: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
        })
    }

    fn receiver(&self) -> Receiver<Record> {
        self.session.lock().rx.clone()
    }
}

impl Feed for MemoryFeed {
    fn subscribe(&self, sub: &Subscription) -> Result<()> {
        self.hub.record_subscription(sub);
        self.subs.lock().push(sub.clone());
        Ok(())
    }

    fn start(&self) -> Result<Metadata> {
        // The in-process handshake is immediate; a gateway client would block
        // here until the metadata frame arrives.
        let subs = self.subs.lock();
        let mut symbols: Vec<String> = Vec::new();
        for sub in subs.iter() {
            for sym in &sub.symbols {
                if !symbols.contains(sym) {
                    symbols.push(sym.clone());
                }
            }
        }
        Ok(Metadata {
            dataset: self.hub.dataset.clone(),
            schema: subs.last().map(|s| s.schema),
            stype_in: subs.last().map(|s| s.stype),
            start: subs.iter().filter_map(|s| s.start).min().unwrap_or(0),
            ts_out: self.send_ts_out,
            symbols,
            ..Metadata::default()
        })
    }

    fn recv(&self, timeout: Option<Duration>) -> Result<Option<Record>> {
        let rx = self.receiver();
        match timeout {
            Some(wait) => match rx.recv_timeout(wait) {
                Ok(record) => Ok(Some(record)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    Err(BridgeError::transport("feed session closed by gateway"))
                }
            },
            None => match rx.recv() {
                Ok(record) => Ok(Some(record)),
                Err(_) => Err(BridgeError::transport("feed session closed by gateway")),
            },
        }
    }

    fn reconnect(&self) -> Result<()> {
        let (id, rx) = self.hub.attach()?;
        let mut session = self.session.lock();
        self.hub.detach(session.id);
        *session = SessionState { id, rx };
        self.stopped.store(false, Ordering::Release);
        debug!(dataset = %self.hub.dataset, session = id, "memory feed reconnected");
        Ok(())
    }

    fn resubscribe(&self) -> Result<()> {
        let subs = self.subs.lock();
        for sub in subs.iter() {
            self.hub.record_subscription(sub);
        }
        Ok(())
    }

    fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.hub.detach(self.session.lock().id);
    }
}

impl Drop for MemoryFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
