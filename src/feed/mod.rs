//! The feed collaborator, specified at its interface.
//!
//! [`Feed`] is the seam between the safety layer and the streaming client
//! library it wraps: session handshake, subscription management, and record
//! delivery. The gateway wire protocol itself is out of scope here; the crate
//! ships an in-process implementation ([`memory`]) that fans records out over
//! channels, which is what the tests and embedded deployments run against. A
//! production gateway client implements the same trait.

pub mod memory;

use crate::config::LiveConfig;
use crate::error::{BridgeError, Result};
use crate::record::{Metadata, Record};
use crate::subscription::Subscription;
use std::sync::Arc;
use std::time::Duration;

/// A connected feed session.
///
/// Implementations are internally synchronized: every method takes `&self`
/// and may be called from the delivery worker and caller threads at once.
pub trait Feed: Send + Sync {
    /// Register one subscription with the gateway.
    fn subscribe(&self, sub: &Subscription) -> Result<()>;

    /// Complete the session handshake, blocking until the gateway's metadata
    /// response arrives.
    fn start(&self) -> Result<Metadata>;

    /// Receive the next record.
    ///
    /// With a timeout, `Ok(None)` means the wait elapsed with no record; with
    /// `None` the call blocks until a record arrives or the session fails.
    fn recv(&self, timeout: Option<Duration>) -> Result<Option<Record>>;

    /// Re-establish the session on the same instance. Existing subscriptions
    /// are retained locally and can be replayed with [`Feed::resubscribe`].
    fn reconnect(&self) -> Result<()>;

    /// Re-issue every subscription made on this session.
    fn resubscribe(&self) -> Result<()>;

    /// Tell the transport to stop delivering. Idempotent, never fails.
    fn stop(&self);
}

/// Build the feed for a configuration.
///
/// Resolves the dataset against the in-process hub registry. Unknown datasets
/// surface as a transport error, the same way a production client would
/// surface an unreachable gateway.
pub fn connect(config: &LiveConfig) -> Result<Arc<dyn Feed>> {
    if config.dataset.is_empty() {
        return Err(BridgeError::config(
            "dataset must be set before the feed is built",
        ));
    }
    let hub = memory::MemoryHub::lookup(&config.dataset).ok_or_else(|| {
        BridgeError::transport(format!("no gateway registered for dataset {}", config.dataset))
    })?;
    let feed = memory::MemoryFeed::connect(hub, config)?;
    Ok(Arc::new(feed))
}
