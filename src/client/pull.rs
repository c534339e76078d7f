//! Pull-mode client: the caller drives consumption, no background thread.

use crate::config::LiveConfig;
use crate::error::{BridgeError, Result};
use crate::feed::{self, Feed};
use crate::logging::{LogLevel, LogSink, StderrSink};
use crate::record::{Metadata, Record};
use crate::subscription::Subscription;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Pull-mode streaming client wrapper.
///
/// Shares the lazy-feed and log-sink structure of the push-mode client but
/// has no worker: [`PullClient::next_record`] blocks the calling thread
/// instead.
pub struct PullClient {
    config: Mutex<LiveConfig>,
    log_sink: Arc<StderrSink>,
    feed: Mutex<Option<Arc<dyn Feed>>>,
}

impl PullClient {
    pub fn new(config: LiveConfig) -> Self {
        Self {
            config: Mutex::new(config),
            log_sink: Arc::new(StderrSink::default()),
            feed: Mutex::new(None),
        }
    }

    /// Build the feed now. Requires the dataset to be configured.
    pub fn initialize(&self) -> Result<()> {
        self.ensure_feed().map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.feed.lock().is_some()
    }

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

    fn ensure_feed(&self) -> Result<Arc<dyn Feed>> {
        let mut guard = self.feed.lock();
        if let Some(existing) = guard.as_ref() {
            return Ok(Arc::clone(existing));
        }
        let config = self.config.lock().clone();
        let built = feed::connect(&config)?;
        *guard = Some(Arc::clone(&built));
        debug!(dataset = %config.dataset, "pull feed session built");
        Ok(built)
    }

    fn current_feed(&self) -> Result<Arc<dyn Feed>> {
        self.feed.lock().clone().ok_or(BridgeError::NotInitialized)
    }

    /// Validate and issue one subscription; builds the feed on first use.
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

    /// Complete the handshake, blocking until the gateway's metadata response
    /// arrives, and return it synchronously.
    pub fn start(&self) -> Result<Metadata> {
        let metadata = self.current_feed()?.start()?;
        self.log_sink.receive(
            LogLevel::Info,
            &format!("session started for dataset {}", metadata.dataset),
        );
        Ok(metadata)
    }

    /// Fetch the next record.
    ///
    /// `None` blocks indefinitely. With a timeout the three outcomes are
    /// distinguishable: `Ok(Some(record))`, `Ok(None)` when the wait
    /// elapsed, `Err` on stream failure.
    pub fn next_record(&self, timeout: Option<Duration>) -> Result<Option<Record>> {
        self.current_feed()?.recv(timeout)
    }

    /// Re-establish the session on the existing feed instance.
    pub fn reconnect(&self) -> Result<()> {
        self.current_feed()?.reconnect()
    }

    /// Re-issue every subscription made on the existing feed instance.
    pub fn resubscribe(&self) -> Result<()> {
        self.current_feed()?.resubscribe()
    }

    /// Signal the transport to stop. Failures are swallowed; this is a
    /// cleanup path.
    pub fn stop(&self) {
        if let Some(feed) = self.feed.lock().as_ref() {
            feed.stop();
        }
    }
}

impl std::fmt::Debug for PullClient {
    // Manual impl: the feed is an unprintable trait object.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullClient")
            .field("dataset", &self.dataset())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl Drop for PullClient {
    fn drop(&mut self) {
        self.stop();
    }
}
