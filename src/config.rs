//! Connection configuration for feed clients.

use crate::error::{BridgeError, Result};
use std::time::Duration;

/// What to do with records encoded in an older wire version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpgradePolicy {
    /// Deliver records exactly as received.
    AsIs,
    /// Upgrade records to the latest wire version before delivery.
    #[default]
    UpgradeToLatest,
}

impl UpgradePolicy {
    /// Boundary mapping: 0 = as-is, anything else = upgrade.
    pub fn from_i32(value: i32) -> Self {
        if value == 0 {
            UpgradePolicy::AsIs
        } else {
            UpgradePolicy::UpgradeToLatest
        }
    }
}

/// Configuration for a live feed session.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Gateway credential.
    pub api_key: String,
    /// Dataset to stream. May be empty at construction and set by the first
    /// subscribe.
    pub dataset: String,
    /// Ask the gateway to append send-timestamps to each record.
    pub send_ts_out: bool,
    pub upgrade_policy: UpgradePolicy,
    /// Keep-alive interval; `None` disables heartbeats.
    pub heartbeat_interval: Option<Duration>,
}

pub(crate) const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

impl LiveConfig {
    /// Minimal config: credential only, dataset supplied by the first
    /// subscribe.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(BridgeError::config("api key cannot be empty"));
        }
        Ok(Self {
            api_key,
            dataset: String::new(),
            send_ts_out: false,
            upgrade_policy: UpgradePolicy::default(),
            heartbeat_interval: Some(DEFAULT_HEARTBEAT),
        })
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn with_send_ts_out(mut self, send_ts_out: bool) -> Self {
        self.send_ts_out = send_ts_out;
        self
    }

    pub fn with_upgrade_policy(mut self, policy: UpgradePolicy) -> Self {
        self.upgrade_policy = policy;
        self
    }

    /// Set the keep-alive interval in whole seconds; 0 or negative disables
    /// heartbeats (boundary convention).
    pub fn with_heartbeat_secs(mut self, secs: i32) -> Self {
        self.heartbeat_interval = if secs > 0 {
            Some(Duration::from_secs(secs as u64))
        } else {
            None
        };
        self
    }
}
