#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # Tickbridge
//!
//! Tickbridge is a safety layer between a streaming market-data client and
//! memory-unsafe callers. It wraps push-mode and pull-mode consumption of a
//! live feed behind validated opaque handles and a stable C ABI, so a caller
//! holding nothing but a `uint64_t` token cannot trigger use-after-free,
//! double-free, or type confusion — and a panic on either side of the
//! boundary never tears down the caller's process.
//!
//! ## What it provides
//!
//! - **Validated handles**: every boundary call checks its token against a
//!   generational registry and fails with a distinct status code instead of
//!   touching freed memory ([`ffi::HandleRegistry`])
//! - **Push mode**: a wrapper-owned delivery thread invokes caller
//!   callbacks, with a race-free four-phase shutdown ([`LiveClient`])
//! - **Pull mode**: caller-driven `next_record` with a bounded wait that is
//!   distinguishable from failure ([`PullClient`])
//! - **Fail-stop callbacks**: a panic inside a caller callback stops the
//!   stream and is reported through the error callback, never unwound
//!   across the boundary
//!
//! ## Library usage
//!
//! The same wrappers are usable directly from Rust:
//!
//! ```no_run
//! use tickbridge::client::{Callbacks, KeepGoing, LiveClient};
//! use tickbridge::config::LiveConfig;
//! use tickbridge::schema::Schema;
//! use tickbridge::subscription::Subscription;
//! use tickbridge::Result;
//!
//! fn main() -> Result<()> {
//!     let config = LiveConfig::new("db-api-key")?.with_dataset("GLBX.MDP3");
//!     let client = LiveClient::new(config);
//!
//!     client.subscribe(Subscription::new(
//!         "GLBX.MDP3",
//!         Schema::Trades,
//!         vec!["ESZ5".into()],
//!     ))?;
//!
//!     client.start(Callbacks::new(Box::new(|record| {
//!         println!("rtype={:#04x} len={}", record.rtype, record.len());
//!         KeepGoing::Continue
//!     })))?;
//!
//!     // ... later
//!     client.stop();
//!     client.block_for_stop(std::time::Duration::from_secs(5))?;
//!     Ok(())
//! }
//! ```
//!
//! ## C usage
//!
//! The crate builds as a `cdylib`; see [`ffi`] for the exported surface and
//! its conventions (status codes, message buffers, callback contracts).
//!
//! ## Feed transport
//!
//! The wrappers talk to the feed through the [`feed::Feed`] trait. The crate
//! ships an in-process implementation ([`feed::memory`]) used for embedded
//! deployments and tests; a gateway client implements the same trait.

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod ffi;
pub mod logging;
pub mod record;
pub mod schema;
pub mod subscription;

pub use client::{Callbacks, ConnectionState, KeepGoing, LiveClient, PullClient};
pub use config::{LiveConfig, UpgradePolicy};
pub use error::{BridgeError, HandleError, Result};
pub use feed::Feed;
pub use logging::{LogLevel, LogSink, StderrSink};
pub use record::{Metadata, Record, SymbolMapping};
pub use schema::{SType, Schema};
pub use subscription::Subscription;
