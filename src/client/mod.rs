//! Feed client wrappers: push-mode ([`LiveClient`]) and pull-mode
//! ([`PullClient`]) consumption over one [`crate::feed::Feed`] session.

mod live;
mod pull;

pub use live::LiveClient;
pub use pull::PullClient;

use crate::record::{Metadata, Record};

/// Reserved error-callback code for a panic inside the record callback.
pub const CALLBACK_PANIC_CODE: i32 = -999;
/// Error-callback code for a failure surfaced by the transport.
pub const TRANSPORT_ERROR_CODE: i32 = -1;

/// Flow-control decision returned by the record callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepGoing {
    Continue,
    Stop,
}

/// Coarse connection state exposed across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ConnectionState {
    Disconnected = 0,
    Connected = 2,
    Streaming = 3,
}

/// Invoked once per delivered record. Arguments are only valid for the
/// duration of the call.
pub type RecordHandler = Box<dyn FnMut(&Record) -> KeepGoing + Send>;
/// Invoked once with the session handshake metadata.
pub type MetadataHandler = Box<dyn FnMut(&Metadata) + Send>;
/// Invoked on stream errors with a message and a reserved code.
pub type ErrorHandler = Box<dyn Fn(&str, i32) + Send>;

/// Caller-supplied callback set for push-mode delivery.
///
/// The record handler is mandatory; metadata and error handlers are optional.
pub struct Callbacks {
    pub(crate) on_record: RecordHandler,
    pub(crate) on_metadata: Option<MetadataHandler>,
    pub(crate) on_error: Option<ErrorHandler>,
}

impl Callbacks {
    pub fn new(on_record: RecordHandler) -> Self {
        Self {
            on_record,
            on_metadata: None,
            on_error: None,
        }
    }

    pub fn with_metadata(mut self, on_metadata: MetadataHandler) -> Self {
        self.on_metadata = Some(on_metadata);
        self
    }

    pub fn with_error(mut self, on_error: ErrorHandler) -> Self {
        self.on_error = Some(on_error);
        self
    }
}
