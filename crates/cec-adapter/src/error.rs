//! Error types for adapter control and event dispatch

use thiserror::Error;

use cec_protocol::{LogicalAddress, ProtocolError};

/// A failure raised by application handler code during dispatch
///
/// Handlers construct these to abort delivery of the current event;
/// later subscribers are not notified.
#[derive(Debug, Error, Clone)]
#[error("{reason}")]
pub struct HandlerError {
    reason: String,
}

impl HandlerError {
    /// Wrap a failure reason
    pub fn new(reason: impl Into<String>) -> Self {
        HandlerError {
            reason: reason.into(),
        }
    }
}

/// Why delivery of one notification stopped
///
/// Reported to the engine callback site as the notification's result.
/// Neither case unwinds past the dispatch boundary or corrupts the
/// registry; subsequent notifications are delivered normally.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler returned an error
    #[error("callback failed: {0}")]
    Handler(#[from] HandlerError),

    /// A handler panicked; the panic was contained at the dispatch boundary
    #[error("callback panicked")]
    HandlerPanicked,
}

/// Errors surfaced by adapter and device operations
#[derive(Debug, Error)]
pub enum CecError {
    /// Address or parameter validation failed; nothing reached the engine
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Subscription mask contained bits outside the valid set
    #[error("invalid event mask: {bits:#06x}")]
    InvalidEventMask {
        /// The offending raw mask
        bits: u16,
    },

    /// Engine initialization or configuration failed
    #[error("failed to initialize CEC engine")]
    InitFailed,

    /// Discovery returned no adapters
    #[error("no CEC adapter found")]
    NoAdapterFound,

    /// The transport would not open
    #[error("CEC failed to open {path}")]
    OpenFailed {
        /// Path that failed to open
        path: String,
    },

    /// Operation on a closed adapter handle
    #[error("adapter is closed")]
    AdapterClosed,

    /// HDMI port number outside 0-15
    #[error("invalid HDMI port: {0}")]
    InvalidHdmiPort(u8),

    /// The adapter cannot persist its configuration
    #[error("adapter cannot persist configuration")]
    PersistNotSupported,

    /// The engine configuration could not be read
    #[error("could not read adapter configuration")]
    ConfigUnavailable,

    /// Power status query came back unknown; distinct from standby
    #[error("power status for device {address} is unknown")]
    PowerStatusUnknown {
        /// Queried device
        address: LogicalAddress,
    },
}
