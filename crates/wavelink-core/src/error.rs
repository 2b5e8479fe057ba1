//! Error types surfaced to engine callers.
//!
//! Everything recoverable stays inside the engine (duplicates, spurious
//! ACKs, transient PHY failures during retries); only caller mistakes and
//! synchronous PHY rejection are surfaced here.

use thiserror::Error;
use wavelink_proto::ProtocolError;

use crate::phy::PhyError;

/// Errors returned by the engine's public send and configuration API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Encoded frame would exceed the PHY MTU; nothing was enqueued
    #[error("payload too large: {size} bytes exceeds MTU {max}")]
    PayloadTooLarge {
        /// Encoded length of the rejected frame
        size: usize,
        /// The PHY's MTU
        max: usize,
    },

    /// Send queue is at capacity; nothing was enqueued
    #[error("send queue full: {capacity} messages pending")]
    QueueFull {
        /// The configured queue bound
        capacity: usize,
    },

    /// The PHY adapter rejected the frame synchronously at send time.
    ///
    /// The message stays queued; the retry tick will try again.
    #[error("phy unavailable: {0}")]
    PhyUnavailable(PhyError),

    /// A configuration value was rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ProtocolError> for EngineError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::PayloadTooLarge { size, max } => Self::PayloadTooLarge { size, max },
            // Encoding only fails on size; decode errors never cross this
            // boundary (malformed inbound frames are dropped, not surfaced)
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}
