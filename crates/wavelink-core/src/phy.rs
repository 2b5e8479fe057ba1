//! The PHY adapter seam.
//!
//! A PHY adapter is the concrete radio driver: it transmits one frame at a
//! time and its runtime delivers received frames into the engine through a
//! [`crate::PhyBinding`]. Register programming, bus transactions, and pin
//! setup all live behind this trait.

use thiserror::Error;
use wavelink_proto::{Addressing, MacAddr};

/// Errors reported by a PHY adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhyError {
    /// The radio rejected the frame outright (not initialized, powered down)
    #[error("phy rejected frame: {0}")]
    Rejected(String),

    /// The radio is momentarily unable to transmit; retry on a later tick
    #[error("phy busy")]
    Busy,

    /// Peer registration failed (short-range radios with a peer table)
    #[error("peer registration failed for {mac}")]
    PeerRegistration {
        /// The peer that could not be registered
        mac: MacAddr,
    },
}

/// A concrete radio driver.
///
/// `send` is best-effort: it need not block until the frame is acknowledged
/// at the PHY layer, only until it is handed to the radio. It may block for
/// the duration of one frame transmission, so the engine never calls it
/// while holding a lock.
///
/// Received frames are pushed by the adapter's runtime (a driver task, never
/// an ISR directly) into [`crate::PhyBinding::deliver`].
pub trait PhyAdapter: Send + Sync + 'static {
    /// Addressing mode of this PHY, fixed for its lifetime.
    fn addressing(&self) -> Addressing;

    /// Largest encoded frame, in bytes, this PHY accepts.
    fn mtu(&self) -> usize;

    /// Transmit one frame to `dest`.
    ///
    /// # Errors
    ///
    /// Any [`PhyError`]; the engine treats failures at initial-send time as
    /// [`crate::EngineError::PhyUnavailable`] and failures during the retry
    /// tick as transient.
    fn send(&self, dest: MacAddr, frame: &[u8]) -> Result<(), PhyError>;

    /// Idempotent peer registration.
    ///
    /// Radios without a peer table keep the no-op default. The engine calls
    /// this before every unicast transmission and counts failures per
    /// message; after 3 failed attempts the message is dropped.
    ///
    /// # Errors
    ///
    /// [`PhyError::PeerRegistration`] (or any other variant) when the peer
    /// cannot be registered.
    fn ensure_peer(&self, mac: MacAddr) -> Result<(), PhyError> {
        let _ = mac;
        Ok(())
    }
}
