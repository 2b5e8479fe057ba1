//! Error types for frame encoding and decoding.
//!
//! Strongly-typed errors instead of `std::io::Error` so callers can
//! distinguish malformed input (drop silently) from caller mistakes
//! (surface).

use thiserror::Error;

/// Errors produced while encoding or decoding wire frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame shorter than the header for its addressing mode
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum length required (the header length)
        expected: usize,
        /// Length actually received
        actual: usize,
    },

    /// Type byte is neither DATA (0x00) nor ACK (0x01)
    #[error("unknown frame type: {0:#04x}")]
    UnknownFrameType(u8),

    /// Encoded frame would exceed the PHY MTU
    #[error("payload too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge {
        /// Encoded length of the offending frame
        size: usize,
        /// MTU it was checked against
        max: usize,
    },

    /// Textual MAC address did not parse as six colon-separated hex octets
    #[error("invalid MAC address: {0}")]
    InvalidMacAddr(String),
}

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
