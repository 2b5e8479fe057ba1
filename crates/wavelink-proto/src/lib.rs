//! Wire format for the Wavelink reliable-datagram transport.
//!
//! Frames are byte-oriented with fixed fields: an optional 6-byte destination
//! MAC prefix (long-range radios only), a 1-byte frame type, a 3-byte message
//! id, and the application payload. See [`Frame`] for the layout and
//! [`Addressing`] for the two header variants.
//!
//! This crate holds no policy: retry, deduplication, and dispatch live in
//! `wavelink-core`. Everything here is pure encode/decode.

pub mod addr;
pub mod errors;
pub mod frame;

pub use addr::{MacAddr, MsgId};
pub use errors::{ProtocolError, Result};
pub use frame::{Addressing, Frame, FrameType, decode_command, encode_command};
