//! Frame encoding and decoding.
//!
//! Layout on the wire:
//!
//! | offset | length | field                                  |
//! |-------:|-------:|----------------------------------------|
//! | 0      | 0 or 6 | destination MAC ([`Addressing::Prefixed`] only) |
//! | next   | 1      | type (0x00 DATA, 0x01 ACK)             |
//! | +1     | 3      | msg id                                 |
//! | +4     | 0..N   | application payload                    |
//!
//! DATA carries whatever the caller provided; ACK carries nothing, so an ACK
//! frame is exactly `header_len` bytes. There is no version field: a receiver
//! must discard unknown type bytes.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    addr::{MacAddr, MsgId},
    errors::{ProtocolError, Result},
};

/// The two frame types on the wire.
///
/// Any other type byte is a protocol error and the frame is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Carries an application payload; elicits an ACK from the receiver
    Data,
    /// Acknowledges a single DATA frame; payload is empty
    Ack,
}

impl FrameType {
    /// Wire value of this type.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Data => 0x00,
            Self::Ack => 0x01,
        }
    }

    /// Parse a wire type byte. `None` for anything unknown.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Data),
            0x01 => Some(Self::Ack),
            _ => None,
        }
    }
}

/// How a PHY carries the destination address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// The PHY addresses frames itself and delivers the sender MAC alongside
    /// the receive callback (short-range radio). The frame begins at the
    /// type byte.
    Direct,

    /// The PHY is an address-agnostic broadcast medium, so the destination
    /// MAC is encoded inline ahead of the type byte (long-range radio).
    Prefixed,
}

impl Addressing {
    /// Header length for this mode: type + msg id, plus the MAC prefix under
    /// [`Addressing::Prefixed`].
    #[must_use]
    pub const fn header_len(self) -> usize {
        match self {
            Self::Direct => 1 + MsgId::LEN,
            Self::Prefixed => MacAddr::LEN + 1 + MsgId::LEN,
        }
    }
}

/// A decoded wire frame: type, message id, and payload.
///
/// The destination MAC is not part of the frame value; it is supplied at
/// encode time and, under [`Addressing::Prefixed`], returned separately by
/// [`Frame::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame type (DATA or ACK)
    pub frame_type: FrameType,

    /// Per-message identifier, echoed in the matching ACK
    pub msg_id: MsgId,

    /// Application payload; empty for ACK frames
    pub payload: Bytes,
}

impl Frame {
    /// Create a DATA frame.
    #[must_use]
    pub fn data(msg_id: MsgId, payload: impl Into<Bytes>) -> Self {
        Self { frame_type: FrameType::Data, msg_id, payload: payload.into() }
    }

    /// Create the ACK for `msg_id`.
    #[must_use]
    pub fn ack(msg_id: MsgId) -> Self {
        Self { frame_type: FrameType::Ack, msg_id, payload: Bytes::new() }
    }

    /// Encoded length under `addressing`.
    #[must_use]
    pub fn encoded_len(&self, addressing: Addressing) -> usize {
        addressing.header_len() + self.payload.len()
    }

    /// Encode for the wire.
    ///
    /// `dest` is written as the inline prefix under
    /// [`Addressing::Prefixed`] and ignored under [`Addressing::Direct`]
    /// (the PHY addresses the frame itself).
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::PayloadTooLarge`] if the encoded frame would exceed
    ///   `mtu`. Enforced here so no oversized frame ever reaches a PHY.
    pub fn encode(&self, addressing: Addressing, dest: MacAddr, mtu: usize) -> Result<Bytes> {
        let len = self.encoded_len(addressing);
        if len > mtu {
            return Err(ProtocolError::PayloadTooLarge { size: len, max: mtu });
        }

        let mut buf = BytesMut::with_capacity(len);
        if addressing == Addressing::Prefixed {
            buf.put_slice(dest.as_bytes());
        }
        buf.put_u8(self.frame_type.to_u8());
        buf.put_slice(self.msg_id.as_bytes());
        buf.put_slice(&self.payload);

        debug_assert_eq!(buf.len(), len);

        Ok(buf.freeze())
    }

    /// Decode a wire frame.
    ///
    /// Returns the inline destination MAC (`Some` only under
    /// [`Addressing::Prefixed`]) and the frame. The payload is copied out of
    /// `bytes`; trailing data cannot exist since the payload runs to the end
    /// of the frame.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::FrameTooShort`] if `bytes` is shorter than the
    ///   header for `addressing`
    /// - [`ProtocolError::UnknownFrameType`] for any type byte other than
    ///   DATA or ACK
    pub fn decode(addressing: Addressing, bytes: &[u8]) -> Result<(Option<MacAddr>, Self)> {
        let header_len = addressing.header_len();
        if bytes.len() < header_len {
            return Err(ProtocolError::FrameTooShort {
                expected: header_len,
                actual: bytes.len(),
            });
        }

        let (dest, rest) = match addressing {
            Addressing::Direct => (None, bytes),
            Addressing::Prefixed => {
                let mut mac = [0u8; MacAddr::LEN];
                mac.copy_from_slice(&bytes[..MacAddr::LEN]);
                (Some(MacAddr(mac)), &bytes[MacAddr::LEN..])
            },
        };

        let frame_type =
            FrameType::from_u8(rest[0]).ok_or(ProtocolError::UnknownFrameType(rest[0]))?;

        let mut id = [0u8; MsgId::LEN];
        id.copy_from_slice(&rest[1..1 + MsgId::LEN]);

        let payload = Bytes::copy_from_slice(&rest[1 + MsgId::LEN..]);

        Ok((dest, Self { frame_type, msg_id: MsgId(id), payload }))
    }
}

/// Encode a 16-bit command as the 4-byte shorthand payload.
///
/// The big-endian command bytes are duplicated so the receiver can recognize
/// the shorthand: `[hi, lo, hi, lo]`.
#[must_use]
pub fn encode_command(cmd: i16) -> [u8; 4] {
    let [hi, lo] = cmd.to_be_bytes();
    [hi, lo, hi, lo]
}

/// Recognize the command shorthand in a DATA payload.
///
/// Exactly 4 bytes with the first pair equal to the second pair decode as a
/// big-endian signed 16-bit command. Anything else is `None`; the payload is
/// then ordinary data.
#[must_use]
pub fn decode_command(payload: &[u8]) -> Option<i16> {
    if payload.len() == 4 && payload[0..2] == payload[2..4] {
        Some(i16::from_be_bytes([payload[0], payload[1]]))
    } else {
        None
    }
}
