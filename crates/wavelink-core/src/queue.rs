//! The retransmission queue.
//!
//! A bounded list of in-flight DATA messages. Pure state: the engine holds
//! it behind its queue lock, copies [`Retransmit`] candidates out, and
//! reports transmission outcomes back through `note_sent` /
//! `note_peer_add_failure`. No I/O happens here.
//!
//! Per-message lifecycle: in flight with `retry_count` successful
//! retransmissions, then acked (terminal flag, removed on the next sweep) or
//! dropped (timeout with retries exhausted, or repeated peer-registration
//! failure).

use bytes::Bytes;
use wavelink_proto::{MacAddr, MsgId};

use crate::error::EngineError;

/// Peer-registration failures tolerated before a message is force-dropped.
const MAX_PEER_ADD_ATTEMPTS: u8 = 3;

/// One enqueued DATA message awaiting acknowledgement.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    /// Destination peer
    pub peer: MacAddr,

    /// Identifier carried in the header, echoed by the matching ACK
    pub msg_id: MsgId,

    /// Successful retransmissions so far; the opportunistic first
    /// transmission is not counted
    pub retry_count: u8,

    /// Monotonic microsecond timestamp of the most recent transmission
    pub last_send_us: i64,

    /// Set once the matching ACK arrives; never reverts
    pub acked: bool,

    /// Failed peer-registration attempts; above
    /// [`MAX_PEER_ADD_ATTEMPTS`] the entry is force-dropped
    pub peer_add_attempts: u8,

    /// Encoded wire frame, retransmitted verbatim
    pub encoded: Bytes,
}

/// Result of a command-coalescing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coalesce {
    /// An identical unacked command was pending; its retry state was reset
    Coalesced,
    /// No matching entry; the caller should enqueue normally
    NotFound,
}

/// A sweep candidate due for retransmission.
///
/// The encoded bytes are cloned out so the engine can release the queue lock
/// before handing them to the PHY.
#[derive(Debug, Clone)]
pub struct Retransmit {
    /// Destination peer
    pub peer: MacAddr,
    /// Identifier of the pending message
    pub msg_id: MsgId,
    /// Encoded wire frame
    pub encoded: Bytes,
}

/// Bounded list of in-flight messages, in insertion order.
#[derive(Debug)]
pub struct SendQueue {
    entries: Vec<PendingMessage>,
    capacity: usize,
}

impl SendQueue {
    /// Create a queue bounded at `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { entries: Vec::new(), capacity }
    }

    /// Append a freshly built entry.
    ///
    /// # Errors
    ///
    /// - [`EngineError::QueueFull`] at capacity; the entry is dropped
    pub fn push(&mut self, pending: PendingMessage) -> Result<(), EngineError> {
        if self.entries.len() >= self.capacity {
            return Err(EngineError::QueueFull { capacity: self.capacity });
        }
        self.entries.push(pending);
        Ok(())
    }

    /// Reset the retry state of a pending identical command instead of
    /// enqueuing a duplicate.
    ///
    /// Matches the first unacked entry for `peer` whose frame is exactly the
    /// 4-byte command `cmd` (encoded length `header_len + 4`, trailing bytes
    /// equal). On a match, `retry_count`, `peer_add_attempts`, and
    /// `last_send_us` are reset so the command gets a full fresh retry
    /// budget.
    pub fn try_coalesce_command(
        &mut self,
        peer: MacAddr,
        cmd: [u8; 4],
        header_len: usize,
        now: i64,
    ) -> Coalesce {
        let found = self.entries.iter_mut().find(|m| {
            m.peer == peer
                && !m.acked
                && m.encoded.len() == header_len + cmd.len()
                && m.encoded[header_len..] == cmd[..]
        });

        match found {
            Some(entry) => {
                entry.retry_count = 0;
                entry.peer_add_attempts = 0;
                entry.last_send_us = now;
                Coalesce::Coalesced
            },
            None => Coalesce::NotFound,
        }
    }

    /// Mark the entry matching `(peer, msg_id)` as acked.
    ///
    /// Returns whether this call was the one that flipped it: `false` for
    /// already-acked entries and for ACKs that match nothing (late ACKs
    /// after `clear` or drop). The flag never reverts.
    pub fn mark_acked(&mut self, peer: MacAddr, msg_id: MsgId) -> bool {
        match self.entries.iter_mut().find(|m| m.peer == peer && m.msg_id == msg_id) {
            Some(entry) if !entry.acked => {
                entry.acked = true;
                true
            },
            _ => false,
        }
    }

    /// One maintenance pass: drop terminal entries, then select candidates
    /// due for retransmission.
    ///
    /// Removable: acked, or timed out with retries exhausted, or too many
    /// peer-registration failures. Due: unacked, `now - last_send_us >
    /// timeout_us`, and retries remaining. Both passes run in insertion
    /// order; removal precedes selection, so one sweep is stable.
    pub fn sweep(&mut self, now: i64, timeout_us: i64, max_retries: u8) -> Vec<Retransmit> {
        self.entries.retain(|m| {
            !(m.acked
                || (now - m.last_send_us > timeout_us && m.retry_count >= max_retries)
                || m.peer_add_attempts > MAX_PEER_ADD_ATTEMPTS)
        });

        self.entries
            .iter()
            .filter(|m| now - m.last_send_us > timeout_us && m.retry_count < max_retries)
            .map(|m| Retransmit { peer: m.peer, msg_id: m.msg_id, encoded: m.encoded.clone() })
            .collect()
    }

    /// Record a successful retransmission of `(peer, msg_id)` at `now`.
    ///
    /// Returns the new retry count, or `None` if the entry is gone (acked
    /// and swept, or cleared, between candidate selection and transmission).
    pub fn note_sent(&mut self, peer: MacAddr, msg_id: MsgId, now: i64) -> Option<u8> {
        let entry = self.entries.iter_mut().find(|m| m.peer == peer && m.msg_id == msg_id)?;
        entry.retry_count = entry.retry_count.saturating_add(1);
        entry.last_send_us = now;
        Some(entry.retry_count)
    }

    /// Record a failed peer registration for `(peer, msg_id)`.
    ///
    /// Past [`MAX_PEER_ADD_ATTEMPTS`] the entry is force-acked so the next
    /// sweep removes it.
    pub fn note_peer_add_failure(&mut self, peer: MacAddr, msg_id: MsgId) {
        if let Some(entry) = self.entries.iter_mut().find(|m| m.peer == peer && m.msg_id == msg_id)
        {
            entry.peer_add_attempts = entry.peer_add_attempts.saturating_add(1);
            if entry.peer_add_attempts > MAX_PEER_ADD_ATTEMPTS {
                entry.acked = true;
            }
        }
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, including acked-but-not-yet-swept ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
