//! The datagram engine.
//!
//! Owns the send queue, the dedup history, and the subscriber lists; exposes
//! the public send API; handles inbound frames; drives retransmissions on
//! the periodic tick.
//!
//! # Locking discipline
//!
//! Two mutexes: the queue lock and the history lock. A critical section
//! holds at most one of them, encoded bytes are copied out before any PHY
//! call, and subscriber callbacks run outside both. Subscriber code may
//! therefore call back into the engine freely.

use std::sync::Mutex;

use bytes::Bytes;
use tracing::{debug, trace, warn};
use wavelink_proto::{Addressing, Frame, FrameType, MacAddr, MsgId, decode_command, encode_command};

use crate::{
    env::Environment,
    error::EngineError,
    history::{DedupHistory, Observation},
    msg_id::MessageIdGen,
    phy::PhyAdapter,
    queue::{Coalesce, PendingMessage, SendQueue},
    subscribers::Subscribers,
    sync::lock,
};

/// Default inclusive bound on retransmissions before a message is dropped.
pub const DEFAULT_MAX_RETRIES: u8 = 5;

/// Default minimum inter-retry delay per message, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 200;

/// Default bound on in-flight messages.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Default destination for [`Engine::send_to_peer`]
    pub peer: MacAddr,

    /// Inclusive bound on retransmissions before a message is dropped
    pub max_retries: u8,

    /// Minimum delay between transmissions of one message, in milliseconds
    pub timeout_ms: u64,

    /// Bound on in-flight messages; [`EngineError::QueueFull`] beyond it
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            peer: MacAddr::BROADCAST,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), EngineError> {
        if self.timeout_ms == 0 {
            return Err(EngineError::InvalidConfig("timeout_ms must be non-zero".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "queue_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of [`Engine::send_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// No identical command was pending; a new message was enqueued
    Enqueued(MsgId),

    /// An identical unacked command was already pending; its retry state was
    /// reset instead of enqueuing a duplicate
    Coalesced,
}

/// Runtime-adjustable settings, kept behind their own small lock.
///
/// Held alone, never across the queue or history locks.
#[derive(Debug, Clone, Copy)]
struct Settings {
    peer: MacAddr,
    max_retries: u8,
    timeout_us: i64,
}

/// The reliable-datagram engine.
///
/// Generic over the PHY adapter and the environment so the same logic runs
/// against real radios and the simulation harness. Methods take `&self`;
/// callers typically hold the engine in an [`std::sync::Arc`] shared with a
/// [`crate::PhyBinding`] and a [`crate::RetryDriver`].
pub struct Engine<P, E>
where
    P: PhyAdapter,
    E: Environment,
{
    phy: P,
    env: E,
    id_gen: MessageIdGen<E>,
    queue: Mutex<SendQueue>,
    history: Mutex<DedupHistory>,
    subscribers: Subscribers,
    settings: Mutex<Settings>,
}

impl<P, E> Engine<P, E>
where
    P: PhyAdapter,
    E: Environment,
{
    /// Create an engine over `phy` with the given configuration.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidConfig`] for a zero timeout or queue capacity
    pub fn new(phy: P, env: E, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        Ok(Self {
            phy,
            env: env.clone(),
            id_gen: MessageIdGen::new(env),
            queue: Mutex::new(SendQueue::new(config.queue_capacity)),
            history: Mutex::new(DedupHistory::new()),
            subscribers: Subscribers::new(),
            settings: Mutex::new(Settings {
                peer: config.peer,
                max_retries: config.max_retries,
                timeout_us: (config.timeout_ms as i64) * 1000,
            }),
        })
    }

    // --- Configuration -----------------------------------------------------

    /// Set the default peer for [`Engine::send_to_peer`]. Idempotent; does
    /// not affect messages already in flight.
    pub fn set_peer(&self, mac: MacAddr) {
        lock(&self.settings).peer = mac;
    }

    /// Currently configured default peer.
    #[must_use]
    pub fn peer(&self) -> MacAddr {
        lock(&self.settings).peer
    }

    /// Set the retransmission bound. Applies to future sweeps, including
    /// those of messages already in flight.
    pub fn set_max_retries(&self, max_retries: u8) {
        lock(&self.settings).max_retries = max_retries;
    }

    /// Set the minimum inter-retry delay.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidConfig`] for a zero timeout
    pub fn set_timeout_ms(&self, timeout_ms: u64) -> Result<(), EngineError> {
        if timeout_ms == 0 {
            return Err(EngineError::InvalidConfig("timeout_ms must be non-zero".to_string()));
        }
        lock(&self.settings).timeout_us = (timeout_ms as i64) * 1000;
        Ok(())
    }

    // --- Subscription ------------------------------------------------------

    /// Register a callback for decoded text (UTF-8 lossy, non-empty
    /// payloads only).
    pub fn on_message(&self, callback: impl Fn(MacAddr, String) + Send + Sync + 'static) {
        self.subscribers.add_message(callback);
    }

    /// Register a callback for raw payload bytes (every fresh DATA frame).
    pub fn on_data(&self, callback: impl Fn(MacAddr, Vec<u8>) + Send + Sync + 'static) {
        self.subscribers.add_data(callback);
    }

    /// Register a callback for 16-bit commands (4-byte shorthand payloads).
    pub fn on_command(&self, callback: impl Fn(MacAddr, i16) + Send + Sync + 'static) {
        self.subscribers.add_command(callback);
    }

    /// Register a callback for first-time ACK confirmations.
    pub fn on_ack(&self, callback: impl Fn(MacAddr, MsgId) + Send + Sync + 'static) {
        self.subscribers.add_ack(callback);
    }

    // --- Sending -----------------------------------------------------------

    /// Enqueue a DATA message to `peer` and transmit it opportunistically.
    ///
    /// The message stays queued until its ACK arrives or retries are
    /// exhausted. The immediate first transmission is not counted as a
    /// retry, so the frame goes on air at most `1 + max_retries` times.
    ///
    /// # Errors
    ///
    /// - [`EngineError::PayloadTooLarge`] if the frame exceeds the PHY MTU;
    ///   nothing is enqueued
    /// - [`EngineError::QueueFull`] at the queue bound; nothing is enqueued
    /// - [`EngineError::PhyUnavailable`] if the PHY rejects the first
    ///   transmission synchronously; the message stays queued and the retry
    ///   tick takes over
    pub fn send(&self, payload: impl Into<Bytes>, peer: MacAddr) -> Result<MsgId, EngineError> {
        let msg_id = self.id_gen.next();
        let frame = Frame::data(msg_id, payload);
        let encoded = frame.encode(self.phy.addressing(), peer, self.phy.mtu())?;

        let now = self.env.now_us();
        lock(&self.queue).push(PendingMessage {
            peer,
            msg_id,
            retry_count: 0,
            last_send_us: now,
            acked: false,
            peer_add_attempts: 0,
            encoded: encoded.clone(),
        })?;

        trace!(%peer, %msg_id, len = encoded.len(), "message enqueued");

        let first_hop = self.transmit_initial(peer, msg_id, &encoded);

        // Opportunistic pass over the rest of the queue; the fresh entry is
        // not due yet and will not be double-sent.
        self.tick();

        first_hop.map(|()| msg_id)
    }

    /// [`Engine::send`] to the configured default peer.
    ///
    /// # Errors
    ///
    /// As for [`Engine::send`].
    pub fn send_to_peer(&self, payload: impl Into<Bytes>) -> Result<MsgId, EngineError> {
        let peer = self.peer();
        self.send(payload, peer)
    }

    /// Send UTF-8 text reliably to `peer`.
    ///
    /// # Errors
    ///
    /// As for [`Engine::send`].
    pub fn send_str(&self, text: &str, peer: MacAddr) -> Result<MsgId, EngineError> {
        self.send(Bytes::copy_from_slice(text.as_bytes()), peer)
    }

    /// Send UTF-8 text reliably to the configured default peer.
    ///
    /// # Errors
    ///
    /// As for [`Engine::send`].
    pub fn send_to_peer_str(&self, text: &str) -> Result<MsgId, EngineError> {
        let peer = self.peer();
        self.send_str(text, peer)
    }

    /// Transmit a DATA frame once to the all-ones broadcast address.
    ///
    /// Never enqueued, never retried, never awaits an ACK: ACK matching over
    /// broadcast is ill-defined, so broadcast is best-effort.
    ///
    /// # Errors
    ///
    /// - [`EngineError::PayloadTooLarge`] if the frame exceeds the PHY MTU
    /// - [`EngineError::PhyUnavailable`] if the PHY rejects the frame
    pub fn send_broadcast(&self, payload: impl Into<Bytes>) -> Result<(), EngineError> {
        let msg_id = self.id_gen.next();
        let frame = Frame::data(msg_id, payload);
        let encoded = frame.encode(self.phy.addressing(), MacAddr::BROADCAST, self.phy.mtu())?;

        self.phy
            .send(MacAddr::BROADCAST, &encoded)
            .map_err(EngineError::PhyUnavailable)
    }

    /// Broadcast UTF-8 text, best-effort.
    ///
    /// # Errors
    ///
    /// As for [`Engine::send_broadcast`].
    pub fn send_broadcast_str(&self, text: &str) -> Result<(), EngineError> {
        self.send_broadcast(Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Send a 16-bit command reliably, coalescing with an identical pending
    /// one.
    ///
    /// If an unacked message to `peer` already carries exactly this command,
    /// its retry state is reset instead of enqueuing a duplicate: the
    /// command meaning is idempotent, so one surviving copy suffices.
    ///
    /// # Errors
    ///
    /// As for [`Engine::send`] when a new message is enqueued.
    pub fn send_command(&self, cmd: i16, peer: MacAddr) -> Result<CommandOutcome, EngineError> {
        let payload = encode_command(cmd);
        let header_len = self.phy.addressing().header_len();
        let now = self.env.now_us();

        let coalesced = lock(&self.queue).try_coalesce_command(peer, payload, header_len, now);

        match coalesced {
            Coalesce::Coalesced => {
                debug!(%peer, cmd, "command coalesced with pending duplicate");
                Ok(CommandOutcome::Coalesced)
            },
            Coalesce::NotFound => {
                self.send(Bytes::copy_from_slice(&payload), peer).map(CommandOutcome::Enqueued)
            },
        }
    }

    /// Drop all in-flight messages.
    ///
    /// Frames already handed to the PHY are not aborted; their late ACKs
    /// match nothing and are discarded silently.
    pub fn clear_pending(&self) {
        lock(&self.queue).clear();
    }

    /// Number of in-flight messages, acked-but-not-yet-swept included.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        lock(&self.queue).len()
    }

    // --- Retry tick --------------------------------------------------------

    /// One retransmission pass.
    ///
    /// Called by the [`crate::RetryDriver`] on its period and synchronously
    /// at the end of [`Engine::send`]. Sweeps the queue (dropping terminal
    /// entries), then retransmits every candidate past its timeout. PHY
    /// calls happen with no lock held.
    pub fn tick(&self) {
        let now = self.env.now_us();
        let (timeout_us, max_retries) = {
            let settings = lock(&self.settings);
            (settings.timeout_us, settings.max_retries)
        };

        let candidates = lock(&self.queue).sweep(now, timeout_us, max_retries);

        for candidate in candidates {
            if let Err(err) = self.phy.ensure_peer(candidate.peer) {
                debug!(peer = %candidate.peer, msg_id = %candidate.msg_id, error = %err,
                    "peer registration failed, skipping transmission");
                lock(&self.queue).note_peer_add_failure(candidate.peer, candidate.msg_id);
                continue;
            }

            match self.phy.send(candidate.peer, &candidate.encoded) {
                Ok(()) => {
                    let attempt =
                        lock(&self.queue).note_sent(candidate.peer, candidate.msg_id, now);
                    debug!(peer = %candidate.peer, msg_id = %candidate.msg_id,
                        attempt = attempt.unwrap_or(0), "retransmitted");
                },
                Err(err) => {
                    // Transient: entry untouched, tried again next tick
                    debug!(peer = %candidate.peer, msg_id = %candidate.msg_id, error = %err,
                        "retransmission failed, will retry");
                },
            }
        }
    }

    // --- Receive path ------------------------------------------------------

    /// Handle one inbound frame from the PHY.
    ///
    /// Entered through [`crate::PhyBinding::deliver`], which serializes
    /// reentry from the PHY runtime.
    pub(crate) fn handle_frame(&self, sender: MacAddr, raw: &[u8]) {
        let addressing = self.phy.addressing();

        let frame = match Frame::decode(addressing, raw) {
            Ok((_, frame)) => frame,
            Err(err) => {
                warn!(%sender, len = raw.len(), error = %err, "dropping invalid frame");
                return;
            },
        };

        match frame.frame_type {
            FrameType::Ack => self.handle_ack(sender, &frame, raw.len(), addressing),
            FrameType::Data => self.handle_data(sender, frame, raw),
        }
    }

    fn handle_ack(&self, sender: MacAddr, frame: &Frame, len: usize, addressing: Addressing) {
        if len != addressing.header_len() {
            warn!(%sender, len, "dropping ACK with trailing bytes");
            return;
        }

        let flipped = lock(&self.queue).mark_acked(sender, frame.msg_id);

        if flipped {
            debug!(%sender, msg_id = %frame.msg_id, "ack received");
            self.subscribers.notify_ack(sender, frame.msg_id);
        } else {
            trace!(%sender, msg_id = %frame.msg_id, "spurious ack ignored");
        }
    }

    fn handle_data(&self, sender: MacAddr, frame: Frame, raw: &[u8]) {
        // ACK precedes dedup: if our previous ACK was lost, the duplicate
        // must elicit another one or the sender retries forever.
        self.send_ack(sender, frame.msg_id);

        let now = self.env.now_us();
        let observation = lock(&self.history).observe(sender, raw, now);
        if observation == Observation::Seen {
            debug!(%sender, msg_id = %frame.msg_id, "duplicate frame ignored");
            return;
        }

        let payload = frame.payload;

        if let Some(cmd) = decode_command(&payload) {
            debug!(%sender, cmd, "command received");
            self.subscribers.notify_command(sender, cmd);
        }

        self.subscribers.notify_data(sender, &payload);

        if !payload.is_empty() {
            let text = String::from_utf8_lossy(&payload);
            self.subscribers.notify_message(sender, &text);
        }
    }

    // --- Internals ---------------------------------------------------------

    /// First transmission of a freshly enqueued message.
    ///
    /// A peer-registration failure is recovered (counted against the entry,
    /// retried by the tick); a PHY rejection is surfaced while the entry
    /// stays queued.
    fn transmit_initial(&self, peer: MacAddr, msg_id: MsgId, encoded: &[u8]) -> Result<(), EngineError> {
        if let Err(err) = self.phy.ensure_peer(peer) {
            debug!(%peer, %msg_id, error = %err, "peer registration failed on first send");
            lock(&self.queue).note_peer_add_failure(peer, msg_id);
            return Ok(());
        }

        match self.phy.send(peer, encoded) {
            Ok(()) => {
                trace!(%peer, %msg_id, "first transmission on air");
                Ok(())
            },
            Err(err) => {
                warn!(%peer, %msg_id, error = %err, "phy rejected first transmission");
                Err(EngineError::PhyUnavailable(err))
            },
        }
    }

    /// Transmit the ACK for an accepted DATA frame, best-effort.
    ///
    /// Failures are logged and dropped: the sender retransmits, and the
    /// duplicate will be ACKed again.
    fn send_ack(&self, dest: MacAddr, msg_id: MsgId) {
        let addressing = self.phy.addressing();

        let encoded = match Frame::ack(msg_id).encode(addressing, dest, self.phy.mtu()) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(%dest, %msg_id, error = %err, "cannot encode ack");
                return;
            },
        };

        if let Err(err) = self.phy.ensure_peer(dest) {
            debug!(%dest, %msg_id, error = %err, "peer registration failed for ack");
        }

        if let Err(err) = self.phy.send(dest, &encoded) {
            debug!(%dest, %msg_id, error = %err, "failed to transmit ack");
        }
    }
}

impl<P, E> std::fmt::Debug for Engine<P, E>
where
    P: PhyAdapter,
    E: Environment,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("pending", &self.pending_len())
            .field("history", &lock(&self.history).len())
            .finish()
    }
}
