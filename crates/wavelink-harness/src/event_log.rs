//! Subscriber transcript.

use std::sync::{Arc, Mutex, PoisonError};

use wavelink_core::{Engine, Environment, PhyAdapter};
use wavelink_proto::{MacAddr, MsgId};

/// One subscriber notification, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `on_message`: decoded text from a non-empty payload
    Message(MacAddr, String),
    /// `on_data`: raw payload bytes
    Data(MacAddr, Vec<u8>),
    /// `on_command`: decoded 16-bit command
    Command(MacAddr, i16),
    /// `on_ack`: first ACK for an in-flight message
    Ack(MacAddr, MsgId),
}

/// Records every subscriber notification an engine dispatches.
///
/// A cloneable handle; [`EventLog::attach`] registers one callback of each
/// kind, all feeding a single ordered transcript.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register this log on all four of the engine's subscriber lists.
    pub fn attach<P, E>(&self, engine: &Engine<P, E>)
    where
        P: PhyAdapter,
        E: Environment,
    {
        let log = self.clone();
        engine.on_message(move |sender, text| log.push(Event::Message(sender, text)));

        let log = self.clone();
        engine.on_data(move |sender, payload| log.push(Event::Data(sender, payload)));

        let log = self.clone();
        engine.on_command(move |sender, cmd| log.push(Event::Command(sender, cmd)));

        let log = self.clone();
        engine.on_ack(move |sender, msg_id| log.push(Event::Ack(sender, msg_id)));
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }

    /// The full transcript, in dispatch order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// All `on_message` notifications.
    #[must_use]
    pub fn messages(&self) -> Vec<(MacAddr, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Message(sender, text) => Some((sender, text)),
                _ => None,
            })
            .collect()
    }

    /// All `on_data` notifications.
    #[must_use]
    pub fn data(&self) -> Vec<(MacAddr, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Data(sender, payload) => Some((sender, payload)),
                _ => None,
            })
            .collect()
    }

    /// All `on_command` notifications.
    #[must_use]
    pub fn commands(&self) -> Vec<(MacAddr, i16)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Command(sender, cmd) => Some((sender, cmd)),
                _ => None,
            })
            .collect()
    }

    /// All `on_ack` notifications.
    #[must_use]
    pub fn acks(&self) -> Vec<(MacAddr, MsgId)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Ack(sender, msg_id) => Some((sender, msg_id)),
                _ => None,
            })
            .collect()
    }
}
