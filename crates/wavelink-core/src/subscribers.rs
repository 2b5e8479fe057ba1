//! Typed subscriber lists.
//!
//! Four append-only callback lists, one per event kind: decoded text,
//! raw payload bytes, 16-bit commands, and ACK confirmations. Registration
//! never removes entries for the engine's lifetime.
//!
//! Dispatch clones the callback handles out under the list lock and invokes
//! them after it is released, so a callback may re-enter the engine (for
//! example to enqueue a reply) without deadlocking.

use std::sync::{Arc, Mutex};

use wavelink_proto::{MacAddr, MsgId};

use crate::sync::lock;

type MessageCallback = Arc<dyn Fn(MacAddr, String) + Send + Sync>;
type DataCallback = Arc<dyn Fn(MacAddr, Vec<u8>) + Send + Sync>;
type CommandCallback = Arc<dyn Fn(MacAddr, i16) + Send + Sync>;
type AckCallback = Arc<dyn Fn(MacAddr, MsgId) + Send + Sync>;

/// The four subscriber lists.
#[derive(Default)]
pub struct Subscribers {
    message: Mutex<Vec<MessageCallback>>,
    data: Mutex<Vec<DataCallback>>,
    command: Mutex<Vec<CommandCallback>>,
    ack: Mutex<Vec<AckCallback>>,
}

impl Subscribers {
    /// Create empty lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a text-message callback.
    pub fn add_message(&self, callback: impl Fn(MacAddr, String) + Send + Sync + 'static) {
        lock(&self.message).push(Arc::new(callback));
    }

    /// Register a raw-data callback.
    pub fn add_data(&self, callback: impl Fn(MacAddr, Vec<u8>) + Send + Sync + 'static) {
        lock(&self.data).push(Arc::new(callback));
    }

    /// Register a command callback.
    pub fn add_command(&self, callback: impl Fn(MacAddr, i16) + Send + Sync + 'static) {
        lock(&self.command).push(Arc::new(callback));
    }

    /// Register an ACK callback.
    pub fn add_ack(&self, callback: impl Fn(MacAddr, MsgId) + Send + Sync + 'static) {
        lock(&self.ack).push(Arc::new(callback));
    }

    /// Deliver decoded text to every message subscriber.
    pub fn notify_message(&self, sender: MacAddr, text: &str) {
        let callbacks = lock(&self.message).clone();
        for callback in callbacks {
            callback(sender, text.to_string());
        }
    }

    /// Deliver payload bytes to every data subscriber.
    pub fn notify_data(&self, sender: MacAddr, payload: &[u8]) {
        let callbacks = lock(&self.data).clone();
        for callback in callbacks {
            callback(sender, payload.to_vec());
        }
    }

    /// Deliver a decoded command to every command subscriber.
    pub fn notify_command(&self, sender: MacAddr, cmd: i16) {
        let callbacks = lock(&self.command).clone();
        for callback in callbacks {
            callback(sender, cmd);
        }
    }

    /// Deliver an ACK confirmation to every ACK subscriber.
    pub fn notify_ack(&self, sender: MacAddr, msg_id: MsgId) {
        let callbacks = lock(&self.ack).clone();
        for callback in callbacks {
            callback(sender, msg_id);
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("message", &lock(&self.message).len())
            .field("data", &lock(&self.data).len())
            .field("command", &lock(&self.command).len())
            .field("ack", &lock(&self.ack).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const SENDER: MacAddr = MacAddr([1, 2, 3, 4, 5, 6]);

    #[test]
    fn every_registered_callback_fires() {
        let subscribers = Subscribers::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            subscribers.add_data(move |_, _| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        subscribers.notify_data(SENDER, &[1, 2, 3]);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn callback_may_register_another_subscriber() {
        let subscribers = Arc::new(Subscribers::new());
        let count = Arc::new(AtomicUsize::new(0));

        {
            let subscribers = Arc::clone(&subscribers);
            let count = Arc::clone(&count);
            subscribers.clone().add_message(move |_, _| {
                let count = Arc::clone(&count);
                // Reentrant registration must not deadlock
                subscribers.add_message(move |_, _| {
                    count.fetch_add(1, Ordering::SeqCst);
                });
            });
        }

        subscribers.notify_message(SENDER, "x");
        // The newly registered callback only sees later notifications
        assert_eq!(count.load(Ordering::SeqCst), 0);

        subscribers.notify_message(SENDER, "y");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notification_kinds_are_independent() {
        let subscribers = Subscribers::new();
        let commands = Arc::new(Mutex::new(Vec::new()));

        {
            let commands = Arc::clone(&commands);
            subscribers.add_command(move |sender, cmd| {
                lock(&commands).push((sender, cmd));
            });
        }

        subscribers.notify_data(SENDER, &[0x12, 0x34, 0x12, 0x34]);
        assert!(lock(&commands).is_empty());

        subscribers.notify_command(SENDER, 0x1234);
        assert_eq!(lock(&commands).as_slice(), &[(SENDER, 0x1234)]);
    }
}
