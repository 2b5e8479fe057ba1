//! Scripted PHY adapter.
//!
//! Records every transmission instead of putting it on air; tests pump the
//! recorded frames into whichever [`wavelink_core::PhyBinding`] the scenario
//! calls for (the peer's, or the same engine's for loopback), drop them to
//! simulate loss, or leave them unread for an offline peer.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tracing::trace;
use wavelink_core::{PhyAdapter, PhyError};
use wavelink_proto::{Addressing, MacAddr};

#[derive(Debug, Default)]
struct SimPhyState {
    sent: Vec<(MacAddr, Vec<u8>)>,
    sent_total: usize,
    fail_sends: u32,
    fail_peer_adds: HashMap<MacAddr, u32>,
    registered: Vec<MacAddr>,
}

/// Recording PHY adapter with scripted failures.
///
/// A cloneable handle: the engine owns one clone, the test keeps another to
/// script failures and read the transcript.
#[derive(Debug, Clone)]
pub struct SimPhy {
    addressing: Addressing,
    mtu: usize,
    state: Arc<Mutex<SimPhyState>>,
}

impl SimPhy {
    /// Short-range PHY: [`Addressing::Direct`], 250-byte MTU.
    #[must_use]
    pub fn direct() -> Self {
        Self::new(Addressing::Direct, 250)
    }

    /// Long-range PHY: [`Addressing::Prefixed`], 255-byte MTU.
    #[must_use]
    pub fn prefixed() -> Self {
        Self::new(Addressing::Prefixed, 255)
    }

    /// A PHY with an explicit addressing mode and MTU.
    #[must_use]
    pub fn new(addressing: Addressing, mtu: usize) -> Self {
        Self { addressing, mtu, state: Arc::new(Mutex::new(SimPhyState::default())) }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SimPhyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `n` sends fail with [`PhyError::Busy`].
    pub fn fail_next_sends(&self, n: u32) {
        self.state().fail_sends = n;
    }

    /// Make the next `n` peer registrations for `mac` fail.
    pub fn fail_peer_registrations(&self, mac: MacAddr, n: u32) {
        self.state().fail_peer_adds.insert(mac, n);
    }

    /// Drain and return everything transmitted since the last call.
    #[must_use]
    pub fn take_sent(&self) -> Vec<(MacAddr, Vec<u8>)> {
        std::mem::take(&mut self.state().sent)
    }

    /// Total successful transmissions over the PHY's lifetime.
    #[must_use]
    pub fn sent_total(&self) -> usize {
        self.state().sent_total
    }

    /// Peers registered through `ensure_peer`, in first-seen order.
    #[must_use]
    pub fn registered_peers(&self) -> Vec<MacAddr> {
        self.state().registered.clone()
    }
}

impl PhyAdapter for SimPhy {
    fn addressing(&self) -> Addressing {
        self.addressing
    }

    fn mtu(&self) -> usize {
        self.mtu
    }

    fn send(&self, dest: MacAddr, frame: &[u8]) -> Result<(), PhyError> {
        let mut state = self.state();

        if state.fail_sends > 0 {
            state.fail_sends -= 1;
            trace!(%dest, "sim phy: scripted send failure");
            return Err(PhyError::Busy);
        }

        trace!(%dest, len = frame.len(), "sim phy: frame on air");
        state.sent.push((dest, frame.to_vec()));
        state.sent_total += 1;
        Ok(())
    }

    fn ensure_peer(&self, mac: MacAddr) -> Result<(), PhyError> {
        let mut state = self.state();

        if let Some(remaining) = state.fail_peer_adds.get_mut(&mac) {
            if *remaining > 0 {
                *remaining -= 1;
                trace!(%mac, "sim phy: scripted peer registration failure");
                return Err(PhyError::PeerRegistration { mac });
            }
        }

        if !state.registered.contains(&mac) {
            state.registered.push(mac);
        }
        Ok(())
    }
}
