//! Bridge from the PHY receive callback into the engine.
//!
//! The adapter's runtime (a driver task, never an ISR directly; an
//! interrupt line should only notify that task) pushes received frames into
//! [`PhyBinding::deliver`]. Where a platform callback API only accepts an
//! opaque context pointer, thread the binding through as that context; no
//! process-wide state is needed.

use std::sync::{Arc, Mutex};

use tracing::debug;
use wavelink_proto::MacAddr;

use crate::{engine::Engine, env::Environment, phy::PhyAdapter, sync::lock};

/// Receive-side handle on the engine for a PHY runtime.
///
/// Serializes reentry: concurrent `deliver` calls queue on an entry mutex,
/// so the receive path runs one frame at a time even if the PHY runtime
/// overlaps callbacks. Subscriber callbacks still run on the delivering
/// context and may call back into the engine.
pub struct PhyBinding<P, E>
where
    P: PhyAdapter,
    E: Environment,
{
    engine: Arc<Engine<P, E>>,
    entry: Mutex<()>,
}

impl<P, E> PhyBinding<P, E>
where
    P: PhyAdapter,
    E: Environment,
{
    /// Create a binding delivering into `engine`.
    pub fn new(engine: Arc<Engine<P, E>>) -> Self {
        Self { engine, entry: Mutex::new(()) }
    }

    /// The engine this binding delivers into.
    #[must_use]
    pub fn engine(&self) -> &Arc<Engine<P, E>> {
        &self.engine
    }

    /// Deliver one received frame.
    ///
    /// `sender` is the transmitting peer as known to the PHY; `raw` is the
    /// frame exactly as received, inline address prefix included.
    pub fn deliver(&self, sender: MacAddr, raw: &[u8]) {
        let _entry = lock(&self.entry);
        self.engine.handle_frame(sender, raw);
    }

    /// Transmit-done notification from the PHY, logging only.
    pub fn tx_done(&self, dest: MacAddr, ok: bool) {
        debug!(%dest, ok, "phy transmit done");
    }
}

impl<P, E> std::fmt::Debug for PhyBinding<P, E>
where
    P: PhyAdapter,
    E: Environment,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhyBinding").field("engine", &self.engine).finish()
    }
}
