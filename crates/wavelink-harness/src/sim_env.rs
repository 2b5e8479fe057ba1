//! Simulated environment: virtual clock and seeded RNG.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicI64, Ordering},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wavelink_core::Environment;

/// Deterministic [`Environment`]: time advances only when the test says so,
/// and randomness comes from a ChaCha stream seeded at construction.
///
/// Clones share both the clock and the RNG stream, so an engine and its
/// test observe the same virtual time.
#[derive(Debug, Clone)]
pub struct SimEnv {
    now_us: Arc<AtomicI64>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Create an environment at t=0 with the given RNG seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            now_us: Arc::new(AtomicI64::new(0)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Advance the virtual clock by `us` microseconds.
    pub fn advance_us(&self, us: i64) {
        self.now_us.fetch_add(us, Ordering::SeqCst);
    }

    /// Advance the virtual clock by `ms` milliseconds.
    pub fn advance_ms(&self, ms: i64) {
        self.advance_us(ms * 1000);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::seeded(0)
    }
}

impl Environment for SimEnv {
    fn now_us(&self) -> i64 {
        self.now_us.load(Ordering::SeqCst)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
