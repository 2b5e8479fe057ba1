//! Production [`Environment`] using system time and OS entropy.

use std::time::Instant;

use crate::env::Environment;

/// Production environment: monotonic time from [`std::time::Instant`],
/// randomness from the OS via `getrandom`.
///
/// The microsecond epoch is the moment of construction; clones share it, so
/// values from any clone are mutually comparable.
///
/// # Panics
///
/// `random_bytes` panics if the OS RNG fails. This is intentional: message
/// ids without entropy would collide systematically, and RNG failure
/// indicates OS-level breakage that cannot be recovered here.
#[derive(Debug, Clone, Copy)]
pub struct SystemEnv {
    epoch: Instant,
}

impl SystemEnv {
    /// Create a new system environment anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for SystemEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SystemEnv {
    fn now_us(&self) -> i64 {
        self.epoch.elapsed().as_micros() as i64
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - message ids need entropy");
    }
}
