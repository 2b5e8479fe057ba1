//! Environment abstraction for deterministic testing.
//!
//! Decouples engine logic from system resources (time, randomness) so the
//! harness can run it against a virtual clock and a seeded RNG, while
//! production uses [`crate::SystemEnv`].

/// Abstract environment providing monotonic time and randomness.
///
/// Implementations MUST guarantee:
///
/// - `now_us()` never goes backwards within one execution context
/// - `random_bytes()` uses OS entropy in production; simulation
///   implementations may substitute a seeded RNG
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic microseconds since an arbitrary per-environment epoch.
    ///
    /// All retry, timeout, and dedup arithmetic is microsecond differences
    /// between values from the same environment, so the epoch itself is
    /// irrelevant.
    fn now_us(&self) -> i64;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);
}
