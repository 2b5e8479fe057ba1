//! Poison-tolerant mutex locking.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the guard when a panicking thread poisoned it.
///
/// The protected structures (send queue, dedup history, subscriber lists)
/// hold no invariants that a mid-section panic can break beyond losing that
/// section's work, so recovery is always safe.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
