//! Futex wait/wake primitive.
//!
//! A futex is a 32-bit word plus a wait queue keyed by that word. Waiters
//! sleep only while the word still holds the value they sampled, so a wake
//! that races ahead of the sleep is never lost.

use core::sync::atomic::AtomicU32;

/// Wait count passed to [`Futex::futex_wake`] to wake every waiter.
pub const FUTEX_WAKE_ALL: u32 = u32::MAX;

/// Wait queue operations keyed by the address of an atomic word.
pub trait Futex {
    /// Block the calling thread while `word` equals `expected`.
    ///
    /// Returns immediately if the value already differs. Spurious returns
    /// are allowed; callers re-check their condition.
    fn futex_wait(&self, word: &AtomicU32, expected: u32);

    /// Wake up to `count` threads blocked on `word`.
    fn futex_wake(&self, word: &AtomicU32, count: u32);
}
