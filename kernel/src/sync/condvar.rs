//! Condition variable over `spin::Mutex`.
//!
//! A generation counter doubles as the futex word: waiters sample it while
//! still holding the mutex, notifiers bump it before waking.

use core::sync::atomic::{AtomicU32, Ordering};
use spin::{Mutex, MutexGuard};

use super::futex::{Futex, FUTEX_WAKE_ALL};

/// Condition variable paired with a `spin::Mutex`.
#[derive(Debug)]
pub struct Condvar {
    seq: AtomicU32,
}

impl Condvar {
    /// Creates a new condition variable.
    pub const fn new() -> Self {
        Condvar {
            seq: AtomicU32::new(0),
        }
    }

    /// Release `guard`, sleep until notified, and re-acquire `mutex`.
    ///
    /// `guard` must have been obtained from `mutex`. Wakeups may be
    /// spurious; callers loop on their own predicate.
    pub fn wait<'a, T, F>(
        &self,
        guard: MutexGuard<'a, T>,
        mutex: &'a Mutex<T>,
        futex: &F,
    ) -> MutexGuard<'a, T>
    where
        F: Futex + ?Sized,
    {
        let key = self.seq.load(Ordering::Acquire);

        // Release the mutex
        drop(guard);

        futex.futex_wait(&self.seq, key);

        mutex.lock()
    }

    /// Wakes all waiting threads.
    pub fn notify_all<F: Futex + ?Sized>(&self, futex: &F) {
        self.seq.fetch_add(1, Ordering::AcqRel);
        futex.futex_wake(&self.seq, FUTEX_WAKE_ALL);
    }
}

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}
