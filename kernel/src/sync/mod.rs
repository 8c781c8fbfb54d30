//! Synchronization primitives for the process subsystem.
//!
//! The process table is guarded by a `spin::Mutex`; blocking waits are built
//! on top of it with [`Condvar`], which parks threads through the platform's
//! [`Futex`] wait/wake operations.

pub mod condvar;
pub mod futex;

pub use condvar::Condvar;
pub use futex::Futex;
