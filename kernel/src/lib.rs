//! tkos Kernel Library
//!
//! Process lifecycle core of the tkos teaching kernel: the process table,
//! fork/exec/exit/waitpid, the user-stack argument marshaller and the
//! syscall gate that routes trap frames into them.
//!
//! Everything machine-specific (address spaces, image loading, user memory
//! copies, thread creation and the user-mode trampolines) is reached through
//! the [`Platform`] trait, so the same core runs on real hardware and on the
//! hosted test platform.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod config;
pub mod error;
pub mod loader;
pub mod platform;
pub mod process;
pub mod sync;
pub mod syscall;

pub use config::ProcConfig;
pub use error::ProcError;
pub use platform::{Platform, PlatformError, UserAddr, UserMemory};
pub use process::{
    ExitStatus, ProcessContext, ProcessDescriptor, ProcessId, ProcessManager, ProcessState,
    ProcessTable, WaitOptions,
};
pub use sync::{Condvar, Futex};
pub use syscall::{SyscallNumber, TrapFrame};
