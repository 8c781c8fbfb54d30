//! System call handling module.
//!
//! Decodes the trap frame saved at syscall entry and routes it to the
//! process lifecycle operations. The architecture-specific entry stub saves
//! the user registers into a [`TrapFrame`] and calls
//! [`ProcessManager::syscall`](crate::process::ProcessManager::syscall).

pub mod errno;
pub mod handlers;

use crate::error::ProcError;

/// System call numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum SyscallNumber {
    // ==========================================
    // Process Lifecycle (0-9)
    // ==========================================
    /// Duplicate the calling process.
    Fork = 0,
    /// Replace the program image.
    Execv = 2,
    /// Terminate the calling process.
    Exit = 3,
    /// Wait for a child process and reap its status.
    Waitpid = 4,

    // ==========================================
    // Process Info (5-9)
    // ==========================================
    /// Get process ID.
    Getpid = 5,
    /// Get parent process ID.
    Getppid = 6,
}

impl TryFrom<u64> for SyscallNumber {
    type Error = ();

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SyscallNumber::Fork),
            2 => Ok(SyscallNumber::Execv),
            3 => Ok(SyscallNumber::Exit),
            4 => Ok(SyscallNumber::Waitpid),
            5 => Ok(SyscallNumber::Getpid),
            6 => Ok(SyscallNumber::Getppid),
            _ => Err(()),
        }
    }
}

/// System call result type.
pub type SyscallResult = Result<u64, ProcError>;

/// User registers saved at syscall entry.
///
/// A trap frame is a plain value: fork clones the parent's frame and moves
/// the copy into the child thread, which returns to user mode through it.
pub trait TrapFrame: Clone + Send + 'static {
    /// Raw syscall number register.
    fn syscall_number(&self) -> u64;

    /// Argument register `index` (0-based).
    fn arg(&self, index: usize) -> u64;

    /// Write the syscall result back: the value on success, or the errno
    /// with the error flag set on failure.
    fn set_result(&mut self, result: Result<u64, i32>);

    /// Step the program counter past the syscall instruction.
    fn advance_pc(&mut self);
}
