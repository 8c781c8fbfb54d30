//! Platform abstraction for the process subsystem
//!
//! The lifecycle core never touches page tables, ELF files, raw user memory
//! or CPU state directly. Those operations belong to the platform, which
//! the kernel reaches through the traits in this module:
//!
//! - [`UserMemory`]: validated copies between kernel buffers and the
//!   currently active user address space
//! - [`Futex`](crate::sync::Futex): the wait/wake primitive condition
//!   variables are built on
//! - [`Platform`]: address spaces, program images, threads and the
//!   trampolines into user mode
//!
//! # Implementations
//!
//! - **Bare metal**: page-table backed address spaces, ELF loader, trap return
//! - **Hosted** (`tkos-hosted`): OS threads and simulated sparse memory, for tests

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;

use crate::process::ProcessId;
use crate::sync::Futex;
use crate::syscall::TrapFrame;

/// A virtual address in a user address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserAddr(pub u64);

impl UserAddr {
    /// The null user pointer.
    pub const NULL: UserAddr = UserAddr(0);

    /// Get the raw address value
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Check for the null pointer
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address `bytes` above this one, or `None` on overflow.
    pub fn checked_add(self, bytes: u64) -> Option<UserAddr> {
        self.0.checked_add(bytes).map(UserAddr)
    }

    /// Address `bytes` below this one, or `None` on underflow.
    pub fn checked_sub(self, bytes: u64) -> Option<UserAddr> {
        self.0.checked_sub(bytes).map(UserAddr)
    }

    /// Round down to a multiple of `align` (a power of two).
    pub const fn align_down(self, align: u64) -> UserAddr {
        UserAddr(self.0 & !(align - 1))
    }

    /// Check alignment to `align` (a power of two).
    pub const fn is_aligned(self, align: u64) -> bool {
        self.0 & (align - 1) == 0
    }
}

impl core::fmt::Display for UserAddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Errors reported by platform collaborators.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// Allocation of frames, page tables or kernel memory failed
    #[error("out of memory")]
    OutOfMemory,

    /// User pointer outside the mapped user address space
    #[error("bad user address")]
    BadAddress,

    /// String copy hit its maximum length before the terminator
    #[error("string too long")]
    NameTooLong,

    /// No program image at the given path
    #[error("no such file")]
    NotFound,

    /// The image exists but is not a loadable program
    #[error("not an executable image")]
    NotExecutable,

    /// A copied-in string is not valid UTF-8
    #[error("invalid string")]
    InvalidString,

    /// No more kernel threads can be created
    #[error("thread limit reached")]
    TooManyThreads,

    /// Device or filesystem failure while reading an image
    #[error("I/O error")]
    Io,
}

/// Copies between kernel buffers and the active user address space.
///
/// Every operation validates the user range and fails with
/// [`PlatformError::BadAddress`] instead of faulting.
pub trait UserMemory {
    /// Copy `dst.len()` bytes from user address `src`.
    fn copy_in(&self, src: UserAddr, dst: &mut [u8]) -> Result<(), PlatformError>;

    /// Copy `src` to user address `dst`.
    fn copy_out(&self, src: &[u8], dst: UserAddr) -> Result<(), PlatformError>;

    /// Copy a NUL-terminated string of at most `max` bytes (terminator
    /// included) from user address `src`.
    ///
    /// Fails with [`PlatformError::NameTooLong`] if no terminator is found
    /// within `max` bytes, and with [`PlatformError::InvalidString`] if the
    /// bytes are not UTF-8.
    fn copy_in_str(&self, src: UserAddr, max: usize) -> Result<String, PlatformError> {
        let mut bytes = vec![];
        let mut byte = [0u8; 1];
        let mut addr = src;
        while bytes.len() < max {
            self.copy_in(addr, &mut byte)?;
            if byte[0] == 0 {
                return String::from_utf8(bytes).map_err(|_| PlatformError::InvalidString);
            }
            bytes.push(byte[0]);
            addr = addr.checked_add(1).ok_or(PlatformError::BadAddress)?;
        }
        Err(PlatformError::NameTooLong)
    }

    /// Copy `s` plus a NUL terminator to user address `dst`, writing at most
    /// `max` bytes. Returns the number of bytes written.
    fn copy_out_str(&self, s: &str, dst: UserAddr, max: usize) -> Result<usize, PlatformError> {
        let len = s.len() + 1;
        if len > max {
            return Err(PlatformError::NameTooLong);
        }
        self.copy_out(s.as_bytes(), dst)?;
        let end = dst
            .checked_add(s.len() as u64)
            .ok_or(PlatformError::BadAddress)?;
        self.copy_out(&[0], end)?;
        Ok(len)
    }
}

/// Entry point run on a freshly spawned kernel thread.
pub type ThreadEntry = Box<dyn FnOnce() + Send + 'static>;

/// Machine and scheduler services consumed by the process manager.
///
/// # Associated Types
///
/// - `AddrSpace`: an owned user address space; dropping it releases it
/// - `Image`: an open program image
/// - `TrapFrame`: the register snapshot taken at syscall entry
pub trait Platform: UserMemory + Futex + Send + Sync + 'static {
    /// Owned user address space
    type AddrSpace: Send + 'static;
    /// Open program image
    type Image;
    /// Saved user registers at syscall entry
    type TrapFrame: TrapFrame;

    // === Address Spaces ===

    /// Create an empty address space
    fn as_create(&self) -> Result<Self::AddrSpace, PlatformError>;

    /// Deep-copy `src` into a new address space; `src` is untouched on failure
    fn as_copy(&self, src: &Self::AddrSpace) -> Result<Self::AddrSpace, PlatformError>;

    /// Release an address space
    fn as_destroy(&self, space: Self::AddrSpace) {
        drop(space);
    }

    /// Make `space` the current thread's user address space
    fn as_activate(&self, space: &Self::AddrSpace);

    /// Leave the current thread with no user address space
    fn as_deactivate(&self);

    /// Map the user stack in `space`, returning the initial stack pointer
    fn as_define_stack(&self, space: &mut Self::AddrSpace) -> Result<UserAddr, PlatformError>;

    // === Program Images ===

    /// Open the program image at `path`
    fn open_image(&self, path: &str) -> Result<Self::Image, PlatformError>;

    /// Load `image` into `space`, returning the entry address
    fn load_image(
        &self,
        image: &mut Self::Image,
        space: &mut Self::AddrSpace,
    ) -> Result<UserAddr, PlatformError>;

    /// Close an image handle
    fn close_image(&self, image: Self::Image) {
        drop(image);
    }

    // === Threads ===

    /// Start a new thread bound to process `owner` running `entry`
    fn spawn(&self, name: &str, owner: ProcessId, entry: ThreadEntry) -> Result<(), PlatformError>;

    /// Process the calling thread is bound to, if any
    fn current_pid(&self) -> Option<ProcessId>;

    /// Terminate the calling thread
    fn thread_exit(&self) -> !;

    // === User Mode Entry ===

    /// Return to user mode with the registers in `frame`
    fn enter_user(&self, frame: Self::TrapFrame) -> !;

    /// Start a freshly loaded image at `entry` with `argc`/`argv` in the
    /// argument registers and `stack` as the stack pointer
    fn enter_new_process(&self, argc: usize, argv: UserAddr, stack: UserAddr, entry: UserAddr)
        -> !;
}
