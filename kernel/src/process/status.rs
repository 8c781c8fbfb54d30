//! Exit status encoding and waitpid options.
//!
//! An exit status packs how a process terminated into one word: the low two
//! bits hold the kind, the rest hold the exit code or signal number.

use bitflags::bitflags;

const KIND_MASK: i32 = 0b11;
const KIND_SHIFT: u32 = 2;

const KIND_EXITED: i32 = 0;
const KIND_SIGNALED: i32 = 1;

/// Encoded termination status of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitStatus(i32);

impl ExitStatus {
    /// Normal termination through `exit(code)`.
    pub const fn exited(code: i32) -> Self {
        Self(code.wrapping_shl(KIND_SHIFT) | KIND_EXITED)
    }

    /// Termination by a fatal signal or fault.
    pub const fn signaled(signal: i32) -> Self {
        Self(signal.wrapping_shl(KIND_SHIFT) | KIND_SIGNALED)
    }

    /// Reinterpret a raw status word, as copied out to user space.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw status word.
    pub const fn raw(&self) -> i32 {
        self.0
    }

    const fn kind(&self) -> i32 {
        self.0 & KIND_MASK
    }

    const fn value(&self) -> i32 {
        self.0 >> KIND_SHIFT
    }

    /// True if the process called `exit`.
    pub const fn is_exited(&self) -> bool {
        self.kind() == KIND_EXITED
    }

    /// True if the process was killed by a signal or fatal fault.
    pub const fn is_signaled(&self) -> bool {
        self.kind() == KIND_SIGNALED
    }

    /// Exit code passed to `exit`, if the process exited normally.
    pub const fn exit_code(&self) -> Option<i32> {
        if self.is_exited() {
            Some(self.value())
        } else {
            None
        }
    }

    /// Signal that terminated the process, if any.
    pub const fn term_signal(&self) -> Option<i32> {
        if self.is_signaled() {
            Some(self.value())
        } else {
            None
        }
    }
}

impl core::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind() {
            KIND_EXITED => write!(f, "exited({})", self.value()),
            KIND_SIGNALED => write!(f, "signaled({})", self.value()),
            _ => write!(f, "unknown({:#x})", self.0),
        }
    }
}

bitflags! {
    /// Options accepted by waitpid.
    ///
    /// waitpid always blocks, so it accepts only the empty set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WaitOptions: u32 {
        /// Return immediately if the child has not exited
        const NOHANG = 0x1;
    }
}

impl WaitOptions {
    /// Check a raw options word from user space.
    pub fn is_supported(raw: u32) -> bool {
        WaitOptions::from_bits_retain(raw).is_empty()
    }
}
