//! Process Context
//!
//! Execution context owned by a process descriptor: the program name and
//! the user address space the process runs in.

use alloc::string::String;
use spin::Mutex;

use crate::platform::Platform;

/// Execution context of one process.
///
/// The process table holds the owning `Arc`; the thread running the process
/// holds a clone only for the duration of a syscall. The address space slot
/// is empty between fork's reservation and installation, and after exit.
pub struct ProcessContext<P: Platform> {
    name: Mutex<String>,
    space: Mutex<Option<P::AddrSpace>>,
}

impl<P: Platform> ProcessContext<P> {
    /// Create a context with no address space
    pub fn new(name: String) -> Self {
        Self {
            name: Mutex::new(name),
            space: Mutex::new(None),
        }
    }

    /// Program name (the path of the last successful exec)
    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub(crate) fn set_name(&self, name: String) {
        *self.name.lock() = name;
    }

    /// Check whether an address space is installed
    pub fn has_space(&self) -> bool {
        self.space.lock().is_some()
    }

    /// Run `f` on the installed address space, if any.
    pub fn with_space<R>(&self, f: impl FnOnce(&P::AddrSpace) -> R) -> Option<R> {
        self.space.lock().as_ref().map(f)
    }

    /// Install `space`, returning the one it replaces
    pub fn install_space(&self, space: P::AddrSpace) -> Option<P::AddrSpace> {
        self.space.lock().replace(space)
    }

    /// Remove and return the address space
    pub fn take_space(&self) -> Option<P::AddrSpace> {
        self.space.lock().take()
    }
}

impl<P: Platform> core::fmt::Debug for ProcessContext<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("name", &*self.name.lock())
            .field("has_space", &self.has_space())
            .finish()
    }
}
