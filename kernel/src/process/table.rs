//! Process Table
//!
//! Maintains the table of all processes in the system and the
//! parent/child state machine that decides when a descriptor may leave it.
//!
//! A descriptor is removed only once nobody can ever ask for its exit
//! status again:
//!
//! - a dead process with no parent removes itself when it exits
//! - a dead process with a live parent stays as a zombie until the parent
//!   reaps it, or until the parent exits without reaping it
//! - a live process whose parent exits becomes an orphan and will remove
//!   itself when it exits
//!
//! The table does no locking of its own. The process manager keeps it behind
//! a single `spin::Mutex`, so holding `&mut ProcessTable` means holding the lock.

use alloc::sync::Arc;
use alloc::vec::Vec;
use hashbrown::HashMap;

use super::status::ExitStatus;
use crate::config::{pid_span, ProcConfig, PID_MIN};
use crate::error::ProcError;
use crate::sync::Condvar;

/// Process ID type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub i32);

impl ProcessId {
    /// Reported as the parent of processes that have none.
    pub const KERNEL: ProcessId = ProcessId(0);

    /// Create a ProcessId from a raw value
    pub const fn from_raw(val: i32) -> Self {
        ProcessId(val)
    }

    /// Get the raw ID value
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl core::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Process is running (or runnable, or blocked)
    Alive,
    /// Process has exited; the status is kept until it is reaped
    Exited(ExitStatus),
}

/// One entry of the process table.
pub struct ProcessDescriptor<C> {
    pid: ProcessId,
    parent: Option<ProcessId>,
    state: ProcessState,
    context: C,
    exited: Arc<Condvar>,
}

impl<C> ProcessDescriptor<C> {
    fn new(pid: ProcessId, parent: Option<ProcessId>, context: C) -> Self {
        Self {
            pid,
            parent,
            state: ProcessState::Alive,
            context,
            exited: Arc::new(Condvar::new()),
        }
    }

    /// Process ID
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Parent process, `None` for root processes and orphans
    pub fn parent(&self) -> Option<ProcessId> {
        self.parent
    }

    /// Current state
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// True until the process exits
    pub fn is_alive(&self) -> bool {
        self.state == ProcessState::Alive
    }

    /// Exit status, once the process has exited
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self.state {
            ProcessState::Alive => None,
            ProcessState::Exited(status) => Some(status),
        }
    }

    /// Execution context owned by this entry
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Event signalled when this process exits
    pub fn exit_event(&self) -> &Arc<Condvar> {
        &self.exited
    }
}

impl<C> core::fmt::Debug for ProcessDescriptor<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessDescriptor")
            .field("pid", &self.pid)
            .field("parent", &self.parent)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// What a process exit did to the table.
#[derive(Debug, Default)]
pub struct ExitOutcome {
    /// Zombie children removed because their parent will never reap them
    pub reaped_children: Vec<ProcessId>,
    /// Live children whose parent link was cleared
    pub orphaned_children: Vec<ProcessId>,
    /// The exiting process had no parent and left the table immediately
    pub self_removed: bool,
    /// Exit event to notify when the process stays behind as a zombie
    pub exit_event: Option<Arc<Condvar>>,
}

/// Lightweight snapshot of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSnapshot {
    pub pid: ProcessId,
    pub parent: Option<ProcessId>,
    pub state: ProcessState,
}

/// Table of all processes indexed by PID
pub struct ProcessTable<C> {
    processes: HashMap<ProcessId, ProcessDescriptor<C>>,
    pid_min: i32,
    pid_max: i32,
    /// Next PID to try (next-fit allocation)
    next_pid: i32,
}

impl<C> ProcessTable<C> {
    /// Create an empty table handing out PIDs from `config`'s range
    ///
    /// A lower bound below [`PID_MIN`] is raised to it, so the kernel's PID
    /// is never handed out.
    pub fn new(config: &ProcConfig) -> Self {
        let pid_min = config.pid_min.max(PID_MIN);
        Self {
            processes: HashMap::new(),
            pid_min,
            pid_max: config.pid_max,
            next_pid: pid_min,
        }
    }

    fn capacity(&self) -> usize {
        pid_span(self.pid_min, self.pid_max)
    }

    /// Allocate an unused PID, starting after the last one handed out.
    fn alloc_pid(&mut self) -> Result<ProcessId, ProcError> {
        let capacity = self.capacity();
        if self.processes.len() >= capacity {
            return Err(ProcError::ResourceExhausted);
        }

        for _ in 0..capacity {
            let candidate = ProcessId(self.next_pid);
            self.next_pid = if self.next_pid >= self.pid_max {
                self.pid_min
            } else {
                self.next_pid + 1
            };
            if !self.processes.contains_key(&candidate) {
                return Ok(candidate);
            }
        }

        Err(ProcError::ResourceExhausted)
    }

    /// Add a new live process under a fresh PID.
    ///
    /// Fails with [`ProcError::ResourceExhausted`] when every PID is in use,
    /// in which case `context` is dropped.
    pub fn insert(&mut self, parent: Option<ProcessId>, context: C) -> Result<ProcessId, ProcError> {
        let pid = self.alloc_pid()?;
        self.processes
            .insert(pid, ProcessDescriptor::new(pid, parent, context));
        Ok(pid)
    }

    /// Get a process by PID
    pub fn lookup(&self, pid: ProcessId) -> Result<&ProcessDescriptor<C>, ProcError> {
        self.processes.get(&pid).ok_or(ProcError::NoSuchProcess)
    }

    /// Remove a process, releasing its context when the returned entry drops
    pub fn remove(&mut self, pid: ProcessId) -> Option<ProcessDescriptor<C>> {
        self.processes.remove(&pid)
    }

    /// Check whether a PID is present
    pub fn contains(&self, pid: ProcessId) -> bool {
        self.processes.contains_key(&pid)
    }

    /// Get count of processes
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// True if no process is present
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Iterate over all processes
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&ProcessDescriptor<C>),
    {
        for desc in self.processes.values() {
            f(desc);
        }
    }

    /// PIDs of every process whose parent is `pid`
    pub fn children_of(&self, pid: ProcessId) -> Vec<ProcessId> {
        self.processes
            .values()
            .filter(|desc| desc.parent == Some(pid))
            .map(|desc| desc.pid)
            .collect()
    }

    /// Snapshot of every process, for inspection without holding the lock
    pub fn snapshot(&self) -> Vec<ProcessSnapshot> {
        self.processes
            .values()
            .map(|desc| ProcessSnapshot {
                pid: desc.pid,
                parent: desc.parent,
                state: desc.state,
            })
            .collect()
    }

    /// Record the exit of `pid` and settle everything that depends on it.
    ///
    /// Zombie children are removed, live children become orphans, and the
    /// process itself is removed at once if it has no parent.
    ///
    /// # Panics
    ///
    /// If `pid` is not in the table or has already exited.
    pub fn record_exit(&mut self, pid: ProcessId, status: ExitStatus) -> ExitOutcome {
        let desc = self
            .processes
            .get_mut(&pid)
            .unwrap_or_else(|| panic!("exit: pid {} missing from process table", pid));
        assert!(desc.is_alive(), "exit: pid {} exited twice", pid);
        desc.state = ProcessState::Exited(status);

        let mut outcome = ExitOutcome::default();

        for child in self.children_of(pid) {
            let Some(desc) = self.processes.get_mut(&child) else {
                continue;
            };
            if desc.is_alive() {
                desc.parent = None;
                outcome.orphaned_children.push(child);
            } else {
                self.processes.remove(&child);
                outcome.reaped_children.push(child);
            }
        }

        let has_parent = self
            .processes
            .get(&pid)
            .map(|desc| desc.parent.is_some())
            .unwrap_or_else(|| panic!("exit: pid {} vanished during exit", pid));

        if has_parent {
            outcome.exit_event = self
                .processes
                .get(&pid)
                .map(|desc| Arc::clone(&desc.exited));
        } else {
            self.processes.remove(&pid);
            outcome.self_removed = true;
        }

        outcome
    }

    /// Check that `caller` may wait for `pid`.
    pub fn check_waitable(
        &self,
        caller: ProcessId,
        pid: ProcessId,
    ) -> Result<&ProcessDescriptor<C>, ProcError> {
        let desc = self.lookup(pid)?;
        if desc.parent != Some(caller) {
            return Err(ProcError::NotMyChild);
        }
        Ok(desc)
    }

    /// Reap `pid` on behalf of `caller`.
    ///
    /// Returns `Ok(None)` while the child is still alive. Once it has exited
    /// the descriptor is removed and its status returned; a second reap of
    /// the same PID fails with [`ProcError::NoSuchProcess`].
    pub fn reap(&mut self, caller: ProcessId, pid: ProcessId) -> Result<Option<ExitStatus>, ProcError> {
        let Some(status) = self.check_waitable(caller, pid)?.exit_status() else {
            return Ok(None);
        };
        self.processes.remove(&pid);
        Ok(Some(status))
    }
}
