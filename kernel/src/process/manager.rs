//! Process Manager
//!
//! Lifecycle operations over the process table: fork, exit, waitpid and the
//! identity queries. exec lives in [`super::exec`].
//!
//! The whole table sits behind one `spin::Mutex`. The lock is never held
//! across an address space copy, a thread spawn, a user memory copy or a
//! transfer of control out of the kernel.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

use super::context::ProcessContext;
use super::status::{ExitStatus, WaitOptions};
use super::table::{ProcessId, ProcessSnapshot, ProcessTable};
use crate::config::ProcConfig;
use crate::error::ProcError;
use crate::platform::{Platform, UserAddr};
use crate::syscall::TrapFrame;

/// Shared handle to a process's execution context
pub(crate) type ContextRef<P> = Arc<ProcessContext<P>>;

/// Process manager
pub struct ProcessManager<P: Platform> {
    platform: P,
    config: ProcConfig,
    table: Mutex<ProcessTable<ContextRef<P>>>,
}

impl<P: Platform> ProcessManager<P> {
    /// Create a process manager with an empty table
    pub fn new(platform: P, config: ProcConfig) -> Self {
        log::info!(
            "[TKOS Proc] Process manager initialized (pids {}..={})",
            config.pid_min,
            config.pid_max
        );
        Self {
            platform,
            table: Mutex::new(ProcessTable::new(&config)),
            config,
        }
    }

    /// The platform this manager runs on
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Active configuration
    pub fn config(&self) -> &ProcConfig {
        &self.config
    }

    /// Number of descriptors in the table, zombies included
    pub fn process_count(&self) -> usize {
        self.table.lock().len()
    }

    /// Check whether `pid` has a descriptor
    pub fn contains(&self, pid: ProcessId) -> bool {
        self.table.lock().contains(pid)
    }

    /// Snapshot of every descriptor
    pub fn snapshot(&self) -> Vec<ProcessSnapshot> {
        self.table.lock().snapshot()
    }

    pub(crate) fn table(&self) -> &Mutex<ProcessTable<ContextRef<P>>> {
        &self.table
    }

    /// PID and context of the calling process.
    ///
    /// # Panics
    ///
    /// If the calling thread is not bound to a process in the table.
    pub(crate) fn current(&self) -> (ProcessId, ContextRef<P>) {
        let pid = self.getpid();
        let table = self.table.lock();
        match table.lookup(pid) {
            Ok(desc) => (pid, Arc::clone(desc.context())),
            Err(_) => panic!("pid {} has no process descriptor", pid),
        }
    }

    // ==========================================
    // Identity
    // ==========================================

    /// PID of the calling process
    pub fn getpid(&self) -> ProcessId {
        match self.platform.current_pid() {
            Some(pid) => pid,
            None => panic!("process call from a thread bound to no process"),
        }
    }

    /// Parent PID of the calling process, [`ProcessId::KERNEL`] if it has none
    pub fn getppid(&self) -> ProcessId {
        let pid = self.getpid();
        let table = self.table.lock();
        match table.lookup(pid) {
            Ok(desc) => desc.parent().unwrap_or(ProcessId::KERNEL),
            Err(_) => panic!("pid {} has no process descriptor", pid),
        }
    }

    // ==========================================
    // fork
    // ==========================================

    /// Duplicate the calling process.
    ///
    /// The child gets a copy of the caller's address space and starts in a
    /// new thread from a copy of `frame`, seeing a return value of 0. The
    /// parent gets the child's PID. On failure nothing of the child remains.
    pub fn fork(self: &Arc<Self>, frame: &P::TrapFrame) -> Result<ProcessId, ProcError> {
        let (parent, parent_ctx) = self.current();
        let name = parent_ctx.name();

        let child_ctx = Arc::new(ProcessContext::new(name.clone()));
        let child = self
            .table
            .lock()
            .insert(Some(parent), Arc::clone(&child_ctx))?;

        let copied = match parent_ctx.with_space(|space| self.platform.as_copy(space)) {
            Some(copied) => copied,
            None => panic!("fork: pid {} has no address space", parent),
        };
        drop(parent_ctx);

        let space = match copied {
            Ok(space) => space,
            Err(e) => {
                log::warn!("[TKOS Proc] fork of pid {} failed to copy address space: {}", parent, e);
                self.table.lock().remove(child);
                return Err(ProcError::OutOfMemory);
            }
        };
        child_ctx.install_space(space);
        drop(child_ctx);

        let manager = Arc::clone(self);
        let child_frame = frame.clone();
        let spawned = self.platform.spawn(
            &name,
            child,
            Box::new(move || manager.enter_forked_process(child_frame)),
        );

        if let Err(e) = spawned {
            log::warn!("[TKOS Proc] fork of pid {} failed to spawn thread: {}", parent, e);
            let removed = self.table.lock().remove(child);
            if let Some(space) = removed.and_then(|desc| desc.context().take_space()) {
                self.platform.as_destroy(space);
            }
            return Err(ProcError::ResourceExhausted);
        }

        log::debug!("[TKOS Proc] pid {} forked child {} ({})", parent, child, name);
        Ok(child)
    }

    /// First code run by a forked child's thread.
    fn enter_forked_process(&self, mut frame: P::TrapFrame) -> ! {
        let (pid, ctx) = self.current();
        if ctx
            .with_space(|space| self.platform.as_activate(space))
            .is_none()
        {
            panic!("fork: child {} started without an address space", pid);
        }
        drop(ctx);

        frame.set_result(Ok(0));
        frame.advance_pc();
        self.platform.enter_user(frame)
    }

    // ==========================================
    // exit
    // ==========================================

    /// Terminate the calling process with exit code `code`.
    pub fn exit(&self, code: i32) -> ! {
        self.terminate(ExitStatus::exited(code))
    }

    /// Terminate the calling process as killed by `signal`.
    ///
    /// Used by trap handlers when a user program faults.
    pub fn kill_current(&self, signal: i32) -> ! {
        self.terminate(ExitStatus::signaled(signal))
    }

    fn terminate(&self, status: ExitStatus) -> ! {
        let (pid, ctx) = self.current();

        let outcome = self.table.lock().record_exit(pid, status);
        if let Some(event) = &outcome.exit_event {
            event.notify_all(&self.platform);
        }

        log::debug!(
            "[TKOS Proc] pid {} {} (orphaned {:?}, reaped {:?}{})",
            pid,
            status,
            outcome.orphaned_children,
            outcome.reaped_children,
            if outcome.self_removed { ", removed" } else { "" }
        );
        drop(outcome);

        self.platform.as_deactivate();
        if let Some(space) = ctx.take_space() {
            self.platform.as_destroy(space);
        }
        drop(ctx);

        self.platform.thread_exit()
    }

    // ==========================================
    // waitpid
    // ==========================================

    /// Wait for child `pid` to exit and reap it.
    ///
    /// The exit status is written to `status` in the caller's address space.
    /// If that write faults the child stays a zombie and can be waited for
    /// again.
    pub fn waitpid(&self, pid: ProcessId, status: UserAddr, options: u32) -> Result<ProcessId, ProcError> {
        if !WaitOptions::is_supported(options) {
            return Err(ProcError::InvalidArgument);
        }
        let caller = self.getpid();

        let mut table = self.table.lock();
        table.check_waitable(caller, pid)?;
        if status.is_null() {
            return Err(ProcError::BadAddress);
        }

        let exit_status = loop {
            let desc = table.check_waitable(caller, pid)?;
            if let Some(exit_status) = desc.exit_status() {
                break exit_status;
            }
            let event = Arc::clone(desc.exit_event());
            table = event.wait(table, &self.table, &self.platform);
        };
        drop(table);

        if let Err(e) = self
            .platform
            .copy_out(&exit_status.raw().to_ne_bytes(), status)
        {
            log::debug!("[TKOS Proc] waitpid({}) status copy-out failed: {}", pid, e);
            return Err(ProcError::BadAddress);
        }

        match self.table.lock().reap(caller, pid) {
            Ok(Some(_)) => {}
            other => panic!("waitpid: zombie {} changed while unlocked ({:?})", pid, other),
        }

        log::debug!("[TKOS Proc] pid {} reaped {} ({})", caller, pid, exit_status);
        Ok(pid)
    }
}

impl<P: Platform> core::fmt::Debug for ProcessManager<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessManager")
            .field("config", &self.config)
            .field("processes", &self.process_count())
            .finish_non_exhaustive()
    }
}
