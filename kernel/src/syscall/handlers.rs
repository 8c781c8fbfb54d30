//! System call handlers.
//!
//! Decodes the arguments of each process syscall from the trap frame and
//! writes the result back. `exit` and a successful `execv` never return here.

use alloc::sync::Arc;

use super::{errno, SyscallNumber, SyscallResult, TrapFrame};
use crate::platform::{Platform, UserAddr};
use crate::process::{ProcessId, ProcessManager};

impl<P: Platform> ProcessManager<P> {
    /// Handle the syscall described by `frame`.
    ///
    /// On return the frame holds the result (or errno) and its program
    /// counter has been advanced past the syscall instruction.
    pub fn syscall(self: &Arc<Self>, frame: &mut P::TrapFrame) {
        let number = frame.syscall_number();

        let result = match SyscallNumber::try_from(number) {
            Ok(syscall) => self.handle(syscall, frame),
            Err(()) => {
                log::debug!("[TKOS Syscall] unknown syscall {}", number);
                frame.set_result(Err(errno::ENOSYS));
                frame.advance_pc();
                return;
            }
        };

        #[cfg(feature = "trace-syscalls")]
        log::trace!(
            "[TKOS Syscall] pid {} {:?} -> {}",
            self.getpid(),
            SyscallNumber::try_from(number),
            match &result {
                Ok(value) => alloc::format!("{}", value),
                Err(e) => alloc::format!("{} ({})", errno::name(e.errno()), e),
            }
        );

        frame.set_result(result.map_err(|e| e.errno()));
        frame.advance_pc();
    }

    fn handle(self: &Arc<Self>, syscall: SyscallNumber, frame: &P::TrapFrame) -> SyscallResult {
        match syscall {
            SyscallNumber::Fork => self.handle_fork(frame),
            SyscallNumber::Execv => self.handle_execv(frame),
            SyscallNumber::Exit => self.exit(frame.arg(0) as i32),
            SyscallNumber::Waitpid => self.handle_waitpid(frame),
            SyscallNumber::Getpid => Ok(pid_result(self.getpid())),
            SyscallNumber::Getppid => Ok(pid_result(self.getppid())),
        }
    }

    /// fork() -> child pid
    fn handle_fork(self: &Arc<Self>, frame: &P::TrapFrame) -> SyscallResult {
        self.fork(frame).map(pid_result)
    }

    /// execv(path, argv)
    fn handle_execv(&self, frame: &P::TrapFrame) -> SyscallResult {
        let path = UserAddr(frame.arg(0));
        let argv = UserAddr(frame.arg(1));
        match self.execv(path, argv) {
            Ok(never) => match never {},
            Err(e) => Err(e),
        }
    }

    /// waitpid(pid, status, options) -> pid
    fn handle_waitpid(&self, frame: &P::TrapFrame) -> SyscallResult {
        let pid = ProcessId::from_raw(frame.arg(0) as i32);
        let status = UserAddr(frame.arg(1));
        let options = frame.arg(2) as u32;
        self.waitpid(pid, status, options).map(pid_result)
    }
}

fn pid_result(pid: ProcessId) -> u64 {
    pid.as_i32() as u64
}
