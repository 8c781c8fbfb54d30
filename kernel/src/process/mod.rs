//! Process Management
//!
//! This module provides the process table and the lifecycle operations
//! (fork, exec, exit, waitpid) built on top of it.

pub mod context;
pub mod exec;
pub mod manager;
pub mod status;
pub mod table;

pub use context::ProcessContext;
pub use exec::EXEC_FAILURE_CODE;
pub use manager::ProcessManager;
pub use status::{ExitStatus, WaitOptions};
pub use table::{ExitOutcome, ProcessDescriptor, ProcessId, ProcessSnapshot, ProcessState, ProcessTable};
