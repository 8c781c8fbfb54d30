//! Kernel configuration.
//!
//! Compile-time limits for the process subsystem, and the runtime
//! [`ProcConfig`] handed to the process manager at boot.

/// Lowest process ID handed out by the process table.
pub const PID_MIN: i32 = 1;

/// Highest process ID handed out by the process table.
pub const PID_MAX: i32 = 32767;

/// Maximum length of a program path, including the terminator.
pub const PATH_MAX: usize = 1024;

/// Maximum total size of the argument strings passed to exec, terminators included.
pub const ARG_MAX: usize = 64 * 1024;

/// Maximum number of arguments passed to exec.
pub const MAX_ARGS: usize = 1024;

/// User-space stack size per process (1 MB).
pub const USER_STACK_SIZE: usize = 1024 * 1024;

/// Runtime configuration of the process subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcConfig {
    /// Lowest allocatable PID
    pub pid_min: i32,
    /// Highest allocatable PID (inclusive)
    pub pid_max: i32,
    /// Maximum accepted program path length
    pub path_max: usize,
    /// Maximum total argument bytes for exec
    pub arg_max: usize,
    /// Maximum argument count for exec
    pub max_args: usize,
}

impl ProcConfig {
    /// Configuration built from the compile-time limits.
    pub const fn new() -> Self {
        Self {
            pid_min: PID_MIN,
            pid_max: PID_MAX,
            path_max: PATH_MAX,
            arg_max: ARG_MAX,
            max_args: MAX_ARGS,
        }
    }

    /// Restrict the PID range to `[min, max]`.
    ///
    /// `min` is raised to [`PID_MIN`]: PID 0 is the kernel, reported by
    /// getppid for processes without a parent.
    pub const fn with_pid_range(mut self, min: i32, max: i32) -> Self {
        self.pid_min = if min < PID_MIN { PID_MIN } else { min };
        self.pid_max = max;
        self
    }

    /// Override the maximum program path length.
    pub const fn with_path_max(mut self, path_max: usize) -> Self {
        self.path_max = path_max;
        self
    }

    /// Override the exec argument limits.
    pub const fn with_arg_limits(mut self, arg_max: usize, max_args: usize) -> Self {
        self.arg_max = arg_max;
        self.max_args = max_args;
        self
    }

    /// Number of PIDs the table can hand out at once.
    pub fn pid_capacity(&self) -> usize {
        pid_span(self.pid_min.max(PID_MIN), self.pid_max)
    }
}

/// Number of PIDs in `[min, max]`, zero if the range is empty.
pub(crate) fn pid_span(min: i32, max: i32) -> usize {
    if max < min {
        0
    } else {
        (i64::from(max) - i64::from(min) + 1) as usize
    }
}

impl Default for ProcConfig {
    fn default() -> Self {
        Self::new()
    }
}
