//! Error numbers reported on the syscall ABI.
//!
//! A failed syscall sets the error flag in the trap frame and places one of
//! these values in the result register.

/// Function not implemented (unknown syscall number)
pub const ENOSYS: i32 = 1;
/// Out of memory
pub const ENOMEM: i32 = 3;
/// Bad memory reference
pub const EFAULT: i32 = 6;
/// String too long
pub const ENAMETOOLONG: i32 = 7;
/// Invalid argument
pub const EINVAL: i32 = 8;
/// Too many processes in system
pub const ENPROC: i32 = 12;
/// File is not executable
pub const ENOEXEC: i32 = 13;
/// Argument list too long
pub const E2BIG: i32 = 14;
/// No such process
pub const ESRCH: i32 = 15;
/// No child processes
pub const ECHILD: i32 = 16;
/// No such file or directory
pub const ENOENT: i32 = 19;
/// Input/output error
pub const EIO: i32 = 32;

/// Short name of an error number, for log output.
pub fn name(errno: i32) -> &'static str {
    match errno {
        ENOSYS => "ENOSYS",
        ENOMEM => "ENOMEM",
        EFAULT => "EFAULT",
        ENAMETOOLONG => "ENAMETOOLONG",
        EINVAL => "EINVAL",
        ENPROC => "ENPROC",
        ENOEXEC => "ENOEXEC",
        E2BIG => "E2BIG",
        ESRCH => "ESRCH",
        ECHILD => "ECHILD",
        ENOENT => "ENOENT",
        EIO => "EIO",
        _ => "E?",
    }
}
