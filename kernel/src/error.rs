//! Process subsystem errors.

use crate::platform::PlatformError;
use crate::syscall::errno;

/// Errors returned by the process lifecycle operations.
///
/// All variants are recoverable: the caller sees an errno and the process
/// table is left consistent. Invariant violations are not represented here;
/// they panic.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcError {
    /// No free PID or descriptor slot
    #[error("process table full")]
    ResourceExhausted,

    /// Address space duplication failed
    #[error("out of memory")]
    OutOfMemory,

    /// Bad waitpid options or null exec arguments
    #[error("invalid argument")]
    InvalidArgument,

    /// Program path longer than the configured maximum
    #[error("path too long")]
    NameTooLong,

    /// No process with the given PID
    #[error("no such process")]
    NoSuchProcess,

    /// The target exists but is not a child of the caller
    #[error("not a child of the caller")]
    NotMyChild,

    /// User pointer the caller may not read or write
    #[error("bad address")]
    BadAddress,

    /// Exec arguments exceed the count or size limit
    #[error("argument list too long")]
    ArgListTooLong,

    /// Collaborator failure propagated unchanged
    #[error("platform: {0}")]
    Platform(#[from] PlatformError),
}

impl ProcError {
    /// Errno reported on the syscall ABI.
    pub fn errno(&self) -> i32 {
        match self {
            Self::ResourceExhausted => errno::ENPROC,
            Self::OutOfMemory => errno::ENOMEM,
            Self::InvalidArgument => errno::EINVAL,
            Self::NameTooLong => errno::ENAMETOOLONG,
            Self::NoSuchProcess => errno::ESRCH,
            Self::NotMyChild => errno::ECHILD,
            Self::BadAddress => errno::EFAULT,
            Self::ArgListTooLong => errno::E2BIG,
            Self::Platform(e) => match e {
                PlatformError::OutOfMemory => errno::ENOMEM,
                PlatformError::BadAddress => errno::EFAULT,
                PlatformError::NameTooLong => errno::ENAMETOOLONG,
                PlatformError::NotFound => errno::ENOENT,
                PlatformError::NotExecutable => errno::ENOEXEC,
                PlatformError::InvalidString => errno::EINVAL,
                PlatformError::TooManyThreads => errno::ENPROC,
                PlatformError::Io => errno::EIO,
            },
        }
    }

    /// Map a user-memory copy failure, keeping faults and length errors distinct.
    pub(crate) fn from_copy(err: PlatformError) -> Self {
        match err {
            PlatformError::BadAddress => Self::BadAddress,
            PlatformError::NameTooLong => Self::NameTooLong,
            PlatformError::InvalidString => Self::InvalidArgument,
            other => Self::Platform(other),
        }
    }
}
