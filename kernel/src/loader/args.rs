//! Argument vector handling for exec.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::ProcConfig;
use crate::error::ProcError;
use crate::platform::{PlatformError, UserAddr, UserMemory};

/// Size of a user pointer in bytes.
pub const POINTER_SIZE: u64 = 8;

/// Alignment of the pointer array below the argument strings.
const STRING_ALIGN: u64 = POINTER_SIZE;

/// Result of laying out argv on a user stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgvLayout {
    /// Number of arguments
    pub argc: usize,
    /// User address of `argv[0]`
    pub argv: UserAddr,
    /// Stack pointer to start the program with
    pub stack_pointer: UserAddr,
}

/// Check an argument list against the configured count and size limits.
///
/// The size counts every string with its terminator.
pub fn check_arg_limits<S: AsRef<str>>(args: &[S], config: &ProcConfig) -> Result<(), ProcError> {
    if args.len() > config.max_args {
        return Err(ProcError::ArgListTooLong);
    }
    let total: usize = args.iter().map(|arg| arg.as_ref().len() + 1).sum();
    if total > config.arg_max {
        return Err(ProcError::ArgListTooLong);
    }
    Ok(())
}

/// Copy a null-terminated argv array in from user address `argv`.
///
/// Reads pointer slots until a null one, then each string they point to.
/// Fails with [`ProcError::ArgListTooLong`] as soon as either limit in
/// `config` is exceeded, and with [`ProcError::BadAddress`] on any fault.
pub fn copy_in_args<M>(mem: &M, argv: UserAddr, config: &ProcConfig) -> Result<Vec<String>, ProcError>
where
    M: UserMemory + ?Sized,
{
    let mut args = Vec::new();
    let mut total = 0usize;
    let mut slot = argv;

    loop {
        let mut raw = [0u8; POINTER_SIZE as usize];
        mem.copy_in(slot, &mut raw).map_err(ProcError::from_copy)?;
        let ptr = UserAddr(u64::from_ne_bytes(raw));
        if ptr.is_null() {
            break;
        }

        if args.len() == config.max_args {
            return Err(ProcError::ArgListTooLong);
        }

        let budget = config.arg_max.saturating_sub(total);
        let arg = match mem.copy_in_str(ptr, budget) {
            Ok(arg) => arg,
            Err(PlatformError::NameTooLong) => return Err(ProcError::ArgListTooLong),
            Err(e) => return Err(ProcError::from_copy(e)),
        };
        total += arg.len() + 1;
        args.push(arg);

        slot = slot
            .checked_add(POINTER_SIZE)
            .ok_or(ProcError::BadAddress)?;
    }

    Ok(args)
}

/// Lay `args` out below `stack_top` in the active address space.
///
/// Strings are copied downward in order, the stack is rounded down to
/// pointer alignment, and the pointer array (plus a null terminator) is
/// written below them. The array base becomes the stack pointer.
pub fn marshal_args<M, S>(mem: &M, stack_top: UserAddr, args: &[S]) -> Result<ArgvLayout, ProcError>
where
    M: UserMemory + ?Sized,
    S: AsRef<str>,
{
    let mut sp = stack_top;
    let mut addrs = Vec::with_capacity(args.len());

    for arg in args {
        let arg = arg.as_ref();
        let len = arg.len() + 1;
        sp = sp.checked_sub(len as u64).ok_or(ProcError::BadAddress)?;
        mem.copy_out_str(arg, sp, len)
            .map_err(ProcError::from_copy)?;
        addrs.push(sp);
    }

    sp = sp.align_down(STRING_ALIGN);

    let table_size = (addrs.len() as u64 + 1) * POINTER_SIZE;
    sp = sp.checked_sub(table_size).ok_or(ProcError::BadAddress)?;
    let argv = sp;

    let mut slot = argv;
    for addr in addrs.iter().copied().chain(core::iter::once(UserAddr::NULL)) {
        mem.copy_out(&addr.as_u64().to_ne_bytes(), slot)
            .map_err(ProcError::from_copy)?;
        slot = UserAddr(slot.as_u64() + POINTER_SIZE);
    }

    debug_assert!(argv.is_aligned(POINTER_SIZE));

    Ok(ArgvLayout {
        argc: addrs.len(),
        argv,
        stack_pointer: argv,
    })
}
