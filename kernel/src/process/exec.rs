//! Program execution.
//!
//! `execv` replaces the calling process's image; `run_program` starts a new
//! root process from a kernel-supplied path and argument list.
//!
//! Replacing an image is atomic. The old address space stays installed
//! until the new one is fully built (image loaded, stack defined, arguments
//! marshalled). Any failure up to that point destroys the new space,
//! reactivates the old one and returns the error to the old image.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::convert::Infallible;

use super::context::ProcessContext;
use super::manager::{ContextRef, ProcessManager};
use super::table::ProcessId;
use crate::error::ProcError;
use crate::loader::{check_arg_limits, copy_in_args, marshal_args, ArgvLayout};
use crate::platform::{Platform, UserAddr};

/// Exit code of a root process whose program could not be started.
pub const EXEC_FAILURE_CODE: i32 = 127;

impl<P: Platform> ProcessManager<P> {
    /// Replace the calling process's program.
    ///
    /// `path` points to a NUL-terminated program path, `argv` to a
    /// null-terminated array of argument string pointers, both in the
    /// caller's address space. Only returns on failure, with the caller's
    /// image untouched.
    pub fn execv(&self, path: UserAddr, argv: UserAddr) -> Result<Infallible, ProcError> {
        if path.is_null() || argv.is_null() {
            return Err(ProcError::InvalidArgument);
        }
        let (pid, ctx) = self.current();

        let path = self
            .platform()
            .copy_in_str(path, self.config().path_max)
            .map_err(ProcError::from_copy)?;
        let args = copy_in_args(self.platform(), argv, self.config())?;

        log::debug!("[TKOS Exec] pid {} execv {} {:?}", pid, path, args);
        self.replace_image(pid, ctx, path, args)
    }

    /// Start `path` as a new root process with arguments `args`.
    ///
    /// The process has no parent and is never waited for: it leaves the
    /// table as soon as it exits. If its image cannot be loaded it exits
    /// with [`EXEC_FAILURE_CODE`].
    pub fn run_program(self: &Arc<Self>, path: &str, args: &[&str]) -> Result<ProcessId, ProcError> {
        if path.len() + 1 > self.config().path_max {
            return Err(ProcError::NameTooLong);
        }
        check_arg_limits(args, self.config())?;

        let ctx = Arc::new(ProcessContext::new(String::from(path)));
        let pid = self.table().lock().insert(None, ctx)?;

        let manager = Arc::clone(self);
        let program = String::from(path);
        let args: Vec<String> = args.iter().map(|arg| String::from(*arg)).collect();
        let spawned = self.platform().spawn(
            path,
            pid,
            Box::new(move || manager.start_program(program, args)),
        );

        if let Err(e) = spawned {
            log::warn!("[TKOS Exec] failed to spawn thread for {}: {}", path, e);
            self.table().lock().remove(pid);
            return Err(ProcError::ResourceExhausted);
        }

        log::info!("[TKOS Exec] started {} as pid {}", path, pid);
        Ok(pid)
    }

    /// First code run by a root process's thread.
    fn start_program(&self, path: String, args: Vec<String>) -> ! {
        let (pid, ctx) = self.current();
        match self.replace_image(pid, ctx, path, args) {
            Ok(never) => match never {},
            Err(e) => {
                log::warn!("[TKOS Exec] pid {} failed to start: {}", pid, e);
                self.exit(EXEC_FAILURE_CODE)
            }
        }
    }

    /// Build a new image for `ctx` and enter it, or roll back and fail.
    fn replace_image(
        &self,
        pid: ProcessId,
        ctx: ContextRef<P>,
        path: String,
        args: Vec<String>,
    ) -> Result<Infallible, ProcError> {
        let platform = self.platform();

        let mut image = platform.open_image(&path)?;
        let mut space = match platform.as_create() {
            Ok(space) => space,
            Err(e) => {
                platform.close_image(image);
                return Err(e.into());
            }
        };

        platform.as_activate(&space);
        let prepared = self.prepare_image(&mut image, &mut space, &args);
        platform.close_image(image);

        let (entry, layout) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                log::debug!("[TKOS Exec] pid {} exec {} rolled back: {}", pid, path, e);
                platform.as_deactivate();
                platform.as_destroy(space);
                ctx.with_space(|old| platform.as_activate(old));
                return Err(e);
            }
        };

        if let Some(old) = ctx.install_space(space) {
            platform.as_destroy(old);
        }
        log::info!("[TKOS Exec] pid {} now running {} (argc {})", pid, path, layout.argc);
        ctx.set_name(path);
        drop(ctx);
        drop(args);

        platform.enter_new_process(layout.argc, layout.argv, layout.stack_pointer, entry)
    }

    /// Load the image, define the stack and marshal the arguments into the
    /// active (new) address space.
    fn prepare_image(
        &self,
        image: &mut P::Image,
        space: &mut P::AddrSpace,
        args: &[String],
    ) -> Result<(UserAddr, ArgvLayout), ProcError> {
        let platform = self.platform();
        let entry = platform.load_image(image, space)?;
        let stack_top = platform.as_define_stack(space)?;
        let layout = marshal_args(platform, stack_top, args)?;
        Ok((entry, layout))
    }
}
