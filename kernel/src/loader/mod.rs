//! Program Loader
//!
//! Kernel side of exec: copying the argument vector in from the old image
//! and laying it out on the new image's user stack.
//!
//! Segment mapping and entry-point discovery are done by the platform
//! (`Platform::load_image`); this module only deals with arguments.
//!
//! # Stack Layout
//!
//! After marshalling, the user stack looks like this (top to bottom):
//!
//! - argument strings, NUL-terminated, first argument highest
//! - padding to pointer alignment
//! - `argv[argc]` (null)
//! - `argv[argc - 1]` .. `argv[0]`, the final stack pointer
//!
//! `argv` and the stack pointer are the same address.

pub mod args;

pub use args::{check_arg_limits, copy_in_args, marshal_args, ArgvLayout, POINTER_SIZE};
