//! Program registry.
//!
//! Programs are Rust closures registered under a path. Loading one maps a
//! text page and stores the program's index there, so the entry address
//! identifies what to run in whichever address space is active.

use std::sync::Arc;

use hashbrown::HashMap;
use spin::RwLock;
use tkos_kernel::PlatformError;

use crate::memory::{Memory, PAGE_SIZE, TEXT_BASE};
use crate::user::UserEnv;

/// Body of a user program; the return value is its exit code.
pub type Program = Arc<dyn Fn(&UserEnv) -> i32 + Send + Sync>;

#[derive(Clone)]
enum Entry {
    Program(usize),
    /// A file that exists but cannot be executed
    Data,
}

/// Open program image.
#[derive(Clone)]
pub struct HostedImage {
    path: String,
    entry: Entry,
}

impl HostedImage {
    /// Path the image was opened from
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for HostedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedImage").field("path", &self.path).finish()
    }
}

/// Path to program table.
#[derive(Default)]
pub struct ImageRegistry {
    paths: RwLock<HashMap<String, Entry>>,
    programs: RwLock<Vec<Program>>,
}

impl ImageRegistry {
    /// Register `program` under `path`, replacing any earlier registration
    pub fn register(&self, path: &str, program: Program) {
        let mut programs = self.programs.write();
        programs.push(program);
        let index = programs.len() - 1;
        self.paths
            .write()
            .insert(path.to_string(), Entry::Program(index));
    }

    /// Register a non-executable file under `path`
    pub fn register_data(&self, path: &str) {
        self.paths.write().insert(path.to_string(), Entry::Data);
    }

    pub(crate) fn open(&self, path: &str) -> Result<HostedImage, PlatformError> {
        let entry = self
            .paths
            .read()
            .get(path)
            .cloned()
            .ok_or(PlatformError::NotFound)?;
        Ok(HostedImage {
            path: path.to_string(),
            entry,
        })
    }

    /// Map the text page and write the program index at the entry address.
    pub(crate) fn load(&self, image: &HostedImage, memory: &mut Memory) -> Result<u64, PlatformError> {
        let Entry::Program(index) = image.entry else {
            return Err(PlatformError::NotExecutable);
        };
        memory.map(TEXT_BASE, PAGE_SIZE)?;
        memory.write(TEXT_BASE, &(index as u64).to_ne_bytes())?;
        Ok(TEXT_BASE)
    }

    /// Program whose index is stored at `entry`.
    pub(crate) fn resolve(&self, memory: &Memory, entry: u64) -> Result<Program, PlatformError> {
        let mut raw = [0u8; 8];
        memory.read(entry, &mut raw)?;
        let index = u64::from_ne_bytes(raw) as usize;
        self.programs
            .read()
            .get(index)
            .cloned()
            .ok_or(PlatformError::NotExecutable)
    }
}
