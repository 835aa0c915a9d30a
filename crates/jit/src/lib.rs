//! Copy-and-patch runtime loader.
//!
//! Consumes a command stream that describes a code region, a data region,
//! the fragment bytes to copy into them and the relocations to apply, then
//! seals the code region and calls into it.
//!
//! Injected code runs in-process with no isolation: a fault or an endless
//! loop in a fragment is a fault or an endless loop of the host.

pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod interpreter;
pub mod memory;
pub mod patch;
pub mod runtime;
pub mod stream;
pub mod writer;

pub use config::RuntimeConfig;
pub use context::RuntimeContext;
pub use error::{Error, Result};
pub use interpreter::{DataRead, Outcome};
pub use memory::{MemoryManager, MemoryRegion, Protection, RegionKind};
pub use runtime::Runtime;
pub use writer::CommandWriter;

pub use types::{ExitStatus, Opcode, RelocationKind};

/// Runs one command stream in a fresh session and tears it down afterwards.
pub fn execute(stream: &[u8]) -> ExitStatus {
    Runtime::new().execute(stream).status
}
