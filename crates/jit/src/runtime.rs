use tracing::{debug, warn};

use crate::config::RuntimeConfig;
use crate::context::RuntimeContext;
use crate::error::Result;
use crate::interpreter::{hexdump, Interpreter, Outcome};
use crate::memory::{MemoryManager, Protection, RegionKind};

/// A loader session.
///
/// The context survives between streams, so a host can send one stream that
/// lays out and seals a program, then further streams that run it or read
/// results back, then a final stream that frees it. A stream that fails
/// tears the context down.
#[derive(Debug)]
pub struct Runtime {
    pub config: RuntimeConfig,
    memory: MemoryManager,
    context: RuntimeContext,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            memory: MemoryManager::new(&config),
            config,
            context: RuntimeContext::new(),
        }
    }

    /// Interpret one command stream against this session's context.
    pub fn execute(&mut self, stream: &[u8]) -> Outcome {
        debug!(len = stream.len(), "executing command stream");
        let outcome = Interpreter::new(&mut self.context, &self.memory, &self.config, stream).run();
        if let Some(err) = &outcome.error {
            warn!(status = %outcome.status, "stream failed: {}", err);
            self.context.free(&self.memory);
        }
        outcome
    }

    /// Copy `len` bytes out of the data region.
    pub fn read_data(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        Ok(self.context.region(RegionKind::Data)?.read(offset, len)?.to_vec())
    }

    /// Copy `len` bytes out of the code region, sealed or not.
    pub fn read_code(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        Ok(self.context.region(RegionKind::Code)?.read(offset, len)?.to_vec())
    }

    pub fn displacement(&self) -> Option<i32> {
        self.context.displacement()
    }

    pub fn protection(&self, kind: RegionKind) -> Protection {
        self.context.protection(kind)
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    /// Release both regions; safe to call on an empty session.
    pub fn free(&mut self) {
        self.context.free(&self.memory);
    }

    /// Hex dump of a region, for diagnostics.
    pub fn dump(&self, kind: RegionKind) -> Result<String> {
        let region = self.context.region(kind)?;
        Ok(hexdump(0, region.read(0, region.len())?))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
