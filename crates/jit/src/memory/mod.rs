use memmap2::MmapMut;
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};

mod region;

pub use region::MemoryRegion;

/// Which of the two session regions a mapping backs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Code,
    Data,
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionKind::Code => f.write_str("code"),
            RegionKind::Data => f.write_str("data"),
        }
    }
}

/// Permission state of a region. Transitions only move forward:
/// code goes `ReadWrite -> ReadExecute -> Freed`, data goes `ReadWrite -> Freed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protection {
    Unallocated,
    ReadWrite,
    ReadExecute,
    Freed,
}

impl Protection {
    pub fn writable(self) -> bool {
        self == Protection::ReadWrite
    }

    pub fn executable(self) -> bool {
        self == Protection::ReadExecute
    }
}

/// Hands out anonymous OS mappings for the code and data regions.
///
/// Code and data never share a mapping: a code page is sealed read+execute
/// before it runs, while data pages stay read+write for the whole session.
#[derive(Debug, Clone)]
pub struct MemoryManager {
    max_region_bytes: usize,
}

impl MemoryManager {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            max_region_bytes: config.max_region_bytes,
        }
    }

    /// Map a fresh zero-filled region of `size` bytes in `ReadWrite` state.
    pub fn allocate(&self, kind: RegionKind, size: usize) -> Result<MemoryRegion> {
        if size == 0 {
            return Err(Error::EmptyAllocation { kind });
        }
        if size > self.max_region_bytes {
            return Err(Error::AllocationTooLarge {
                kind,
                size,
                limit: self.max_region_bytes,
            });
        }

        let map = MmapMut::map_anon(size).map_err(|source| Error::MapFailed { kind, size, source })?;
        let region = MemoryRegion::new(kind, size, map);
        debug!(%kind, size, base = %format!("{:#x}", region.base()), "mapped region");
        Ok(region)
    }

    /// Seal a code region: write access is revoked and execute access granted
    /// in a single protection change. Already sealed regions are left alone.
    pub fn make_executable(&self, region: &mut MemoryRegion) -> Result<()> {
        if region.kind() != RegionKind::Code {
            return Err(Error::NotExecutable { kind: region.kind() });
        }
        region.seal()
    }

    /// Unmap a region. Releasing an already released region does nothing.
    pub fn release(&self, region: &mut MemoryRegion) {
        if region.protection() != Protection::Freed {
            debug!(kind = %region.kind(), len = region.len(), "released region");
        }
        region.release();
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new(&RuntimeConfig::default())
    }
}
