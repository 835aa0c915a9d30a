//! Per-program state: both regions, their displacement and the entry point.

use tracing::warn;

use crate::error::{Error, Result};
use crate::memory::{MemoryManager, MemoryRegion, Protection, RegionKind};

/// Everything one assembled program owns.
///
/// Dropping the context unmaps both regions, whichever path the session
/// took to get there.
#[derive(Debug, Default)]
pub struct RuntimeContext {
    code: Option<MemoryRegion>,
    data: Option<MemoryRegion>,
    displacement: Option<i32>,
    /// Offset of the entry function inside the code region.
    entry: Option<usize>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly allocated region, releasing the one it replaces.
    ///
    /// Replacing the code region invalidates the entry point. The
    /// displacement is recomputed and must fit in 32 bits.
    pub fn install(&mut self, memory: &MemoryManager, region: MemoryRegion) -> Result<()> {
        let kind = region.kind();
        let slot = match kind {
            RegionKind::Code => &mut self.code,
            RegionKind::Data => &mut self.data,
        };
        if let Some(mut old) = slot.replace(region) {
            warn!(%kind, old_len = old.len(), "replacing existing region");
            memory.release(&mut old);
        }
        if kind == RegionKind::Code {
            self.entry = None;
        }
        self.refresh_displacement()
    }

    fn refresh_displacement(&mut self) -> Result<()> {
        self.displacement = None;
        if let (Some(code), Some(data)) = (&self.code, &self.data) {
            self.displacement = Some(displacement(data.base(), code.base())?);
        }
        Ok(())
    }

    pub fn region(&self, kind: RegionKind) -> Result<&MemoryRegion> {
        let region = match kind {
            RegionKind::Code => self.code.as_ref(),
            RegionKind::Data => self.data.as_ref(),
        };
        region.ok_or(Error::RegionMissing { kind })
    }

    pub fn region_mut(&mut self, kind: RegionKind) -> Result<&mut MemoryRegion> {
        let region = match kind {
            RegionKind::Code => self.code.as_mut(),
            RegionKind::Data => self.data.as_mut(),
        };
        region.ok_or(Error::RegionMissing { kind })
    }

    pub fn protection(&self, kind: RegionKind) -> Protection {
        self.region(kind)
            .map(MemoryRegion::protection)
            .unwrap_or(Protection::Unallocated)
    }

    /// `data_base - code_base`, available once both regions exist.
    pub fn displacement(&self) -> Option<i32> {
        self.displacement
    }

    pub fn entry(&self) -> Option<usize> {
        self.entry
    }

    pub(crate) fn set_entry(&mut self, offset: usize) {
        self.entry = Some(offset);
    }

    /// Release both regions. Calling this on an empty context is a no-op.
    pub fn free(&mut self, memory: &MemoryManager) {
        for mut region in [self.code.take(), self.data.take()].into_iter().flatten() {
            memory.release(&mut region);
        }
        self.displacement = None;
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.data.is_none()
    }
}

/// Signed distance from the code base to the data base.
///
/// Object-relative relocations are 32-bit, so the two regions must lie
/// within `i32::MAX` bytes of each other in either direction.
pub fn displacement(data_base: usize, code_base: usize) -> Result<i32> {
    let distance = data_base as i128 - code_base as i128;
    if distance.abs() > i32::MAX as i128 {
        return Err(Error::DisplacementOutOfRange { displacement: distance });
    }
    Ok(distance as i32)
}
