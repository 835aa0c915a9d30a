use std::ops::Range;

use memmap2::{Mmap, MmapMut};

use super::{Protection, RegionKind};
use crate::error::{Error, Result};

enum Backing {
    Writable(MmapMut),
    Executable(Mmap),
}

/// One OS mapping owned by a runtime context.
///
/// The length is the size requested at allocation time; the mapping itself
/// may be rounded up to whole pages but nothing past `len` is reachable.
pub struct MemoryRegion {
    kind: RegionKind,
    len: usize,
    backing: Option<Backing>,
}

impl MemoryRegion {
    pub(super) fn new(kind: RegionKind, len: usize, map: MmapMut) -> Self {
        Self {
            kind,
            len,
            backing: Some(Backing::Writable(map)),
        }
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn protection(&self) -> Protection {
        match self.backing {
            Some(Backing::Writable(_)) => Protection::ReadWrite,
            Some(Backing::Executable(_)) => Protection::ReadExecute,
            None => Protection::Freed,
        }
    }

    /// Base address of the mapping, `0` once released.
    pub fn base(&self) -> usize {
        self.as_ptr() as usize
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        match &self.backing {
            Some(Backing::Writable(map)) => map.as_ptr(),
            Some(Backing::Executable(map)) => map.as_ptr(),
            None => std::ptr::null(),
        }
    }

    /// Validates that `offset..offset + len` lies inside the region.
    pub fn range(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(offset..end),
            _ => Err(Error::OutOfBounds {
                kind: self.kind,
                offset,
                len,
                region_len: self.len,
            }),
        }
    }

    /// Read-only view of `len` bytes at `offset`.
    pub fn read(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let range = self.range(offset, len)?;
        match &self.backing {
            Some(Backing::Writable(map)) => Ok(&map[range]),
            Some(Backing::Executable(map)) => Ok(&map[range]),
            None => Err(Error::RegionMissing { kind: self.kind }),
        }
    }

    /// Copy `bytes` into the region at `offset`.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let range = self.writable_range(offset, bytes.len())?;
        self.writable()?[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Mutable view of `len` bytes at `offset`, only while the region is writable.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let range = self.writable_range(offset, len)?;
        Ok(&mut self.writable()?[range])
    }

    fn writable_range(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        match self.protection() {
            Protection::ReadWrite => self.range(offset, len),
            Protection::ReadExecute => Err(Error::WriteAfterExecute { kind: self.kind }),
            Protection::Unallocated | Protection::Freed => Err(Error::RegionMissing { kind: self.kind }),
        }
    }

    fn writable(&mut self) -> Result<&mut MmapMut> {
        match &mut self.backing {
            Some(Backing::Writable(map)) => Ok(map),
            Some(Backing::Executable(_)) => Err(Error::WriteAfterExecute { kind: self.kind }),
            None => Err(Error::RegionMissing { kind: self.kind }),
        }
    }

    pub(super) fn seal(&mut self) -> Result<()> {
        match self.backing.take() {
            Some(Backing::Writable(map)) => {
                // A failed mprotect drops the mapping, leaving the region released.
                let map = map.make_exec().map_err(|source| Error::Protect { source })?;
                self.backing = Some(Backing::Executable(map));
                Ok(())
            }
            Some(Backing::Executable(map)) => {
                self.backing = Some(Backing::Executable(map));
                Ok(())
            }
            None => Err(Error::RegionMissing { kind: self.kind }),
        }
    }

    pub(super) fn release(&mut self) {
        self.backing = None;
    }
}

impl std::fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("kind", &self.kind)
            .field("len", &self.len)
            .field("base", &format_args!("0x{:x}", self.base()))
            .field("protection", &self.protection())
            .finish()
    }
}
