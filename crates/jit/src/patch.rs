//! Relocation patcher.
//!
//! Stateless: the caller decides the final value (adding the code/data
//! displacement for object-relative relocations) and the patcher only knows
//! how each relocation kind is laid out in memory.

use tracing::trace;
use types::RelocationKind;

use crate::error::{Error, Result};
use crate::memory::MemoryRegion;

/// Rewrite the bytes at `offset` in `region` with `value`, encoded as `kind`.
pub fn patch(region: &mut MemoryRegion, offset: usize, kind: RelocationKind, value: i32) -> Result<()> {
    let width = kind.width().ok_or(Error::UnsupportedRelocation { kind })?;
    let slot = region.slice_mut(offset, width)?;
    match kind {
        RelocationKind::Relative32 => store_i32(slot, value),
        _ => return Err(Error::UnsupportedRelocation { kind }),
    }
    trace!(offset, %kind, value, "patched");
    Ok(())
}

// Slots are not necessarily 4-byte aligned inside a fragment.
fn store_i32(slot: &mut [u8], value: i32) {
    slot.copy_from_slice(&value.to_ne_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryManager, RegionKind};

    fn code_region(len: usize) -> MemoryRegion {
        MemoryManager::default().allocate(RegionKind::Code, len).unwrap()
    }

    #[test]
    fn relative32_overwrites_placeholder() {
        let mut region = code_region(8);
        region.write(0, &[0xAA; 8]).unwrap();

        patch(&mut region, 3, RelocationKind::Relative32, -2).unwrap();

        let bytes = region.read(0, 8).unwrap();
        assert_eq!(&bytes[3..7], &(-2i32).to_ne_bytes());
        assert_eq!(bytes[2], 0xAA);
        assert_eq!(bytes[7], 0xAA);
    }

    #[test]
    fn patch_must_fit_inside_region() {
        let mut region = code_region(8);
        assert!(patch(&mut region, 4, RelocationKind::Relative32, 1).is_ok());

        let err = patch(&mut region, 5, RelocationKind::Relative32, 1).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { offset: 5, len: 4, region_len: 8, .. }));

        let err = patch(&mut region, usize::MAX, RelocationKind::Relative32, 1).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
    }

    #[test]
    fn reserved_kinds_are_rejected_without_writing() {
        let mut region = code_region(16);
        for id in [0x2001, 0x2002, 0x2003, 0x2004, 7] {
            let kind = RelocationKind::from_u32(id);
            let err = patch(&mut region, 0, kind, 0x1234_5678).unwrap_err();
            assert!(matches!(err, Error::UnsupportedRelocation { .. }), "kind {kind}");
        }
        assert_eq!(region.read(0, 16).unwrap(), &[0u8; 16]);
    }

    #[test]
    fn sealed_code_cannot_be_patched() {
        let memory = MemoryManager::default();
        let mut region = memory.allocate(RegionKind::Code, 8).unwrap();
        memory.make_executable(&mut region).unwrap();

        let err = patch(&mut region, 0, RelocationKind::Relative32, 1).unwrap_err();
        assert!(matches!(err, Error::WriteAfterExecute { kind: RegionKind::Code }));
    }
}
