//! Execution controller.
//!
//! Turns the entry offset into an address inside the sealed code region and
//! calls it. This is the only place the engine treats bytes as code.

use tracing::debug;

use crate::context::RuntimeContext;
use crate::error::{Error, Result};
use crate::memory::{MemoryManager, RegionKind};

/// Signature every entry fragment is compiled against.
pub type EntryFn = unsafe extern "C" fn() -> i32;

/// Record `rel_offset` as the entry point and seal the code region.
///
/// The code region is made executable the first time an entry point is
/// resolved; later calls only move the entry.
pub fn resolve_entry(ctx: &mut RuntimeContext, memory: &MemoryManager, rel_offset: usize) -> Result<()> {
    let code = ctx.region_mut(RegionKind::Code)?;
    code.range(rel_offset, 1)?;
    memory.make_executable(code)?;
    debug!(
        rel_offset,
        entry = %format!("{:#x}", code.base() + rel_offset),
        "entry point resolved"
    );
    ctx.set_entry(rel_offset);
    Ok(())
}

/// Call the resolved entry point and return what it returned.
pub fn run(ctx: &RuntimeContext) -> Result<i32> {
    let offset = ctx.entry().ok_or(Error::MissingEntryPoint)?;
    let code = ctx.region(RegionKind::Code)?;
    if !code.protection().executable() {
        return Err(Error::MissingEntryPoint);
    }
    code.range(offset, 1)?;

    // SAFETY: `offset` is inside the region and the region is mapped read +
    // execute for as long as `ctx` is borrowed.
    let address = unsafe { code.as_ptr().add(offset) };
    Ok(unsafe { call_entry(address) })
}

/// # Safety
/// `address` must point at machine code for the host architecture that
/// follows the C calling convention, takes no arguments and returns an
/// `i32`. Nothing protects the host from what that code does.
unsafe fn call_entry(address: *const u8) -> i32 {
    let entry: EntryFn = unsafe { std::mem::transmute::<*const u8, EntryFn>(address) };
    unsafe { entry() }
}
