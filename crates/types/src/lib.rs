#![no_std]

extern crate alloc;

pub mod command;
pub use command::Opcode;

pub mod reloc;
pub use reloc::RelocationKind;

pub mod status;
pub use status::ExitStatus;

pub mod primitives;

/// Width in bytes of every fixed field in the command stream.
pub const FIELD_LEN: usize = 4;

// used for serialization of command stream fields
pub trait SerializeField {
    /// Appends `self` to `buf` in the stream's native byte order.
    fn serialize_field(&self, buf: &mut alloc::vec::Vec<u8>);
}
