use alloc::vec::Vec;

use crate::{Opcode, RelocationKind, SerializeField};

impl SerializeField for u8 {
    fn serialize_field(&self, buf: &mut Vec<u8>) {
        buf.push(*self);
    }
}

impl SerializeField for u32 {
    fn serialize_field(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_ne_bytes());
    }
}

impl SerializeField for i32 {
    fn serialize_field(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_ne_bytes());
    }
}

impl SerializeField for [u8] {
    fn serialize_field(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }
}

// ——— Array impl for any `[u8; N]` ——————————————————

impl<const N: usize> SerializeField for [u8; N] {
    fn serialize_field(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }
}

impl SerializeField for Opcode {
    fn serialize_field(&self, buf: &mut Vec<u8>) {
        (*self as u32).serialize_field(buf);
    }
}

impl SerializeField for RelocationKind {
    fn serialize_field(&self, buf: &mut Vec<u8>) {
        self.id().serialize_field(buf);
    }
}
