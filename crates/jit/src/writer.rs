//! Command stream encoder.
//!
//! Used by tests and tooling to build streams record by record. It performs
//! no validation: a writer can produce any byte sequence the interpreter has
//! to cope with, including undefined opcodes.

use types::{Opcode, RelocationKind, SerializeField};

/// One labelled chunk of the encoded stream.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    label: String,
    range: std::ops::Range<usize>,
    starts_record: bool,
}

/// Size field of a COPY_* record.
///
/// # Panics
/// Panics if `bytes` is longer than a 4-byte size field can describe.
fn payload_len(bytes: &[u8]) -> u32 {
    u32::try_from(bytes.len()).expect("payload larger than u32::MAX bytes")
}

#[derive(Debug, Clone, Default)]
pub struct CommandWriter {
    buf: Vec<u8>,
    entries: Vec<Entry>,
}

impl CommandWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_data(&mut self, size: u32) -> &mut Self {
        self.command(Opcode::AllocateData).int(size)
    }

    /// # Panics
    /// Panics if `bytes` is 4 GiB or longer.
    pub fn copy_data(&mut self, offset: u32, bytes: &[u8]) -> &mut Self {
        self.command(Opcode::CopyData)
            .int(offset)
            .int(payload_len(bytes))
            .payload(bytes)
    }

    pub fn allocate_code(&mut self, size: u32) -> &mut Self {
        self.command(Opcode::AllocateCode).int(size)
    }

    /// # Panics
    /// Panics if `bytes` is 4 GiB or longer.
    pub fn copy_code(&mut self, offset: u32, bytes: &[u8]) -> &mut Self {
        self.command(Opcode::CopyCode)
            .int(offset)
            .int(payload_len(bytes))
            .payload(bytes)
    }

    pub fn patch_func(&mut self, offset: u32, kind: RelocationKind, value: i32) -> &mut Self {
        self.patch(Opcode::PatchFunc, offset, kind, value)
    }

    pub fn patch_object(&mut self, offset: u32, kind: RelocationKind, value: i32) -> &mut Self {
        self.patch(Opcode::PatchObject, offset, kind, value)
    }

    pub fn entry_point(&mut self, offset: u32) -> &mut Self {
        self.command(Opcode::EntryPoint).int(offset)
    }

    pub fn run_prog(&mut self) -> &mut Self {
        self.command(Opcode::RunProg)
    }

    pub fn read_data(&mut self, offset: u32, size: u32) -> &mut Self {
        self.command(Opcode::ReadData).int(offset).int(size)
    }

    pub fn free_memory(&mut self) -> &mut Self {
        self.command(Opcode::FreeMemory)
    }

    pub fn end_com(&mut self) -> &mut Self {
        self.command(Opcode::EndCom)
    }

    /// Append a raw 4-byte word in opcode position.
    pub fn raw(&mut self, word: u32) -> &mut Self {
        self.push(format!("RAW 0x{:x}", word), true, &word)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Human readable dump: one line per field, records separated by a blank line.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            if entry.starts_record && !out.is_empty() {
                out.push('\n');
            }
            let hex: Vec<String> = self.buf[entry.range.clone()]
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect();
            out.push_str(&format!("{:<18}{}\n", entry.label, hex.join(" ")));
        }
        out
    }

    fn patch(&mut self, opcode: Opcode, offset: u32, kind: RelocationKind, value: i32) -> &mut Self {
        self.command(opcode).int(offset).push(format!("KIND {}", kind), false, &kind).signed(value)
    }

    fn command(&mut self, opcode: Opcode) -> &mut Self {
        self.push(opcode.name().to_string(), true, &opcode)
    }

    fn int(&mut self, value: u32) -> &mut Self {
        self.push(format!("INT {}", value), false, &value)
    }

    fn signed(&mut self, value: i32) -> &mut Self {
        self.push(format!("INT {}", value), false, &value)
    }

    fn payload(&mut self, bytes: &[u8]) -> &mut Self {
        self.push(format!("BYTES {}", bytes.len()), false, bytes)
    }

    fn push<T: SerializeField + ?Sized>(&mut self, label: String, starts_record: bool, field: &T) -> &mut Self {
        let start = self.buf.len();
        field.serialize_field(&mut self.buf);
        self.entries.push(Entry {
            label,
            range: start..self.buf.len(),
            starts_record,
        });
        self
    }
}
