//! Forward-only reader over a serialized command stream.

use types::{Opcode, FIELD_LEN};

use crate::error::{Error, Result};

/// Bounds-checked cursor. Every read either consumes exactly the bytes it
/// asked for or fails with [`Error::Truncated`] without moving.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::Truncated {
                position: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let field = self.read_field()?;
        Ok(u32::from_ne_bytes(field))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let field = self.read_field()?;
        Ok(i32::from_ne_bytes(field))
    }

    fn read_field(&mut self) -> Result<[u8; FIELD_LEN]> {
        let bytes = self.read_bytes(FIELD_LEN)?;
        let mut field = [0u8; FIELD_LEN];
        field.copy_from_slice(bytes);
        Ok(field)
    }
}

/// Header view of one record, used for stream listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Byte position of the opcode field.
    pub position: usize,
    pub opcode: Opcode,
    /// Fixed operand fields, raw.
    pub operands: Vec<u32>,
    /// Length of the inline payload following a copy command.
    pub payload_len: usize,
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}  {:<14}", self.position, self.opcode.name())?;
        match self.opcode {
            Opcode::PatchFunc | Opcode::PatchObject => write!(
                f,
                " offset={} kind={} value={}",
                self.operands[0],
                types::RelocationKind::from_u32(self.operands[1]),
                self.operands[2] as i32
            ),
            Opcode::CopyData | Opcode::CopyCode | Opcode::ReadData => {
                write!(f, " offset={} size={}", self.operands[0], self.operands[1])
            }
            Opcode::AllocateData | Opcode::AllocateCode => write!(f, " size={}", self.operands[0]),
            Opcode::EntryPoint => write!(f, " offset={}", self.operands[0]),
            Opcode::RunProg | Opcode::EndCom | Opcode::FreeMemory => Ok(()),
        }
    }
}

/// Walk the record headers of a stream without executing anything.
///
/// Stops after END_COM. Fails on an undefined opcode or a short record, the
/// same way the interpreter would.
pub fn records(stream: &[u8]) -> Result<Vec<Record>> {
    let mut cursor = Cursor::new(stream);
    let mut out = Vec::new();
    loop {
        let position = cursor.position();
        let raw = cursor.read_u32()?;
        let opcode = Opcode::from_u32(raw).ok_or(Error::UnknownOpcode { opcode: raw, position })?;
        let operands = (0..opcode.operand_fields())
            .map(|_| cursor.read_u32())
            .collect::<Result<Vec<_>>>()?;
        let payload_len = if opcode.has_payload() { operands[1] as usize } else { 0 };
        cursor.read_bytes(payload_len)?;
        out.push(Record {
            position,
            opcode,
            operands,
            payload_len,
        });
        if opcode == Opcode::EndCom {
            return Ok(out);
        }
    }
}
