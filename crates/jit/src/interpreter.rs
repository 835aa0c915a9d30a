//! Command interpreter.
//!
//! Reads a stream strictly front to back and applies each record to a
//! [`RuntimeContext`]. The first failing record stops the stream; nothing
//! after it is read.

use tracing::{debug, info};
use types::{ExitStatus, Opcode, RelocationKind};

use crate::config::RuntimeConfig;
use crate::context::RuntimeContext;
use crate::error::{Error, Result};
use crate::exec;
use crate::memory::{MemoryManager, RegionKind};
use crate::patch;
use crate::stream::Cursor;

/// Bytes produced by one READ_DATA record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRead {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

/// Interpreter lifecycle. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Ready,
    Running,
    Completed,
    Failed(ExitStatus),
}

/// What one stream produced.
#[derive(Debug)]
pub struct Outcome {
    /// Terminal interpreter state: `Completed` or `Failed(status)`.
    pub state: State,
    pub status: ExitStatus,
    /// READ_DATA results, in stream order.
    pub reads: Vec<DataRead>,
    /// RUN_PROG return values, in stream order.
    pub returns: Vec<i32>,
    /// The error that stopped the stream, if any.
    pub error: Option<Error>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

enum Flow {
    Continue,
    End,
}

pub struct Interpreter<'a> {
    ctx: &'a mut RuntimeContext,
    memory: &'a MemoryManager,
    config: &'a RuntimeConfig,
    cursor: Cursor<'a>,
    state: State,
    reads: Vec<DataRead>,
    returns: Vec<i32>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        ctx: &'a mut RuntimeContext,
        memory: &'a MemoryManager,
        config: &'a RuntimeConfig,
        stream: &'a [u8],
    ) -> Self {
        Self {
            ctx,
            memory,
            config,
            cursor: Cursor::new(stream),
            state: State::Ready,
            reads: Vec::new(),
            returns: Vec::new(),
        }
    }

    /// Process records until END_COM or the first error.
    pub fn run(mut self) -> Outcome {
        self.state = State::Running;
        let error = loop {
            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::End) => break None,
                Err(err) => break Some(err),
            }
        };

        let status = match &error {
            None => ExitStatus::NormalCompletion,
            Some(err) => err.status(),
        };
        self.state = match error {
            None => State::Completed,
            Some(_) => State::Failed(status),
        };
        debug!(state = ?self.state, position = self.cursor.position(), "stream finished");

        Outcome {
            state: self.state,
            status,
            reads: self.reads,
            returns: self.returns,
            error,
        }
    }

    fn step(&mut self) -> Result<Flow> {
        let position = self.cursor.position();
        let raw = self.cursor.read_u32()?;
        let opcode = Opcode::from_u32(raw).ok_or(Error::UnknownOpcode { opcode: raw, position })?;

        match opcode {
            Opcode::AllocateData => self.allocate(RegionKind::Data)?,
            Opcode::AllocateCode => self.allocate(RegionKind::Code)?,
            Opcode::CopyData => self.copy(RegionKind::Data)?,
            Opcode::CopyCode => self.copy(RegionKind::Code)?,
            Opcode::PatchFunc => self.patch(false)?,
            Opcode::PatchObject => self.patch(true)?,
            Opcode::EntryPoint => {
                let rel_offset = self.read_len()?;
                debug!(rel_offset, "ENTRY_POINT");
                exec::resolve_entry(self.ctx, self.memory, rel_offset)?;
            }
            Opcode::RunProg => {
                debug!("RUN_PROG");
                let ret = exec::run(self.ctx)?;
                info!(ret, "Return value");
                self.returns.push(ret);
            }
            Opcode::ReadData => self.read_data()?,
            Opcode::FreeMemory => {
                debug!("FREE_MEMORY");
                self.ctx.free(self.memory);
            }
            Opcode::EndCom => {
                debug!("END_COM");
                return Ok(Flow::End);
            }
        }
        Ok(Flow::Continue)
    }

    fn allocate(&mut self, kind: RegionKind) -> Result<()> {
        let size = self.read_len()?;
        debug!(%kind, size, "ALLOCATE");
        let region = self.memory.allocate(kind, size)?;
        self.ctx.install(self.memory, region)?;
        debug!(displacement = ?self.ctx.displacement(), "regions updated");
        Ok(())
    }

    fn copy(&mut self, kind: RegionKind) -> Result<()> {
        let offset = self.read_len()?;
        let size = self.read_len()?;
        // The payload is consumed before touching the region so a bad copy
        // still reports the right stream position.
        let bytes = self.cursor.read_bytes(size)?;
        debug!(%kind, offset, size, "COPY");
        self.ctx.region_mut(kind)?.write(offset, bytes)
    }

    fn patch(&mut self, object_relative: bool) -> Result<()> {
        let offset = self.read_len()?;
        let kind = RelocationKind::from_u32(self.cursor.read_u32()?);
        let raw = self.cursor.read_i32()?;

        let value = if object_relative {
            let displacement = self
                .ctx
                .displacement()
                .ok_or(Error::RegionMissing { kind: RegionKind::Data })?;
            raw.checked_add(displacement)
                .ok_or(Error::RelocationOverflow { value: raw, displacement })?
        } else {
            raw
        };
        debug!(
            offset,
            %kind,
            raw,
            value,
            object_relative,
            "PATCH"
        );
        patch::patch(self.ctx.region_mut(RegionKind::Code)?, offset, kind, value)
    }

    fn read_data(&mut self) -> Result<()> {
        let offset = self.read_len()?;
        let size = self.read_len()?;
        let bytes = self.ctx.region(RegionKind::Data)?.read(offset, size)?.to_vec();
        if self.config.log_reads {
            info!(offset, size, "READ_DATA\n{}", hexdump(offset, &bytes));
        } else {
            debug!(offset, size, "READ_DATA");
        }
        self.reads.push(DataRead { offset, bytes });
        Ok(())
    }

    fn read_len(&mut self) -> Result<usize> {
        Ok(self.cursor.read_u32()? as usize)
    }
}

/// Offset-prefixed hex + ascii lines, 16 bytes each.
pub fn hexdump(base: usize, bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, line) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{:02X}", b)).collect();
        let ascii: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect();
        out.push_str(&format!("{:08x}  {:<47}  |{}|\n", base + i * 16, hex.join(" "), ascii));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::CommandWriter;

    fn interpret(ctx: &mut RuntimeContext, stream: &[u8]) -> Outcome {
        let memory = MemoryManager::default();
        let config = RuntimeConfig::default();
        Interpreter::new(ctx, &memory, &config, stream).run()
    }

    #[test]
    fn empty_stream_is_truncated() {
        let mut ctx = RuntimeContext::new();
        let outcome = interpret(&mut ctx, &[]);
        assert_eq!(outcome.status, ExitStatus::TruncatedStream);
        assert_eq!(outcome.state, State::Failed(ExitStatus::TruncatedStream));
    }

    #[test]
    fn end_marker_completes_the_stream() {
        let mut w = CommandWriter::new();
        w.allocate_data(4).end_com();
        let mut ctx = RuntimeContext::new();
        let outcome = interpret(&mut ctx, w.bytes());
        assert_eq!(outcome.state, State::Completed);
        assert!(outcome.is_success());
    }

    #[test]
    fn stream_without_end_marker_is_truncated() {
        let mut w = CommandWriter::new();
        w.allocate_data(4);
        let mut ctx = RuntimeContext::new();
        let outcome = interpret(&mut ctx, w.bytes());
        assert_eq!(outcome.status, ExitStatus::TruncatedStream);
        assert!(ctx.region(RegionKind::Data).is_ok());
    }

    #[test]
    fn copy_payload_shorter_than_announced_is_truncated() {
        let mut w = CommandWriter::new();
        w.allocate_data(16).raw(Opcode::CopyData as u32).raw(0).raw(8).raw(0);
        let mut ctx = RuntimeContext::new();
        let outcome = interpret(&mut ctx, w.bytes());
        assert!(matches!(outcome.error, Some(Error::Truncated { needed: 8, available: 4, .. })));
    }

    #[test]
    fn object_patch_needs_a_data_region() {
        let mut w = CommandWriter::new();
        w.allocate_code(8)
            .patch_object(0, RelocationKind::Relative32, 1)
            .end_com();
        let mut ctx = RuntimeContext::new();
        let outcome = interpret(&mut ctx, w.bytes());
        assert_eq!(outcome.status, ExitStatus::OutOfBounds);
        assert!(matches!(outcome.error, Some(Error::RegionMissing { kind: RegionKind::Data })));
    }

    #[test]
    fn run_without_entry_point_fails() {
        let mut w = CommandWriter::new();
        w.allocate_code(8).run_prog().end_com();
        let mut ctx = RuntimeContext::new();
        let outcome = interpret(&mut ctx, w.bytes());
        assert_eq!(outcome.status, ExitStatus::MissingEntryPoint);
        assert!(outcome.returns.is_empty());
    }

    #[test]
    fn entry_point_outside_code_is_rejected_and_code_stays_writable() {
        let mut w = CommandWriter::new();
        w.allocate_code(8).entry_point(8).end_com();
        let mut ctx = RuntimeContext::new();
        let outcome = interpret(&mut ctx, w.bytes());
        assert_eq!(outcome.status, ExitStatus::OutOfBounds);
        assert_eq!(ctx.protection(RegionKind::Code), crate::Protection::ReadWrite);
    }

    #[test]
    fn hexdump_formats_full_and_partial_lines() {
        let bytes: Vec<u8> = (0x41..0x41 + 18).collect();
        let dump = hexdump(0x10, &bytes);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000010  41 42 43"));
        assert!(lines[0].ends_with("|ABCDEFGHIJKLMNOP|"));
        assert!(lines[1].starts_with("00000020  51 52"));
        assert!(lines[1].ends_with("|QR|"));
    }
}
