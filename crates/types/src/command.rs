/// Command stream opcodes.
///
/// Every record in a command stream starts with one of these values as a
/// 4-byte unsigned field in native byte order, followed by the operands
/// listed on each variant. Operand fields are 4 bytes wide unless stated.
///
/// STREAM LAYOUT:
/// - memory setup: `AllocateData`, `AllocateCode`
/// - fragment loading: `CopyData`, `CopyCode`
/// - relocations: `PatchFunc`, `PatchObject`
/// - execution: `EntryPoint`, `RunProg`
/// - inspection and teardown: `ReadData`, `FreeMemory`, `EndCom`
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// ALLOCATE_DATA (1): `size`
    AllocateData = 1,

    /// COPY_DATA (2): `offset`, `size`, then `size` raw bytes
    CopyData = 2,

    /// ALLOCATE_CODE (3): `size`
    AllocateCode = 3,

    /// COPY_CODE (4): `offset`, `size`, then `size` raw bytes
    CopyCode = 4,

    /// ENTRY_POINT (7): offset of the entry function inside the code region.
    /// Resolving the entry point also seals the code region (read + execute).
    EntryPoint = 7,

    /// RUN_PROG (64): no operands
    RunProg = 64,

    /// READ_DATA (65): `offset`, `size`
    ReadData = 65,

    /// END_COM (256): no operands, terminates the stream successfully
    EndCom = 256,

    /// FREE_MEMORY (257): no operands, releases both regions
    FreeMemory = 257,

    /// PATCH_FUNC (0x1000): `offset`, `kind`, signed `value`.
    /// The value is written as is (function-relative).
    PatchFunc = 0x1000,

    /// PATCH_OBJECT (0x2000): `offset`, `kind`, signed `value`.
    /// The data/code displacement is added before writing (object-relative).
    PatchObject = 0x2000,
}

impl Opcode {
    pub const ALL: [Opcode; 11] = [
        Opcode::AllocateData,
        Opcode::CopyData,
        Opcode::AllocateCode,
        Opcode::CopyCode,
        Opcode::EntryPoint,
        Opcode::RunProg,
        Opcode::ReadData,
        Opcode::EndCom,
        Opcode::FreeMemory,
        Opcode::PatchFunc,
        Opcode::PatchObject,
    ];

    /// Convert a raw stream word to an opcode, `None` if it is not defined.
    pub fn from_u32(value: u32) -> Option<Self> {
        use Opcode::*;
        Some(match value {
            1 => AllocateData,
            2 => CopyData,
            3 => AllocateCode,
            4 => CopyCode,
            7 => EntryPoint,
            64 => RunProg,
            65 => ReadData,
            256 => EndCom,
            257 => FreeMemory,
            0x1000 => PatchFunc,
            0x2000 => PatchObject,
            _ => return None,
        })
    }

    /// Name as it appears in stream listings and logs.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::AllocateData => "ALLOCATE_DATA",
            Opcode::CopyData => "COPY_DATA",
            Opcode::AllocateCode => "ALLOCATE_CODE",
            Opcode::CopyCode => "COPY_CODE",
            Opcode::EntryPoint => "ENTRY_POINT",
            Opcode::RunProg => "RUN_PROG",
            Opcode::ReadData => "READ_DATA",
            Opcode::EndCom => "END_COM",
            Opcode::FreeMemory => "FREE_MEMORY",
            Opcode::PatchFunc => "PATCH_FUNC",
            Opcode::PatchObject => "PATCH_OBJECT",
        }
    }

    /// Number of fixed 4-byte operand fields following the opcode.
    /// Copy commands are additionally followed by `size` payload bytes.
    pub fn operand_fields(self) -> usize {
        match self {
            Opcode::RunProg | Opcode::EndCom | Opcode::FreeMemory => 0,
            Opcode::AllocateData | Opcode::AllocateCode | Opcode::EntryPoint => 1,
            Opcode::CopyData | Opcode::CopyCode | Opcode::ReadData => 2,
            Opcode::PatchFunc | Opcode::PatchObject => 3,
        }
    }

    /// True for the commands whose second operand announces an inline payload.
    pub fn has_payload(self) -> bool {
        matches!(self, Opcode::CopyData | Opcode::CopyCode)
    }
}

impl TryFrom<u32> for Opcode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Opcode::from_u32(value).ok_or(value)
    }
}

impl core::fmt::Display for Opcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
