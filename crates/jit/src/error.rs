//! Engine errors

use std::io;

use thiserror::Error;
use types::{ExitStatus, RelocationKind};

use crate::memory::RegionKind;

/// Engine result type
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a command stream.
///
/// Each variant maps onto exactly one [`ExitStatus`] through [`Error::status`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot allocate an empty {kind} region")]
    EmptyAllocation { kind: RegionKind },

    #[error("{kind} region of {size} bytes exceeds the limit of {limit} bytes")]
    AllocationTooLarge {
        kind: RegionKind,
        size: usize,
        limit: usize,
    },

    #[error("failed to map {size} bytes for the {kind} region")]
    MapFailed {
        kind: RegionKind,
        size: usize,
        #[source]
        source: io::Error,
    },

    #[error("code and data regions too far apart: displacement {displacement}")]
    DisplacementOutOfRange { displacement: i128 },

    #[error("object relocation value {value} plus displacement {displacement} overflows 32 bits")]
    RelocationOverflow { value: i32, displacement: i32 },

    #[error("unknown opcode 0x{opcode:x} at byte {position}")]
    UnknownOpcode { opcode: u32, position: usize },

    #[error("access of {len} bytes at offset {offset} exceeds the {kind} region ({region_len} bytes)")]
    OutOfBounds {
        kind: RegionKind,
        offset: usize,
        len: usize,
        region_len: usize,
    },

    #[error("no {kind} region is allocated")]
    RegionMissing { kind: RegionKind },

    #[error("relocation kind {kind} is not supported")]
    UnsupportedRelocation { kind: RelocationKind },

    #[error("failed to make the code region executable")]
    Protect {
        #[source]
        source: io::Error,
    },

    #[error("the {kind} region can never be made executable")]
    NotExecutable { kind: RegionKind },

    #[error("write into the {kind} region after it was made executable")]
    WriteAfterExecute { kind: RegionKind },

    #[error("RUN_PROG issued without a resolved entry point")]
    MissingEntryPoint,

    #[error("stream truncated at byte {position}: needed {needed} bytes, {available} left")]
    Truncated {
        position: usize,
        needed: usize,
        available: usize,
    },
}

impl Error {
    /// Session status reported for this error.
    pub fn status(&self) -> ExitStatus {
        match self {
            Error::EmptyAllocation { .. }
            | Error::AllocationTooLarge { .. }
            | Error::MapFailed { .. } => ExitStatus::AllocationFailure,
            Error::DisplacementOutOfRange { .. } | Error::RelocationOverflow { .. } => {
                ExitStatus::OutOfRangeDisplacement
            }
            Error::UnknownOpcode { .. } => ExitStatus::UnknownOpcode,
            Error::OutOfBounds { .. } | Error::RegionMissing { .. } => ExitStatus::OutOfBounds,
            Error::UnsupportedRelocation { .. } => ExitStatus::UnsupportedRelocation,
            Error::Protect { .. } | Error::NotExecutable { .. } => ExitStatus::PermissionError,
            Error::WriteAfterExecute { .. } => ExitStatus::WriteAfterExecute,
            Error::MissingEntryPoint => ExitStatus::MissingEntryPoint,
            Error::Truncated { .. } => ExitStatus::TruncatedStream,
        }
    }
}
