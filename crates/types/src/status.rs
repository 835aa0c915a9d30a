/// Session result reported to whoever handed the engine a command stream.
///
/// A session either reaches END_COM (`NormalCompletion`) or stops at the
/// first failing command with exactly one of the other variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    NormalCompletion,
    UnknownOpcode,
    AllocationFailure,
    OutOfRangeDisplacement,
    UnsupportedRelocation,
    OutOfBounds,
    PermissionError,
    WriteAfterExecute,
    MissingEntryPoint,
    TruncatedStream,
}

impl ExitStatus {
    /// Stable integer code: `1` on success, negative on failure.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::NormalCompletion => 1,
            ExitStatus::UnknownOpcode => -1,
            ExitStatus::AllocationFailure => -2,
            ExitStatus::OutOfBounds => -3,
            ExitStatus::OutOfRangeDisplacement => -4,
            ExitStatus::UnsupportedRelocation => -5,
            ExitStatus::PermissionError => -6,
            ExitStatus::WriteAfterExecute => -7,
            ExitStatus::MissingEntryPoint => -8,
            ExitStatus::TruncatedStream => -9,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => ExitStatus::NormalCompletion,
            -1 => ExitStatus::UnknownOpcode,
            -2 => ExitStatus::AllocationFailure,
            -3 => ExitStatus::OutOfBounds,
            -4 => ExitStatus::OutOfRangeDisplacement,
            -5 => ExitStatus::UnsupportedRelocation,
            -6 => ExitStatus::PermissionError,
            -7 => ExitStatus::WriteAfterExecute,
            -8 => ExitStatus::MissingEntryPoint,
            -9 => ExitStatus::TruncatedStream,
            _ => return None,
        })
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::NormalCompletion
    }
}

impl core::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ExitStatus::NormalCompletion => "normal completion",
            ExitStatus::UnknownOpcode => "unknown opcode",
            ExitStatus::AllocationFailure => "allocation failure",
            ExitStatus::OutOfRangeDisplacement => "code/data displacement out of range",
            ExitStatus::UnsupportedRelocation => "unsupported relocation",
            ExitStatus::OutOfBounds => "out of bounds",
            ExitStatus::PermissionError => "permission error",
            ExitStatus::WriteAfterExecute => "write after execute",
            ExitStatus::MissingEntryPoint => "missing entry point",
            ExitStatus::TruncatedStream => "truncated stream",
        };
        write!(f, "{} ({})", name, self.code())
    }
}
