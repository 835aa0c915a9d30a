/// Relocation encodings understood by the patcher.
///
/// Only `Relative32` is implemented. The remaining identifiers are reserved
/// by the stream producer for architecture-specific encodings; a stream that
/// uses one of them cannot be loaded correctly and must be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocationKind {
    /// 4-byte signed store in native byte order.
    Relative32,
    /// Upper 21 bits of a page-relative immediate (aarch64 ADRP style).
    Hi21,
    /// Absolute address store.
    Absolute,
    /// PC-relative encoding.
    PcRelative,
    /// Architecture-specific absolute variant.
    AbsoluteArch,
    /// Any identifier the producer never defined.
    Unknown(u32),
}

impl RelocationKind {
    pub const RELATIVE_32: u32 = 0;
    pub const HI21: u32 = 0x2001;
    pub const ABSOLUTE: u32 = 0x2002;
    pub const PC_RELATIVE: u32 = 0x2003;
    pub const ABSOLUTE_ARCH: u32 = 0x2004;

    pub fn from_u32(id: u32) -> Self {
        match id {
            Self::RELATIVE_32 => RelocationKind::Relative32,
            Self::HI21 => RelocationKind::Hi21,
            Self::ABSOLUTE => RelocationKind::Absolute,
            Self::PC_RELATIVE => RelocationKind::PcRelative,
            Self::ABSOLUTE_ARCH => RelocationKind::AbsoluteArch,
            other => RelocationKind::Unknown(other),
        }
    }

    /// Wire identifier of this kind.
    pub fn id(self) -> u32 {
        match self {
            RelocationKind::Relative32 => Self::RELATIVE_32,
            RelocationKind::Hi21 => Self::HI21,
            RelocationKind::Absolute => Self::ABSOLUTE,
            RelocationKind::PcRelative => Self::PC_RELATIVE,
            RelocationKind::AbsoluteArch => Self::ABSOLUTE_ARCH,
            RelocationKind::Unknown(id) => id,
        }
    }

    /// Number of bytes the patch overwrites, `None` for kinds without an encoding.
    pub fn width(self) -> Option<usize> {
        match self {
            RelocationKind::Relative32 => Some(4),
            _ => None,
        }
    }
}

impl From<u32> for RelocationKind {
    fn from(id: u32) -> Self {
        RelocationKind::from_u32(id)
    }
}

impl core::fmt::Display for RelocationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RelocationKind::Relative32 => f.write_str("RELATIVE_32"),
            RelocationKind::Hi21 => f.write_str("HI21"),
            RelocationKind::Absolute => f.write_str("ABS"),
            RelocationKind::PcRelative => f.write_str("REL"),
            RelocationKind::AbsoluteArch => f.write_str("ABS_ARCH"),
            RelocationKind::Unknown(id) => write!(f, "UNKNOWN(0x{:x})", id),
        }
    }
}
