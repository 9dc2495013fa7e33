//! Operand sizes and the bit-level helpers shared by every sized operation.

/// Operand size of a decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OpSize {
    /// 8-bit operand.
    Byte,
    /// 16-bit operand.
    #[default]
    Word,
    /// 32-bit operand.
    Long,
}

impl OpSize {
    /// Decodes the standard two-bit size field (`00`/`01`/`10`).
    ///
    /// `11` is not a size; callers use it to select alternate encodings.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        match bits & 0b11 {
            0 => Some(Self::Byte),
            1 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    /// Decodes the MOVE-family size field held in opcode bits 13-12.
    #[must_use]
    pub const fn from_move_bits(bits: u16) -> Self {
        match bits & 0b11 {
            1 => Self::Byte,
            2 => Self::Long,
            _ => Self::Word,
        }
    }

    /// Number of bytes occupied by one operand of this size.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
        }
    }

    /// Number of bits in one operand of this size.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bytes() * 8
    }

    /// Mask covering the low bits written by an operation of this size.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0x0000_00FF,
            Self::Word => 0x0000_FFFF,
            Self::Long => 0xFFFF_FFFF,
        }
    }

    /// Sign bit for this size.
    #[must_use]
    pub const fn msb(self) -> u32 {
        match self {
            Self::Byte => 0x0000_0080,
            Self::Word => 0x0000_8000,
            Self::Long => 0x8000_0000,
        }
    }

    /// Keeps only the bits that belong to this size.
    #[must_use]
    pub const fn truncate(self, value: u32) -> u32 {
        value & self.mask()
    }

    /// Returns `true` when the sized value has its sign bit set.
    #[must_use]
    pub const fn is_negative(self, value: u32) -> bool {
        value & self.msb() != 0
    }

    /// Sign-extends the sized value to 32 bits.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub const fn sign_extend(self, value: u32) -> u32 {
        match self {
            Self::Byte => value as u8 as i8 as i32 as u32,
            Self::Word => value as u16 as i16 as i32 as u32,
            Self::Long => value,
        }
    }

    /// Assembler suffix (`.B`, `.W`, `.L`).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Byte => ".B",
            Self::Word => ".W",
            Self::Long => ".L",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OpSize;

    #[test]
    fn standard_size_field_decodes_three_sizes() {
        assert_eq!(OpSize::from_bits(0), Some(OpSize::Byte));
        assert_eq!(OpSize::from_bits(1), Some(OpSize::Word));
        assert_eq!(OpSize::from_bits(2), Some(OpSize::Long));
        assert_eq!(OpSize::from_bits(3), None);
    }

    #[test]
    fn move_size_field_uses_alternate_encoding() {
        assert_eq!(OpSize::from_move_bits(1), OpSize::Byte);
        assert_eq!(OpSize::from_move_bits(2), OpSize::Long);
        assert_eq!(OpSize::from_move_bits(3), OpSize::Word);
    }

    #[test]
    fn sign_extension_follows_size() {
        assert_eq!(OpSize::Byte.sign_extend(0x0000_0080), 0xFFFF_FF80);
        assert_eq!(OpSize::Byte.sign_extend(0x1234_567F), 0x0000_007F);
        assert_eq!(OpSize::Word.sign_extend(0x0000_8001), 0xFFFF_8001);
        assert_eq!(OpSize::Long.sign_extend(0x8000_0000), 0x8000_0000);
    }

    #[test]
    fn masks_and_sign_bits_line_up() {
        for size in [OpSize::Byte, OpSize::Word, OpSize::Long] {
            assert_eq!((size.msb() << 1) & size.mask(), 0);
            assert!(size.is_negative(size.msb()));
            assert_eq!(size.bits(), size.bytes() * 8);
        }
    }
}
