//! Status register layout and the condition-code evaluator.

/// Carry.
pub const SR_C: u16 = 1 << 0;
/// Overflow.
pub const SR_V: u16 = 1 << 1;
/// Zero.
pub const SR_Z: u16 = 1 << 2;
/// Negative.
pub const SR_N: u16 = 1 << 3;
/// Extend.
pub const SR_X: u16 = 1 << 4;
/// Interrupt priority mask (bits 10-8).
pub const SR_INTERRUPT_MASK: u16 = 0x0700;
/// Supervisor mode.
pub const SR_S: u16 = 1 << 13;
/// Trace mode.
pub const SR_T: u16 = 1 << 15;
/// Condition-code register (low byte of SR) bits that exist.
pub const CCR_MASK: u16 = SR_C | SR_V | SR_Z | SR_N | SR_X;
/// Every SR bit implemented by the core; writes drop the rest.
pub const SR_WRITE_MASK: u16 = SR_T | SR_S | SR_INTERRUPT_MASK | CCR_MASK;

/// Names of the SR bits, most significant first, used by state dumps.
pub const SR_FLAG_NAMES: [(u16, &str); 7] = [
    (SR_T, "Trace"),
    (SR_S, "Supervisor"),
    (SR_X, "Extend"),
    (SR_N, "Negative"),
    (SR_Z, "Zero"),
    (SR_V, "Overflow"),
    (SR_C, "Carry"),
];

/// One of the sixteen condition codes carried in opcode bits 11-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Condition {
    True = 0,
    False = 1,
    Higher = 2,
    LowerOrSame = 3,
    CarryClear = 4,
    CarrySet = 5,
    NotEqual = 6,
    Equal = 7,
    OverflowClear = 8,
    OverflowSet = 9,
    Plus = 10,
    Minus = 11,
    GreaterOrEqual = 12,
    LessThan = 13,
    GreaterThan = 14,
    LessOrEqual = 15,
}

impl Condition {
    /// Decodes the low four bits of `bits`.
    #[must_use]
    pub const fn from_u4(bits: u16) -> Self {
        match bits & 0x0F {
            0 => Self::True,
            1 => Self::False,
            2 => Self::Higher,
            3 => Self::LowerOrSame,
            4 => Self::CarryClear,
            5 => Self::CarrySet,
            6 => Self::NotEqual,
            7 => Self::Equal,
            8 => Self::OverflowClear,
            9 => Self::OverflowSet,
            10 => Self::Plus,
            11 => Self::Minus,
            12 => Self::GreaterOrEqual,
            13 => Self::LessThan,
            14 => Self::GreaterThan,
            _ => Self::LessOrEqual,
        }
    }

    /// Extracts the condition field (bits 11-8) of an opcode.
    #[must_use]
    pub const fn from_opcode(opcode: u16) -> Self {
        Self::from_u4(opcode >> 8)
    }

    /// Evaluates the condition against a status register value.
    #[must_use]
    pub const fn evaluate(self, sr: u16) -> bool {
        let c = sr & SR_C != 0;
        let v = sr & SR_V != 0;
        let z = sr & SR_Z != 0;
        let n = sr & SR_N != 0;
        match self {
            Self::True => true,
            Self::False => false,
            Self::Higher => !c && !z,
            Self::LowerOrSame => c || z,
            Self::CarryClear => !c,
            Self::CarrySet => c,
            Self::NotEqual => !z,
            Self::Equal => z,
            Self::OverflowClear => !v,
            Self::OverflowSet => v,
            Self::Plus => !n,
            Self::Minus => n,
            Self::GreaterOrEqual => n == v,
            Self::LessThan => n != v,
            Self::GreaterThan => !z && n == v,
            Self::LessOrEqual => z || n != v,
        }
    }

    /// Two-letter assembler suffix (`EQ`, `NE`, ...).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::True => "T",
            Self::False => "F",
            Self::Higher => "HI",
            Self::LowerOrSame => "LS",
            Self::CarryClear => "CC",
            Self::CarrySet => "CS",
            Self::NotEqual => "NE",
            Self::Equal => "EQ",
            Self::OverflowClear => "VC",
            Self::OverflowSet => "VS",
            Self::Plus => "PL",
            Self::Minus => "MI",
            Self::GreaterOrEqual => "GE",
            Self::LessThan => "LT",
            Self::GreaterThan => "GT",
            Self::LessOrEqual => "LE",
        }
    }
}
