use thiserror::Error;

/// Vector number assigned to the first `TRAP #n` instruction vector.
pub const EXPLICIT_TRAP_BASE_VECTOR: u8 = 32;

/// Trap classes used for logging and host policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TrapClass {
    /// Bus or alignment violation raised by a memory access.
    Memory,
    /// Opcode is unknown or its operands are malformed.
    Decode,
    /// Arithmetic exception (`DIVU`/`DIVS` by zero, `CHK`, `TRAPV`).
    Arithmetic,
    /// Supervisor-only operation attempted in user mode.
    Privilege,
    /// Software-requested `TRAP #n`.
    Software,
}

/// Exception signal raised by the interpreter and propagated to the host.
///
/// The engine never catches these; `Machine::step`/`Machine::run` hand them
/// to the caller, which decides whether to halt, log, or emulate a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Trap {
    /// Access to a location the bus cannot service.
    #[error("bus error")]
    BusError,
    /// Misaligned or out-of-bounds memory access.
    #[error("address error")]
    AddressError,
    /// Opcode absent from the pattern table, `ILLEGAL`, or an invalid operand.
    #[error("illegal instruction")]
    IllegalInstruction,
    /// `DIVU`/`DIVS` with a zero divisor.
    #[error("integer divide by zero")]
    DivideByZero,
    /// `CHK` register value outside `0..=bound`.
    #[error("chk bounds violation")]
    ChkBounds,
    /// `TRAPV` executed with Overflow set.
    #[error("trapv with overflow set")]
    TrapvOverflow,
    /// Supervisor-only operation attempted in user mode.
    #[error("privilege violation")]
    PrivilegeViolation,
    /// `TRAP #n` (`n` in `0..=15`).
    #[error("trap #{0}")]
    Explicit(u8),
}

impl Trap {
    /// Returns the exception vector number for this trap.
    #[must_use]
    pub const fn vector(self) -> u8 {
        match self {
            Self::BusError => 2,
            Self::AddressError => 3,
            Self::IllegalInstruction => 4,
            Self::DivideByZero => 5,
            Self::ChkBounds => 6,
            Self::TrapvOverflow => 7,
            Self::PrivilegeViolation => 8,
            Self::Explicit(n) => EXPLICIT_TRAP_BASE_VECTOR + (n & 0x0F),
        }
    }

    /// Maps an exception vector number back onto a trap.
    #[must_use]
    pub const fn from_vector(vector: u8) -> Option<Self> {
        match vector {
            2 => Some(Self::BusError),
            3 => Some(Self::AddressError),
            4 => Some(Self::IllegalInstruction),
            5 => Some(Self::DivideByZero),
            6 => Some(Self::ChkBounds),
            7 => Some(Self::TrapvOverflow),
            8 => Some(Self::PrivilegeViolation),
            32..=47 => Some(Self::Explicit(vector - EXPLICIT_TRAP_BASE_VECTOR)),
            _ => None,
        }
    }

    /// Returns the class used to group this trap.
    #[must_use]
    pub const fn class(self) -> TrapClass {
        match self {
            Self::BusError | Self::AddressError => TrapClass::Memory,
            Self::IllegalInstruction => TrapClass::Decode,
            Self::DivideByZero | Self::ChkBounds | Self::TrapvOverflow => TrapClass::Arithmetic,
            Self::PrivilegeViolation => TrapClass::Privilege,
            Self::Explicit(_) => TrapClass::Software,
        }
    }
}

/// Errors returned by the host-facing machine surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MachineError {
    /// An instruction raised a trap.
    #[error("{trap} (vector {})", .trap.vector())]
    Trap {
        /// The raised trap.
        #[from]
        trap: Trap,
    },
    /// A load would not fit in the configured memory capacity.
    #[error("loading {len} bytes at {address:#010x} exceeds memory capacity of {capacity:#x} bytes")]
    LoadOutOfRange {
        /// Requested load address.
        address: u32,
        /// Number of bytes to load.
        len: usize,
        /// Configured memory capacity.
        capacity: usize,
    },
    /// A memory range request falls outside the store.
    #[error("memory range {address:#010x}+{len:#x} is out of bounds")]
    RangeOutOfBounds {
        /// First byte of the requested range.
        address: u32,
        /// Length of the requested range.
        len: usize,
    },
    /// Fetch attempted at or beyond the end of the loaded executable.
    #[error("program counter {pc:#010x} ran past the end of loaded code")]
    PastEndOfCode {
        /// Program counter at the failed fetch.
        pc: u32,
    },
}

impl MachineError {
    /// Returns the wrapped trap when this error came from one.
    #[must_use]
    pub const fn trap(&self) -> Option<Trap> {
        match self {
            Self::Trap { trap } => Some(*trap),
            Self::LoadOutOfRange { .. }
            | Self::RangeOutOfBounds { .. }
            | Self::PastEndOfCode { .. } => None,
        }
    }
}
