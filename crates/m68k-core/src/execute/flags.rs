//! Condition-code update policies shared by the instruction families.

use crate::state::{SR_C, SR_N, SR_V, SR_X, SR_Z};
use crate::{OpSize, RegisterFile};

/// Describes how the condition codes change after an instruction executes.
///
/// Operand values are the raw sized values; only their sign bits and the
/// truncated result matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// No change.
    #[default]
    None,
    /// N and Z from the result, V and C cleared, X kept.
    Logical {
        /// Sized result.
        result: u32,
    },
    /// `dst + src (+ X)`: N, Z, V, C, with X following C.
    Add {
        /// Source operand.
        src: u32,
        /// Destination operand before the operation.
        dst: u32,
        /// Sized result.
        result: u32,
    },
    /// `dst - src (- X)`: N, Z, V, C, with X following C.
    Sub {
        /// Source operand.
        src: u32,
        /// Destination operand before the operation.
        dst: u32,
        /// Sized result.
        result: u32,
    },
    /// Subtract flags without touching X.
    Compare {
        /// Source operand.
        src: u32,
        /// Destination operand.
        dst: u32,
        /// Sized difference.
        result: u32,
    },
    /// `0 - src`: C and X set for any non-zero result.
    Negate {
        /// Operand before negation.
        src: u32,
        /// Sized result.
        result: u32,
    },
    /// `0 - src - X`: C and X set when either sign bit is set.
    NegateExtended {
        /// Operand before negation.
        src: u32,
        /// Sized result.
        result: u32,
    },
}

impl FlagsUpdate {
    /// Applies the update to `regs` for an operation of `size`.
    pub fn apply(self, regs: &mut RegisterFile, size: OpSize) {
        let msb = |value: u32| size.is_negative(value);
        match self {
            Self::None => {}
            Self::Logical { result } => {
                set_nzvc(regs, size, result, false, false);
            }
            Self::Add { src, dst, result } => {
                let (s, d, r) = (msb(src), msb(dst), msb(result));
                let overflow = s == d && s != r;
                let carry = (s && d) || (s && !r) || (d && !r);
                set_nzvc(regs, size, result, overflow, carry);
                regs.set_flag(SR_X, carry);
            }
            Self::Sub { src, dst, result } => {
                let carry = sub_carry(msb(src), msb(dst), msb(result));
                let overflow = sub_overflow(msb(src), msb(dst), msb(result));
                set_nzvc(regs, size, result, overflow, carry);
                regs.set_flag(SR_X, carry);
            }
            Self::Compare { src, dst, result } => {
                let carry = sub_carry(msb(src), msb(dst), msb(result));
                let overflow = sub_overflow(msb(src), msb(dst), msb(result));
                set_nzvc(regs, size, result, overflow, carry);
            }
            Self::Negate { src, result } => {
                let carry = size.truncate(result) != 0;
                set_nzvc(regs, size, result, msb(src) && msb(result), carry);
                regs.set_flag(SR_X, carry);
            }
            Self::NegateExtended { src, result } => {
                let carry = msb(src) || msb(result);
                set_nzvc(regs, size, result, msb(src) && msb(result), carry);
                regs.set_flag(SR_X, carry);
            }
        }
    }
}

const fn sub_carry(s: bool, d: bool, r: bool) -> bool {
    (s && r) || (s && !d) || (!d && r)
}

const fn sub_overflow(s: bool, d: bool, r: bool) -> bool {
    s == r && d != r
}

/// Sets N and Z from `result` and V/C as given.
pub fn set_nzvc(regs: &mut RegisterFile, size: OpSize, result: u32, overflow: bool, carry: bool) {
    regs.set_flag(SR_N, size.is_negative(result));
    regs.set_flag(SR_Z, size.truncate(result) == 0);
    regs.set_flag(SR_V, overflow);
    regs.set_flag(SR_C, carry);
}
