//! Shift and rotate group.

use crate::decoder::Instruction;
use crate::ea::Operand;
use crate::encoding::HandlerId;
use crate::state::{SR_C, SR_N, SR_V, SR_X, SR_Z};
use crate::{Machine, OpSize, RegisterFile, Trap};

/// Which bits flow in at the vacated end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftKind {
    /// Sign bit replicated on right shifts; V tracks sign changes on left shifts.
    Arithmetic,
    /// Zeros shifted in.
    Logical,
    /// The bit shifted out re-enters at the other end.
    Rotate,
    /// Rotates through the extend bit.
    RotateExtend,
}

/// Direction and kind of one shift handler.
#[must_use]
pub const fn classify(handler: HandlerId) -> Option<(ShiftKind, bool)> {
    use HandlerId as H;
    let entry = match handler {
        H::AsrMemory | H::AsrRegister => (ShiftKind::Arithmetic, false),
        H::AslMemory | H::AslRegister => (ShiftKind::Arithmetic, true),
        H::LsrMemory | H::LsrRegister => (ShiftKind::Logical, false),
        H::LslMemory | H::LslRegister => (ShiftKind::Logical, true),
        H::RoxrMemory | H::RoxrRegister => (ShiftKind::RotateExtend, false),
        H::RoxlMemory | H::RoxlRegister => (ShiftKind::RotateExtend, true),
        H::RorMemory | H::RorRegister => (ShiftKind::Rotate, false),
        H::RolMemory | H::RolRegister => (ShiftKind::Rotate, true),
        _ => return None,
    };
    Some(entry)
}

/// Shifts `value` by `count` positions, one bit at a time, updating the flags.
///
/// With a zero count C is cleared (or copied from X for the extend rotates)
/// and X is unchanged. Otherwise C holds the last bit shifted out, and X
/// follows C for everything except the plain rotates.
pub fn shift(
    regs: &mut RegisterFile,
    kind: ShiftKind,
    left: bool,
    size: OpSize,
    value: u32,
    count: u32,
) -> u32 {
    let msb = size.msb();
    let mut value = size.truncate(value);
    let mut extend = regs.flag(SR_X);
    let mut carry = kind == ShiftKind::RotateExtend && extend;
    let mut overflow = false;

    for _ in 0..count {
        let out = if left {
            value & msb != 0
        } else {
            value & 1 != 0
        };
        let fill = match kind {
            ShiftKind::Arithmetic => !left && value & msb != 0,
            ShiftKind::Logical => false,
            ShiftKind::Rotate => out,
            ShiftKind::RotateExtend => extend,
        };
        let before = value;
        value = if left {
            size.truncate(value << 1) | u32::from(fill)
        } else {
            (value >> 1) | if fill { msb } else { 0 }
        };
        if kind == ShiftKind::Arithmetic && left && (before ^ value) & msb != 0 {
            overflow = true;
        }
        carry = out;
        if kind == ShiftKind::RotateExtend {
            extend = out;
        }
    }

    if count > 0 && kind != ShiftKind::Rotate {
        regs.set_flag(SR_X, carry);
    }
    regs.set_flag(SR_N, size.is_negative(value));
    regs.set_flag(SR_Z, value == 0);
    regs.set_flag(SR_V, overflow);
    regs.set_flag(SR_C, carry);
    value
}

/// Register form: `Dy` shifted by an immediate 1-8 or by `Dx` modulo 64.
pub fn execute_shift_register(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let (kind, left) = classify(instr.handler).ok_or(Trap::IllegalInstruction)?;
    let count = if instr.opcode & 0x0020 == 0 {
        match instr.high_register() {
            0 => 8,
            n => u32::from(n),
        }
    } else {
        machine.registers.read_data(instr.high_register()) % 64
    };
    let dy = instr.low_register();
    let value = machine.registers.read_data(dy);
    let result = shift(&mut machine.registers, kind, left, instr.size, value, count);
    machine.registers.write_data(dy, result, instr.size);
    Ok(())
}

/// Memory form: a word operand shifted by one.
pub fn execute_shift_memory(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let (kind, left) = classify(instr.handler).ok_or(Trap::IllegalInstruction)?;
    let operand = machine.source(instr)?;
    if !matches!(operand, Operand::Memory(_)) {
        return Err(Trap::IllegalInstruction);
    }
    let value = machine.read(operand, OpSize::Word)?;
    let result = shift(&mut machine.registers, kind, left, OpSize::Word, value, 1);
    machine.write(operand, OpSize::Word, result)
}
