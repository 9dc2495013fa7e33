//! Integer add, subtract, compare, negate, multiply and divide.

use super::flags::{set_nzvc, FlagsUpdate};
use super::helpers::alu_operands;
use crate::decoder::Instruction;
use crate::ea::Operand;
use crate::encoding::HandlerId;
use crate::state::{SR_C, SR_V, SR_X};
use crate::{Machine, OpSize, Trap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arith {
    Add,
    Sub,
    Cmp,
}

impl Arith {
    const fn compute(self, dst: u32, src: u32, extend: u32) -> u32 {
        match self {
            Self::Add => dst.wrapping_add(src).wrapping_add(extend),
            Self::Sub | Self::Cmp => dst.wrapping_sub(src).wrapping_sub(extend),
        }
    }

    const fn flags(self, src: u32, dst: u32, result: u32) -> FlagsUpdate {
        match self {
            Self::Add => FlagsUpdate::Add { src, dst, result },
            Self::Sub => FlagsUpdate::Sub { src, dst, result },
            Self::Cmp => FlagsUpdate::Compare { src, dst, result },
        }
    }
}

/// Reads both operands, combines them, writes back unless comparing, and sets flags.
fn apply(
    machine: &mut Machine,
    op: Arith,
    src_operand: Operand,
    dst_operand: Operand,
    size: OpSize,
) -> Result<(), Trap> {
    let src = machine.read(src_operand, size)?;
    let dst = machine.read(dst_operand, size)?;
    let result = size.truncate(op.compute(dst, src, 0));
    if op != Arith::Cmp {
        machine.write(dst_operand, size, result)?;
    }
    op.flags(src, dst, result).apply(&mut machine.registers, size);
    Ok(())
}

/// `ADD`, `SUB` in both directions.
pub fn execute_add_sub(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let op = if instr.handler == HandlerId::Add {
        Arith::Add
    } else {
        Arith::Sub
    };
    let (src, dst) = alu_operands(machine, instr)?;
    apply(machine, op, src, dst, instr.size)
}

/// `CMP <ea>,Dn`.
pub fn execute_cmp(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let src = machine.destination(instr)?;
    let dst = Operand::DataRegister(instr.high_register());
    apply(machine, Arith::Cmp, src, dst, instr.size)
}

/// `ADDI`, `SUBI`, `CMPI`.
pub fn execute_arith_immediate(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let op = match instr.handler {
        HandlerId::Addi => Arith::Add,
        HandlerId::Subi => Arith::Sub,
        _ => Arith::Cmp,
    };
    let imm = Operand::Immediate(instr.size.truncate(instr.extension.long()));
    let dst = machine.destination(instr)?;
    apply(machine, op, imm, dst, instr.size)
}

/// `ADDQ`, `SUBQ`; an address-register destination is updated whole with no flag change.
pub fn execute_quick(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let op = if instr.handler == HandlerId::Addq {
        Arith::Add
    } else {
        Arith::Sub
    };
    let data = match instr.high_register() {
        0 => 8,
        n => u32::from(n),
    };
    let dst = machine.destination(instr)?;
    if let Operand::AddressRegister(n) = dst {
        let value = op.compute(machine.registers.read_address(n), data, 0);
        machine.registers.write_address(n, value, OpSize::Long);
        return Ok(());
    }
    apply(machine, op, Operand::Immediate(data), dst, instr.size)
}

/// `ADDA`, `SUBA`, `CMPA`: source sign-extended, operation on the full address register.
pub fn execute_address_arith(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let operand = machine.source(instr)?;
    let src = instr.size.sign_extend(machine.read(operand, instr.size)?);
    let an = instr.high_register();
    let dst = machine.registers.read_address(an);
    match instr.handler {
        HandlerId::Adda => {
            machine
                .registers
                .write_address(an, dst.wrapping_add(src), OpSize::Long);
        }
        HandlerId::Suba => {
            machine
                .registers
                .write_address(an, dst.wrapping_sub(src), OpSize::Long);
        }
        _ => {
            let result = dst.wrapping_sub(src);
            FlagsUpdate::Compare { src, dst, result }.apply(&mut machine.registers, OpSize::Long);
        }
    }
    Ok(())
}

/// `ADDX`, `SUBX`: `Dy,Dx` or `-(Ay),-(Ax)` with the extend bit as carry-in.
pub fn execute_extended(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let size = instr.size;
    let (ry, rx) = (instr.low_register(), instr.high_register());
    let (src_operand, dst_operand) = if instr.opcode & 0x0008 == 0 {
        (Operand::DataRegister(ry), Operand::DataRegister(rx))
    } else {
        let src = machine.registers.decrement_address(ry, size);
        let dst = machine.registers.decrement_address(rx, size);
        (Operand::Memory(src), Operand::Memory(dst))
    };
    let src = machine.read(src_operand, size)?;
    let dst = machine.read(dst_operand, size)?;
    let extend = u32::from(machine.registers.flag(SR_X));
    let op = if instr.handler == HandlerId::Addx {
        Arith::Add
    } else {
        Arith::Sub
    };
    let result = size.truncate(op.compute(dst, src, extend));
    machine.write(dst_operand, size, result)?;
    op.flags(src, dst, result).apply(&mut machine.registers, size);
    Ok(())
}

/// `CMPM (Ay)+,(Ax)+`.
pub fn execute_cmpm(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let size = instr.size;
    let (ry, rx) = (instr.low_register(), instr.high_register());
    let src_address = machine.registers.read_address(ry);
    machine.registers.increment_address(ry, size);
    let dst_address = machine.registers.read_address(rx);
    machine.registers.increment_address(rx, size);
    apply(
        machine,
        Arith::Cmp,
        Operand::Memory(src_address),
        Operand::Memory(dst_address),
        size,
    )
}

/// `NEG`.
pub fn execute_neg(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let operand = machine.destination(instr)?;
    let src = machine.read(operand, instr.size)?;
    let result = instr.size.truncate(0u32.wrapping_sub(src));
    machine.write(operand, instr.size, result)?;
    FlagsUpdate::Negate { src, result }.apply(&mut machine.registers, instr.size);
    Ok(())
}

/// `NEGX`: `0 - (operand + X)`.
pub fn execute_negx(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let operand = machine.destination(instr)?;
    let src = machine.read(operand, instr.size)?;
    let extend = u32::from(machine.registers.flag(SR_X));
    let result = instr
        .size
        .truncate(0u32.wrapping_sub(src).wrapping_sub(extend));
    machine.write(operand, instr.size, result)?;
    FlagsUpdate::NegateExtended { src, result }.apply(&mut machine.registers, instr.size);
    Ok(())
}

/// `MULU`, `MULS`: 16 x 16 -> 32 into `Dn`.
pub fn execute_multiply(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let operand = machine.source(instr)?;
    let src = machine.read(operand, OpSize::Word)?;
    let dn = instr.high_register();
    let dst = OpSize::Word.truncate(machine.registers.read_data(dn));
    let result = if instr.handler == HandlerId::Muls {
        let product = (OpSize::Word.sign_extend(src) as i32)
            .wrapping_mul(OpSize::Word.sign_extend(dst) as i32);
        product as u32
    } else {
        src * dst
    };
    machine.registers.write_data(dn, result, OpSize::Long);
    FlagsUpdate::Logical { result }.apply(&mut machine.registers, OpSize::Long);
    Ok(())
}

/// `DIVU`, `DIVS`: 32 / 16 into a `remainder:quotient` pair in `Dn`.
///
/// A quotient that does not fit in 16 bits sets V, clears C, and leaves
/// `Dn`, N and Z untouched.
pub fn execute_divide(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let operand = machine.source(instr)?;
    let divisor = machine.read(operand, OpSize::Word)?;
    if divisor == 0 {
        return Err(Trap::DivideByZero);
    }
    let dn = instr.high_register();
    let dividend = machine.registers.read_data(dn);

    let packed = if instr.handler == HandlerId::Divs {
        let dividend = i64::from(dividend as i32);
        let divisor = i64::from(OpSize::Word.sign_extend(divisor) as i32);
        let quotient = dividend / divisor;
        let remainder = dividend % divisor;
        i16::try_from(quotient)
            .ok()
            .map(|q| ((remainder as u32 & 0xFFFF) << 16) | u32::from(q as u16))
    } else {
        let quotient = dividend / divisor;
        let remainder = dividend % divisor;
        (quotient <= 0xFFFF).then_some((remainder << 16) | quotient)
    };

    let regs = &mut machine.registers;
    match packed {
        Some(value) => {
            regs.write_data(dn, value, OpSize::Long);
            set_nzvc(regs, OpSize::Word, value, false, false);
        }
        None => {
            regs.set_flag(SR_V, true);
            regs.set_flag(SR_C, false);
        }
    }
    Ok(())
}
