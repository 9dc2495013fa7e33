//! Bitwise logic, tests, and the status-register immediates.

use super::flags::FlagsUpdate;
use super::helpers::alu_operands;
use crate::decoder::Instruction;
use crate::ea::Operand;
use crate::encoding::HandlerId;
use crate::state::CCR_MASK;
use crate::{Machine, OpSize, Trap};

#[derive(Debug, Clone, Copy)]
enum Logic {
    Or,
    And,
    Eor,
}

impl Logic {
    const fn of(handler: HandlerId) -> Self {
        match handler {
            HandlerId::Or | HandlerId::Ori | HandlerId::OriToCcr | HandlerId::OriToSr => Self::Or,
            HandlerId::And | HandlerId::Andi | HandlerId::AndiToCcr | HandlerId::AndiToSr => {
                Self::And
            }
            _ => Self::Eor,
        }
    }

    const fn combine(self, a: u32, b: u32) -> u32 {
        match self {
            Self::Or => a | b,
            Self::And => a & b,
            Self::Eor => a ^ b,
        }
    }
}

fn combine_into(
    machine: &mut Machine,
    op: Logic,
    src: Operand,
    dst: Operand,
    size: OpSize,
) -> Result<(), Trap> {
    let a = machine.read(src, size)?;
    let b = machine.read(dst, size)?;
    let result = size.truncate(op.combine(a, b));
    machine.write(dst, size, result)?;
    FlagsUpdate::Logical { result }.apply(&mut machine.registers, size);
    Ok(())
}

/// `ORI`/`ANDI`/`EORI` to CCR. Only the five implemented flag bits change.
pub fn execute_ccr_immediate(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let op = Logic::of(instr.handler);
    let imm = match op {
        Logic::And => instr.extension.word() | !CCR_MASK,
        Logic::Or | Logic::Eor => instr.extension.word() & CCR_MASK,
    };
    let ccr = machine.registers.ccr();
    machine
        .registers
        .set_ccr(op.combine(u32::from(ccr), u32::from(imm)) as u16);
    Ok(())
}

/// `ORI`/`ANDI`/`EORI` to SR (privileged).
pub fn execute_sr_immediate(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    machine.require_supervisor()?;
    let op = Logic::of(instr.handler);
    let sr = op.combine(
        u32::from(machine.registers.sr()),
        u32::from(instr.extension.word()),
    );
    machine.registers.set_sr(sr as u16);
    Ok(())
}

/// `ORI`, `ANDI`, `EORI` to an EA.
pub fn execute_logic_immediate(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let imm = Operand::Immediate(instr.size.truncate(instr.extension.long()));
    let dst = machine.destination(instr)?;
    combine_into(machine, Logic::of(instr.handler), imm, dst, instr.size)
}

/// `OR`, `AND` in both directions.
pub fn execute_logic(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let (src, dst) = alu_operands(machine, instr)?;
    combine_into(machine, Logic::of(instr.handler), src, dst, instr.size)
}

/// `EOR Dn,<ea>`.
pub fn execute_eor(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let dst = machine.destination(instr)?;
    let src = Operand::DataRegister(instr.high_register());
    combine_into(machine, Logic::Eor, src, dst, instr.size)
}

/// `NOT`.
pub fn execute_not(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let operand = machine.destination(instr)?;
    let result = instr.size.truncate(!machine.read(operand, instr.size)?);
    machine.write(operand, instr.size, result)?;
    FlagsUpdate::Logical { result }.apply(&mut machine.registers, instr.size);
    Ok(())
}

/// `TST`.
pub fn execute_tst(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let operand = machine.destination(instr)?;
    let result = machine.read(operand, instr.size)?;
    FlagsUpdate::Logical { result }.apply(&mut machine.registers, instr.size);
    Ok(())
}

/// `TAS`: test the byte, then set its high bit.
pub fn execute_tas(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let operand = machine.destination(instr)?;
    let value = machine.read(operand, OpSize::Byte)?;
    FlagsUpdate::Logical { result: value }.apply(&mut machine.registers, OpSize::Byte);
    machine.write(operand, OpSize::Byte, value | 0x80)
}
