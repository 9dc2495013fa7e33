//! Data movement, register manipulation, and stack frames.

use super::flags::FlagsUpdate;
use super::helpers::word_displacement;
use crate::decoder::{AddressingMode, Instruction};
use crate::ea::Operand;
use crate::state::Condition;
use crate::{Machine, OpSize, Trap};

/// `MOVE`: source resolved before destination.
pub fn execute_move(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let src = machine.source(instr)?;
    let value = machine.read(src, instr.size)?;
    let dst = machine.destination(instr)?;
    machine.write(dst, instr.size, value)?;
    FlagsUpdate::Logical { result: value }.apply(&mut machine.registers, instr.size);
    Ok(())
}

/// `MOVEA`: sign-extended into the whole address register, flags untouched.
pub fn execute_movea(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let src = machine.source(instr)?;
    let value = instr.size.sign_extend(machine.read(src, instr.size)?);
    machine
        .registers
        .write_address(instr.high_register(), value, OpSize::Long);
    Ok(())
}

/// `MOVEQ #d8,Dn`.
pub fn execute_moveq(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let result = OpSize::Byte.sign_extend(u32::from(instr.opcode));
    machine
        .registers
        .write_data(instr.high_register(), result, OpSize::Long);
    FlagsUpdate::Logical { result }.apply(&mut machine.registers, OpSize::Long);
    Ok(())
}

/// `MOVE SR,<ea>`.
pub fn execute_move_from_sr(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let dst = machine.destination(instr)?;
    let sr = u32::from(machine.registers.sr());
    machine.write(dst, OpSize::Word, sr)
}

/// `MOVE <ea>,CCR`.
pub fn execute_move_to_ccr(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let src = machine.source(instr)?;
    let value = machine.read(src, OpSize::Byte)?;
    machine.registers.set_ccr(value as u16);
    Ok(())
}

/// `MOVE <ea>,SR` (privileged).
pub fn execute_move_to_sr(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    machine.require_supervisor()?;
    let src = machine.source(instr)?;
    let value = machine.read(src, OpSize::Word)?;
    machine.registers.set_sr(value as u16);
    Ok(())
}

/// `MOVE An,USP` / `MOVE USP,An` (privileged).
pub fn execute_move_usp(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    machine.require_supervisor()?;
    let an = instr.low_register();
    if instr.opcode & 0x0008 == 0 {
        let value = machine.registers.read_address(an);
        machine.registers.set_usp(value);
    } else {
        let usp = machine.registers.usp();
        machine.registers.write_address(an, usp, OpSize::Long);
    }
    Ok(())
}

/// `CLR`.
pub fn execute_clr(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let dst = machine.destination(instr)?;
    machine.write(dst, instr.size, 0)?;
    FlagsUpdate::Logical { result: 0 }.apply(&mut machine.registers, instr.size);
    Ok(())
}

/// `EXT.W` (byte to word) and `EXT.L` (word to long).
pub fn execute_ext(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let dn = instr.low_register();
    let value = machine.registers.read_data(dn);
    let (result, size) = if instr.opcode & 0x0040 == 0 {
        (OpSize::Byte.sign_extend(value), OpSize::Word)
    } else {
        (OpSize::Word.sign_extend(value), OpSize::Long)
    };
    machine.registers.write_data(dn, result, size);
    FlagsUpdate::Logical { result }.apply(&mut machine.registers, size);
    Ok(())
}

/// `SWAP Dn`.
pub fn execute_swap(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let dn = instr.low_register();
    let result = machine.registers.read_data(dn).rotate_left(16);
    machine.registers.write_data(dn, result, OpSize::Long);
    FlagsUpdate::Logical { result }.apply(&mut machine.registers, OpSize::Long);
    Ok(())
}

/// `EXG` between two data, two address, or a data and an address register.
pub fn execute_exg(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let (rx, ry) = (instr.high_register(), instr.low_register());
    let (x, y) = match (instr.opcode >> 3) & 0x1F {
        0x08 => (Operand::DataRegister(rx), Operand::DataRegister(ry)),
        0x09 => (Operand::AddressRegister(rx), Operand::AddressRegister(ry)),
        0x11 => (Operand::DataRegister(rx), Operand::AddressRegister(ry)),
        _ => return Err(Trap::IllegalInstruction),
    };
    let a = machine.read(x, OpSize::Long)?;
    let b = machine.read(y, OpSize::Long)?;
    machine.write(x, OpSize::Long, b)?;
    machine.write(y, OpSize::Long, a)
}

/// `LEA <ea>,An`.
pub fn execute_lea(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let address = machine.control(instr.src.as_ref())?;
    machine
        .registers
        .write_address(instr.high_register(), address, OpSize::Long);
    Ok(())
}

/// `PEA <ea>`.
pub fn execute_pea(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let address = machine.control(instr.src.as_ref())?;
    machine.push_long(address)
}

/// `LINK An,#d16`.
pub fn execute_link(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let an = instr.low_register();
    machine.push_long(machine.registers.read_address(an))?;
    let sp = machine.registers.sp();
    machine.registers.write_address(an, sp, OpSize::Long);
    machine
        .registers
        .set_sp(sp.wrapping_add(word_displacement(instr)));
    Ok(())
}

/// `UNLK An`.
pub fn execute_unlk(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let an = instr.low_register();
    let frame = machine.registers.read_address(an);
    machine.registers.set_sp(frame);
    let saved = machine.pop_long()?;
    machine.registers.write_address(an, saved, OpSize::Long);
    Ok(())
}

/// `Scc <ea>`: all ones when the condition holds, zero otherwise.
pub fn execute_scc(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let condition = Condition::from_opcode(instr.opcode);
    let value = if machine.registers.evaluate_condition(condition) {
        0xFF
    } else {
        0x00
    };
    let dst = machine.destination(instr)?;
    machine.write(dst, OpSize::Byte, value)
}

/// `MOVEP`: transfers to or from alternate bytes starting at `d16(Ay)`.
pub fn execute_movep(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let dn = instr.high_register();
    let base = machine
        .registers
        .read_address(instr.low_register())
        .wrapping_add(word_displacement(instr));
    let count = instr.size.bytes();
    let addresses = (0..count).map(|i| base.wrapping_add(i * 2));

    if instr.opcode & 0x0080 == 0 {
        let mut value = 0u32;
        for address in addresses {
            value = (value << 8) | u32::from(machine.memory.read_byte(address)?);
        }
        machine.registers.write_data(dn, value, instr.size);
    } else {
        let value = machine.registers.read_data(dn);
        for (i, address) in (0..count).rev().zip(addresses) {
            machine.memory.write_byte(address, (value >> (i * 8)) as u8)?;
        }
    }
    Ok(())
}

/// `MOVEM`: register list transfer, mask in the first extension word.
///
/// Register-to-memory with pre-decrement walks `A7` down to `D0` and writes
/// the final address back; every other form walks `D0` up to `A7`. Words
/// loaded into registers are sign-extended.
pub fn execute_movem(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let mask = instr.extension.word();
    let size = instr.size;
    let step = size.bytes();
    let ea = instr.dst.as_ref().ok_or(Trap::IllegalInstruction)?;
    let mode = ea.mode().ok_or(Trap::IllegalInstruction)?;
    let to_memory = instr.opcode & 0x0400 == 0;

    let selected = (0..16u8).filter(|bit| mask & (1 << bit) != 0);

    if to_memory {
        if let AddressingMode::PreDecrement(an) = mode {
            let mut address = machine.registers.read_address(an);
            for bit in selected {
                let register = movem_register(15 - bit);
                address = address.wrapping_sub(step);
                let value = machine.read(register, OpSize::Long)?;
                machine.memory.write_sized(address, size, value)?;
            }
            machine.registers.write_address(an, address, OpSize::Long);
            return Ok(());
        }
        let mut address = machine.control(Some(ea))?;
        for bit in selected {
            let value = machine.read(movem_register(bit), OpSize::Long)?;
            machine.memory.write_sized(address, size, value)?;
            address = address.wrapping_add(step);
        }
        return Ok(());
    }

    let post_increment = match mode {
        AddressingMode::PostIncrement(an) => Some(an),
        _ => None,
    };
    let mut address = match post_increment {
        Some(an) => machine.registers.read_address(an),
        None => machine.control(Some(ea))?,
    };
    for bit in selected {
        let value = size.sign_extend(machine.memory.read_sized(address, size)?);
        machine.write(movem_register(bit), OpSize::Long, value)?;
        address = address.wrapping_add(step);
    }
    if let Some(an) = post_increment {
        machine.registers.write_address(an, address, OpSize::Long);
    }
    Ok(())
}

/// Register selected by mask bit `bit` in the `D0..D7, A0..A7` order.
const fn movem_register(bit: u8) -> Operand {
    if bit < 8 {
        Operand::DataRegister(bit)
    } else {
        Operand::AddressRegister(bit - 8)
    }
}
