//! Packed decimal arithmetic.
//!
//! All three instructions carry the extend bit in, set C and X from the
//! decimal carry or borrow, clear Z only for a non-zero result, and leave N
//! and V alone.

use crate::decoder::Instruction;
use crate::ea::Operand;
use crate::encoding::HandlerId;
use crate::state::{SR_C, SR_X, SR_Z};
use crate::{Machine, OpSize, RegisterFile, Trap};

/// Adds two packed BCD bytes plus a carry-in. Returns the byte and the carry out.
#[must_use]
pub const fn bcd_add(dst: u8, src: u8, extend: bool) -> (u8, bool) {
    let mut low = (dst & 0x0F) + (src & 0x0F) + extend as u8;
    let mut carry_low = 0;
    if low > 9 {
        low -= 10;
        carry_low = 1;
    }
    let mut high = (dst >> 4) + (src >> 4) + carry_low;
    let mut carry = false;
    if high > 9 {
        high -= 10;
        carry = true;
    }
    (((high & 0x0F) << 4) | (low & 0x0F), carry)
}

/// Subtracts `src` and a borrow-in from `dst` in packed BCD.
#[must_use]
pub const fn bcd_sub(dst: u8, src: u8, extend: bool) -> (u8, bool) {
    let mut low = (dst & 0x0F) as i16 - (src & 0x0F) as i16 - extend as i16;
    let mut borrow_low = 0;
    if low < 0 {
        low += 10;
        borrow_low = 1;
    }
    let mut high = (dst >> 4) as i16 - (src >> 4) as i16 - borrow_low;
    let mut borrow = false;
    if high < 0 {
        high += 10;
        borrow = true;
    }
    ((((high as u8) & 0x0F) << 4) | ((low as u8) & 0x0F), borrow)
}

fn set_decimal_flags(regs: &mut RegisterFile, result: u8, carry: bool) {
    regs.set_flag(SR_C, carry);
    regs.set_flag(SR_X, carry);
    if result != 0 {
        regs.set_flag(SR_Z, false);
    }
}

/// `ABCD`, `SBCD` in register (`Dy,Dx`) or memory (`-(Ay),-(Ax)`) form.
pub fn execute_bcd(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let (ry, rx) = (instr.low_register(), instr.high_register());
    let (src_operand, dst_operand) = if instr.opcode & 0x0008 == 0 {
        (Operand::DataRegister(ry), Operand::DataRegister(rx))
    } else {
        let src = machine.registers.decrement_address(ry, OpSize::Byte);
        let dst = machine.registers.decrement_address(rx, OpSize::Byte);
        (Operand::Memory(src), Operand::Memory(dst))
    };
    let src = machine.read(src_operand, OpSize::Byte)? as u8;
    let dst = machine.read(dst_operand, OpSize::Byte)? as u8;
    let extend = machine.registers.flag(SR_X);
    let (result, carry) = if instr.handler == HandlerId::Abcd {
        bcd_add(dst, src, extend)
    } else {
        bcd_sub(dst, src, extend)
    };
    machine.write(dst_operand, OpSize::Byte, u32::from(result))?;
    set_decimal_flags(&mut machine.registers, result, carry);
    Ok(())
}

/// `NBCD`: decimal `0 - operand - X`.
pub fn execute_nbcd(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let operand = machine.destination(instr)?;
    let value = machine.read(operand, OpSize::Byte)? as u8;
    let extend = machine.registers.flag(SR_X);
    let (result, borrow) = bcd_sub(0, value, extend);
    machine.write(operand, OpSize::Byte, u32::from(result))?;
    set_decimal_flags(&mut machine.registers, result, borrow);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{bcd_add, bcd_sub};
    use crate::state::{SR_C, SR_N, SR_X, SR_Z};
    use crate::{Machine, MachineConfig, OpSize};

    fn machine_with(words: &[u16]) -> Machine {
        let mut machine = Machine::with_config(&MachineConfig {
            memory_bytes: 0x1_0000,
            trace_instructions: false,
        });
        machine.load_executable_words(words, 0x200, true).expect("fits");
        machine
    }

    #[test]
    fn digit_arithmetic() {
        assert_eq!(bcd_add(0x19, 0x28, false), (0x47, false));
        assert_eq!(bcd_add(0x99, 0x01, false), (0x00, true));
        assert_eq!(bcd_add(0x45, 0x54, true), (0x00, true));
        assert_eq!(bcd_sub(0x47, 0x28, false), (0x19, false));
        assert_eq!(bcd_sub(0x00, 0x01, false), (0x99, true));
        assert_eq!(bcd_sub(0x10, 0x00, true), (0x09, false));
    }

    #[test]
    fn abcd_register_form_with_extend() {
        // ABCD D1,D0
        let mut machine = machine_with(&[0xC101]);
        machine.registers.write_data(0, 0xAAAA_AA45, OpSize::Long);
        machine.registers.write_data(1, 0x54, OpSize::Long);
        machine.registers.set_ccr(SR_X | SR_Z | SR_N);
        machine.step().expect("executes");
        assert_eq!(machine.registers.read_data(0), 0xAAAA_AA00);
        assert_eq!(machine.registers.ccr(), SR_X | SR_Z | SR_N | SR_C);
    }

    #[test]
    fn sbcd_memory_form_predecrements() {
        // SBCD -(A1),-(A2)
        let mut machine = machine_with(&[0x8509]);
        machine.registers.write_address(1, 0x1001, OpSize::Long);
        machine.registers.write_address(2, 0x1101, OpSize::Long);
        machine.memory.write_byte(0x1000, 0x28).expect("in bounds");
        machine.memory.write_byte(0x1100, 0x47).expect("in bounds");
        machine.registers.set_ccr(SR_Z);
        machine.step().expect("executes");
        assert_eq!(machine.memory.read_byte(0x1100), Ok(0x19));
        assert_eq!(machine.registers.read_address(1), 0x1000);
        assert_eq!(machine.registers.ccr(), 0);
    }

    #[test]
    fn nbcd_negates_in_decimal() {
        // NBCD D0
        let mut machine = machine_with(&[0x4800]);
        machine.registers.write_data(0, 0x01, OpSize::Long);
        machine.step().expect("executes");
        assert_eq!(machine.registers.read_data(0), 0x99);
        assert_eq!(machine.registers.ccr(), SR_X | SR_C);
    }
}
