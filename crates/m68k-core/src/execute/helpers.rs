//! Operand plumbing shared by the instruction families.

use crate::decoder::{EaField, Instruction};
use crate::ea::{self, Operand};
use crate::{Machine, OpSize, Trap};

impl Machine {
    /// Resolves an EA field that the handler requires.
    pub(crate) fn resolve(&mut self, ea: Option<&EaField>, size: OpSize) -> Result<Operand, Trap> {
        let ea = ea.ok_or(Trap::IllegalInstruction)?;
        ea::resolve(&mut self.registers, ea, size)
    }

    /// Resolves the instruction's source EA at its operation size.
    pub(crate) fn source(&mut self, instr: &Instruction) -> Result<Operand, Trap> {
        self.resolve(instr.src.as_ref(), instr.size)
    }

    /// Resolves the instruction's destination EA at its operation size.
    pub(crate) fn destination(&mut self, instr: &Instruction) -> Result<Operand, Trap> {
        self.resolve(instr.dst.as_ref(), instr.size)
    }

    /// Resolves a control-mode EA to an address.
    pub(crate) fn control(&mut self, ea: Option<&EaField>) -> Result<u32, Trap> {
        let ea = ea.ok_or(Trap::IllegalInstruction)?;
        ea::control_address(&mut self.registers, ea)
    }

    pub(crate) fn read(&self, operand: Operand, size: OpSize) -> Result<u32, Trap> {
        operand.read(&self.registers, &self.memory, size)
    }

    pub(crate) fn write(&mut self, operand: Operand, size: OpSize, value: u32) -> Result<(), Trap> {
        operand.write(&mut self.registers, &mut self.memory, size, value)
    }

    pub(crate) const fn require_supervisor(&self) -> Result<(), Trap> {
        if self.registers.is_supervisor() {
            Ok(())
        } else {
            Err(Trap::PrivilegeViolation)
        }
    }

    /// Sets the program counter relative to the word after the opcode.
    pub(crate) const fn branch_to(&mut self, instr: &Instruction, displacement: u32) {
        self.registers
            .set_pc(instr.address.wrapping_add(2).wrapping_add(displacement));
    }
}

/// Sign-extended 16-bit displacement carried by the handler's extension word.
pub const fn word_displacement(instr: &Instruction) -> u32 {
    OpSize::Word.sign_extend(instr.extension.word() as u32)
}

/// Destination operand of the register/EA ALU forms.
///
/// Opcode bit 8 clear means `<ea> op Dn -> Dn`; set means `Dn op <ea> -> <ea>`.
pub fn alu_operands(
    machine: &mut Machine,
    instr: &Instruction,
) -> Result<(Operand, Operand), Trap> {
    let ea = machine.destination(instr)?;
    let dn = Operand::DataRegister(instr.high_register());
    if instr.opcode & 0x0100 == 0 {
        Ok((ea, dn))
    } else {
        Ok((dn, ea))
    }
}
