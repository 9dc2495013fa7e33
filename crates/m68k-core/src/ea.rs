//! Effective-address evaluation.
//!
//! [`resolve`] turns a decoded EA field into an [`Operand`] exactly once,
//! applying any post-increment or pre-decrement side effect at that point.
//! Read-modify-write handlers then read and write the same operand without
//! re-evaluating the field.

use crate::decoder::{AddressingMode, EaField};
use crate::{Memory, OpSize, RegisterFile, Trap};

/// A resolved operand location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Data register `Dn`.
    DataRegister(u8),
    /// Address register `An` (A7 is the active stack pointer).
    AddressRegister(u8),
    /// Byte address in memory.
    Memory(u32),
    /// Literal taken from the instruction stream.
    Immediate(u32),
}

impl Operand {
    /// Reads the operand, zero-extended from `size`.
    ///
    /// # Errors
    ///
    /// Propagates memory access traps.
    pub fn read(self, regs: &RegisterFile, memory: &Memory, size: OpSize) -> Result<u32, Trap> {
        match self {
            Self::DataRegister(n) => Ok(size.truncate(regs.read_data(n))),
            Self::AddressRegister(n) => Ok(size.truncate(regs.read_address(n))),
            Self::Memory(address) => memory.read_sized(address, size),
            Self::Immediate(value) => Ok(size.truncate(value)),
        }
    }

    /// Writes the low `size` bits of `value` to the operand.
    ///
    /// # Errors
    ///
    /// [`Trap::IllegalInstruction`] for an immediate; memory access traps
    /// otherwise.
    pub fn write(
        self,
        regs: &mut RegisterFile,
        memory: &mut Memory,
        size: OpSize,
        value: u32,
    ) -> Result<(), Trap> {
        match self {
            Self::DataRegister(n) => {
                regs.write_data(n, value, size);
                Ok(())
            }
            Self::AddressRegister(n) => {
                regs.write_address(n, value, size);
                Ok(())
            }
            Self::Memory(address) => memory.write_sized(address, size, value),
            Self::Immediate(_) => Err(Trap::IllegalInstruction),
        }
    }

    /// Memory address of the operand.
    ///
    /// # Errors
    ///
    /// [`Trap::IllegalInstruction`] when the operand is not in memory.
    pub const fn address(self) -> Result<u32, Trap> {
        match self {
            Self::Memory(address) => Ok(address),
            Self::DataRegister(_) | Self::AddressRegister(_) | Self::Immediate(_) => {
                Err(Trap::IllegalInstruction)
            }
        }
    }
}

/// Sign-extends a 16-bit displacement.
const fn displacement(word: u16) -> u32 {
    OpSize::Word.sign_extend(word as u32)
}

/// Evaluates a brief index extension word (`d8(base,Xn)`).
///
/// Bit 15 selects an address register, bits 14-12 the register, bit 11 a
/// long index (otherwise the sign-extended low word), bits 7-0 the
/// displacement.
#[must_use]
pub const fn indexed(regs: &RegisterFile, base: u32, word: u16) -> u32 {
    let reg = ((word >> 12) & 7) as u8;
    let raw = if word & 0x8000 == 0 {
        regs.read_data(reg)
    } else {
        regs.read_address(reg)
    };
    let index = if word & 0x0800 == 0 {
        OpSize::Word.sign_extend(raw)
    } else {
        raw
    };
    let disp = OpSize::Byte.sign_extend(word as u32);
    base.wrapping_add(index).wrapping_add(disp)
}

/// Resolves an EA field into an operand, applying auto-modify side effects.
///
/// # Errors
///
/// [`Trap::IllegalInstruction`] for an unassigned mode-7 field.
pub fn resolve(regs: &mut RegisterFile, ea: &EaField, size: OpSize) -> Result<Operand, Trap> {
    let mode = ea.mode().ok_or(Trap::IllegalInstruction)?;
    let word = ea.ext.word();
    let operand = match mode {
        AddressingMode::DataDirect(n) => Operand::DataRegister(n),
        AddressingMode::AddressDirect(n) => Operand::AddressRegister(n),
        AddressingMode::Indirect(n) => Operand::Memory(regs.read_address(n)),
        AddressingMode::PostIncrement(n) => {
            let address = regs.read_address(n);
            regs.increment_address(n, size);
            Operand::Memory(address)
        }
        AddressingMode::PreDecrement(n) => Operand::Memory(regs.decrement_address(n, size)),
        AddressingMode::Displacement(n) => {
            Operand::Memory(regs.read_address(n).wrapping_add(displacement(word)))
        }
        AddressingMode::Indexed(n) => Operand::Memory(indexed(regs, regs.read_address(n), word)),
        AddressingMode::AbsoluteShort => Operand::Memory(displacement(word)),
        AddressingMode::AbsoluteLong => Operand::Memory(ea.ext.long()),
        AddressingMode::PcDisplacement => {
            Operand::Memory(ea.ext.address().wrapping_add(displacement(word)))
        }
        AddressingMode::PcIndexed => Operand::Memory(indexed(regs, ea.ext.address(), word)),
        AddressingMode::Immediate => Operand::Immediate(match size {
            OpSize::Long => ea.ext.long(),
            OpSize::Word | OpSize::Byte => size.truncate(u32::from(word)),
        }),
    };
    Ok(operand)
}

/// Resolves a control-mode EA (`LEA`, `PEA`, `JMP`, `JSR`) to its address.
///
/// # Errors
///
/// [`Trap::IllegalInstruction`] for register, auto-modify and immediate modes.
pub fn control_address(regs: &mut RegisterFile, ea: &EaField) -> Result<u32, Trap> {
    match ea.mode() {
        Some(
            AddressingMode::Indirect(_)
            | AddressingMode::Displacement(_)
            | AddressingMode::Indexed(_)
            | AddressingMode::AbsoluteShort
            | AddressingMode::AbsoluteLong
            | AddressingMode::PcDisplacement
            | AddressingMode::PcIndexed,
        ) => resolve(regs, ea, OpSize::Long)?.address(),
        _ => Err(Trap::IllegalInstruction),
    }
}

#[cfg(test)]
mod tests {
    use super::{control_address, resolve, Operand};
    use crate::decoder::{EaField, ExtensionWords};
    use crate::{Memory, OpSize, RegisterFile, Trap};

    fn field(field: u8, address: u32, words: &[u16]) -> EaField {
        EaField {
            field,
            ext: ExtensionWords::new(address, words),
        }
    }

    fn registers() -> RegisterFile {
        let mut regs = RegisterFile::default();
        regs.write_address(0, 0x1000, OpSize::Long);
        regs.write_address(1, 0x2004, OpSize::Long);
        regs.write_data(2, 0xFFFF_FFFE, OpSize::Long);
        regs.set_usp(0x3000);
        regs
    }

    #[test]
    fn post_increment_applies_once_and_returns_old_address() {
        let mut regs = registers();
        let operand = resolve(&mut regs, &field(0x18, 0, &[]), OpSize::Word).expect("valid");
        assert_eq!(operand, Operand::Memory(0x1000));
        assert_eq!(regs.read_address(0), 0x1002);
    }

    #[test]
    fn pre_decrement_returns_new_address() {
        let mut regs = registers();
        let operand = resolve(&mut regs, &field(0x21, 0, &[]), OpSize::Byte).expect("valid");
        assert_eq!(operand, Operand::Memory(0x2003));
        let stack = resolve(&mut regs, &field(0x27, 0, &[]), OpSize::Byte).expect("valid");
        assert_eq!(stack, Operand::Memory(0x2FFE));
    }

    #[test]
    fn displacement_is_signed() {
        let mut regs = registers();
        let operand = resolve(&mut regs, &field(0x28, 0, &[0xFFF0]), OpSize::Word).expect("valid");
        assert_eq!(operand, Operand::Memory(0x0FF0));
    }

    #[test]
    fn index_word_selects_register_kind_and_width() {
        let mut regs = registers();
        // 4(A0,D2.W): D2 low word is -2.
        let data = resolve(&mut regs, &field(0x30, 0, &[0x2004]), OpSize::Word).expect("valid");
        assert_eq!(data, Operand::Memory(0x1002));
        // -1(A0,A1.L)
        let addr = resolve(&mut regs, &field(0x30, 0, &[0x98FF]), OpSize::Word).expect("valid");
        assert_eq!(addr, Operand::Memory(0x3003));
    }

    #[test]
    fn pc_relative_uses_extension_word_address() {
        let mut regs = registers();
        let operand = resolve(&mut regs, &field(0x3A, 0x402, &[0x0010]), OpSize::Word).expect("valid");
        assert_eq!(operand, Operand::Memory(0x412));
    }

    #[test]
    fn immediates_are_sized() {
        let mut regs = registers();
        let byte = resolve(&mut regs, &field(0x3C, 0, &[0x12FF]), OpSize::Byte).expect("valid");
        assert_eq!(byte, Operand::Immediate(0xFF));
        let long =
            resolve(&mut regs, &field(0x3C, 0, &[0x1234, 0x5678]), OpSize::Long).expect("valid");
        assert_eq!(long, Operand::Immediate(0x1234_5678));
    }

    #[test]
    fn unassigned_field_and_immediate_writes_are_illegal() {
        let mut regs = registers();
        let mut memory = Memory::new(0x10);
        assert_eq!(
            resolve(&mut regs, &field(0x3D, 0, &[]), OpSize::Word),
            Err(Trap::IllegalInstruction)
        );
        assert_eq!(
            Operand::Immediate(1).write(&mut regs, &mut memory, OpSize::Word, 2),
            Err(Trap::IllegalInstruction)
        );
    }

    #[test]
    fn control_address_rejects_auto_modify_modes() {
        let mut regs = registers();
        assert_eq!(control_address(&mut regs, &field(0x10, 0, &[])), Ok(0x1000));
        assert_eq!(
            control_address(&mut regs, &field(0x18, 0, &[])),
            Err(Trap::IllegalInstruction)
        );
        assert_eq!(regs.read_address(0), 0x1000);
        assert_eq!(
            control_address(&mut regs, &field(0x00, 0, &[])),
            Err(Trap::IllegalInstruction)
        );
    }
}
