use core::fmt;

use super::flags::{Condition, CCR_MASK, SR_FLAG_NAMES, SR_S, SR_WRITE_MASK};
use crate::{CpuState, OpSize};

/// Number of data registers (`D0..D7`).
pub const DATA_REGISTER_COUNT: usize = 8;
/// Number of general address registers (`A0..A6`); `A7` is the active stack pointer.
pub const ADDRESS_REGISTER_COUNT: usize = 7;
/// Register index that aliases the active stack pointer.
pub const STACK_POINTER_INDEX: u8 = 7;

/// Full programmer-visible register state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    d: [u32; DATA_REGISTER_COUNT],
    a: [u32; ADDRESS_REGISTER_COUNT],
    usp: u32,
    ssp: u32,
    pc: u32,
    sr: u16,
}

/// Merges the low `size` bits of `value` into `current`.
const fn merge_sized(current: u32, value: u32, size: OpSize) -> u32 {
    (current & !size.mask()) | (value & size.mask())
}

impl RegisterFile {
    /// Reads a full data register. Only the low three bits of `n` are used.
    #[must_use]
    pub const fn read_data(&self, n: u8) -> u32 {
        self.d[(n & 7) as usize]
    }

    /// Writes the low `size` bits of a data register, keeping the rest.
    pub const fn write_data(&mut self, n: u8, value: u32, size: OpSize) {
        let slot = (n & 7) as usize;
        self.d[slot] = merge_sized(self.d[slot], value, size);
    }

    /// Reads a full address register; `A7` resolves to USP or SSP per the S bit.
    #[must_use]
    pub const fn read_address(&self, n: u8) -> u32 {
        let n = n & 7;
        if n == STACK_POINTER_INDEX {
            self.sp()
        } else {
            self.a[n as usize]
        }
    }

    /// Writes the low `size` bits of an address register.
    pub const fn write_address(&mut self, n: u8, value: u32, size: OpSize) {
        let n = n & 7;
        let merged = merge_sized(self.read_address(n), value, size);
        if n == STACK_POINTER_INDEX {
            self.set_sp(merged);
        } else {
            self.a[n as usize] = merged;
        }
    }

    /// Adds the operand size to an address register and returns the new value.
    ///
    /// Byte steps on `A7` move by two so the stack stays word aligned.
    pub const fn increment_address(&mut self, n: u8, size: OpSize) -> u32 {
        let value = self
            .read_address(n)
            .wrapping_add(Self::auto_step(n, size));
        self.write_address(n, value, OpSize::Long);
        value
    }

    /// Subtracts the operand size from an address register and returns the new value.
    pub const fn decrement_address(&mut self, n: u8, size: OpSize) -> u32 {
        let value = self
            .read_address(n)
            .wrapping_sub(Self::auto_step(n, size));
        self.write_address(n, value, OpSize::Long);
        value
    }

    const fn auto_step(n: u8, size: OpSize) -> u32 {
        if n & 7 == STACK_POINTER_INDEX && matches!(size, OpSize::Byte) {
            2
        } else {
            size.bytes()
        }
    }

    /// Active stack pointer.
    #[must_use]
    pub const fn sp(&self) -> u32 {
        if self.is_supervisor() {
            self.ssp
        } else {
            self.usp
        }
    }

    /// Writes the active stack pointer.
    pub const fn set_sp(&mut self, value: u32) {
        if self.is_supervisor() {
            self.ssp = value;
        } else {
            self.usp = value;
        }
    }

    /// User stack pointer regardless of mode.
    #[must_use]
    pub const fn usp(&self) -> u32 {
        self.usp
    }

    /// Writes the user stack pointer.
    pub const fn set_usp(&mut self, value: u32) {
        self.usp = value;
    }

    /// Supervisor stack pointer regardless of mode.
    #[must_use]
    pub const fn ssp(&self) -> u32 {
        self.ssp
    }

    /// Writes the supervisor stack pointer.
    pub const fn set_ssp(&mut self, value: u32) {
        self.ssp = value;
    }

    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Full status register.
    #[must_use]
    pub const fn sr(&self) -> u16 {
        self.sr
    }

    /// Writes the status register; unimplemented bits read back as zero.
    pub const fn set_sr(&mut self, value: u16) {
        self.sr = value & SR_WRITE_MASK;
    }

    /// Condition-code byte (X, N, Z, V, C).
    #[must_use]
    pub const fn ccr(&self) -> u16 {
        self.sr & CCR_MASK
    }

    /// Replaces the condition codes, keeping the system byte.
    pub const fn set_ccr(&mut self, value: u16) {
        self.sr = (self.sr & !CCR_MASK) | (value & CCR_MASK);
    }

    /// Returns `true` when every bit of `flag` is set.
    #[must_use]
    pub const fn flag(&self, flag: u16) -> bool {
        self.sr & flag == flag
    }

    /// Sets or clears an SR bit.
    pub const fn set_flag(&mut self, flag: u16, enabled: bool) {
        if enabled {
            self.sr |= flag & SR_WRITE_MASK;
        } else {
            self.sr &= !flag;
        }
    }

    /// Returns `true` in supervisor mode.
    #[must_use]
    pub const fn is_supervisor(&self) -> bool {
        self.sr & SR_S != 0
    }

    /// Evaluates a condition code against the current flags.
    #[must_use]
    pub const fn evaluate_condition(&self, condition: Condition) -> bool {
        condition.evaluate(self.sr)
    }

    /// Captures every register into a fully populated [`CpuState`].
    #[must_use]
    pub fn snapshot(&self) -> CpuState {
        CpuState {
            d: self.d.map(Some),
            a: self.a.map(Some),
            usp: Some(self.usp),
            ssp: Some(self.ssp),
            pc: Some(self.pc),
            sr: Some(self.sr),
        }
    }

    /// Names of the SR bits that are currently set, most significant first.
    pub fn set_flag_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        SR_FLAG_NAMES
            .iter()
            .filter(|(bit, _)| self.sr & bit != 0)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, value) in self.d.iter().enumerate() {
            writeln!(f, "D{n}: 0x{value:08X} ({value})")?;
        }
        for n in 0..=STACK_POINTER_INDEX {
            let value = self.read_address(n);
            writeln!(f, "A{n}: 0x{value:08X} ({value})")?;
        }
        writeln!(f, "USP: 0x{:08X} ({})", self.usp, self.usp)?;
        writeln!(f, "SSP: 0x{:08X} ({})", self.ssp, self.ssp)?;
        writeln!(f, "PC: 0x{:08X} ({})", self.pc, self.pc)?;
        let names: Vec<&str> = self.set_flag_names().collect();
        write!(f, "Status Register: 0x{:04X} ({})", self.sr, names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::{RegisterFile, DATA_REGISTER_COUNT};
    use crate::state::{Condition, SR_C, SR_N, SR_S, SR_T, SR_X, SR_Z};
    use crate::OpSize;

    fn fixture() -> RegisterFile {
        let mut regs = RegisterFile::default();
        for n in 0..7u8 {
            regs.write_address(n, 0x100 * (u32::from(n) + 1), OpSize::Long);
        }
        for n in 0..8u8 {
            regs.write_data(n, 0x11 * (u32::from(n) + 1), OpSize::Long);
        }
        regs.set_usp(0x2000);
        regs.set_ssp(0x3000);
        regs.set_pc(0x4000);
        regs
    }

    #[test]
    fn sized_data_writes_touch_only_low_bits() {
        let mut regs = RegisterFile::default();
        regs.write_data(3, 0x1234_5678, OpSize::Long);
        regs.write_data(3, 0xAB, OpSize::Byte);
        assert_eq!(regs.read_data(3), 0x1234_56AB);
        regs.write_data(3, 0xFFFF_CDEF, OpSize::Word);
        assert_eq!(regs.read_data(3), 0x1234_CDEF);
        regs.write_data(3, 0x0000_0001, OpSize::Long);
        assert_eq!(regs.read_data(3), 1);
    }

    #[test]
    fn data_registers_are_independent() {
        let regs = fixture();
        for n in 0..DATA_REGISTER_COUNT as u8 {
            assert_eq!(regs.read_data(n), 0x11 * (u32::from(n) + 1));
        }
    }

    #[test]
    fn a7_follows_supervisor_bit() {
        let mut regs = fixture();
        assert_eq!(regs.read_address(7), 0x2000);

        regs.set_flag(SR_S, true);
        assert_eq!(regs.read_address(7), 0x3000);
        regs.write_address(7, 0x3100, OpSize::Long);
        assert_eq!(regs.ssp(), 0x3100);
        assert_eq!(regs.usp(), 0x2000);

        regs.set_flag(SR_S, false);
        assert_eq!(regs.sp(), 0x2000);
    }

    #[test]
    fn auto_modify_returns_new_address() {
        let mut regs = fixture();
        assert_eq!(regs.increment_address(0, OpSize::Long), 0x104);
        assert_eq!(regs.decrement_address(1, OpSize::Word), 0x1FE);
        assert_eq!(regs.increment_address(2, OpSize::Byte), 0x301);
        assert_eq!(regs.read_address(0), 0x104);
    }

    #[test]
    fn byte_steps_on_stack_pointer_keep_alignment() {
        let mut regs = fixture();
        assert_eq!(regs.decrement_address(7, OpSize::Byte), 0x1FFE);
        assert_eq!(regs.increment_address(7, OpSize::Byte), 0x2000);
    }

    #[test]
    fn ccr_writes_preserve_system_byte() {
        let mut regs = RegisterFile::default();
        regs.set_sr(SR_S | SR_Z);
        regs.set_ccr(0xFF);
        assert_eq!(regs.sr(), SR_S | 0x1F);
        assert_eq!(regs.ccr(), 0x1F);
    }

    #[test]
    fn sr_writes_drop_unimplemented_bits() {
        let mut regs = RegisterFile::default();
        regs.set_sr(0xFFFF);
        assert_eq!(regs.sr(), 0xA71F);
        assert!(regs.flag(SR_T));
        assert!(regs.is_supervisor());
    }

    #[test]
    fn condition_evaluation_reads_current_flags() {
        let mut regs = RegisterFile::default();
        regs.set_flag(SR_Z, true);
        assert!(regs.evaluate_condition(Condition::Equal));
        assert!(!regs.evaluate_condition(Condition::NotEqual));
        regs.set_flag(SR_Z, false);
        regs.set_flag(SR_C, true);
        assert!(regs.evaluate_condition(Condition::LowerOrSame));
    }

    #[test]
    fn snapshot_captures_every_register() {
        let regs = fixture();
        let state = regs.snapshot();
        assert_eq!(state.d[7], Some(0x88));
        assert_eq!(state.a[6], Some(0x700));
        assert_eq!(state.usp, Some(0x2000));
        assert_eq!(state.ssp, Some(0x3000));
        assert_eq!(state.pc, Some(0x4000));
        assert_eq!(state.sr, Some(0));
    }

    #[test]
    fn display_lists_registers_and_flag_names() {
        let mut regs = fixture();
        regs.set_flag(SR_X | SR_N, true);
        let text = regs.to_string();
        assert!(text.starts_with("D0: 0x00000011 (17)\n"));
        assert!(text.contains("A7: 0x00002000 (8192)\n"));
        assert!(text.contains("PC: 0x00004000 (16384)\n"));
        assert!(text.ends_with("Status Register: 0x0018 (Extend Negative)"));
    }
}
