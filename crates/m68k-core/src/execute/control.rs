//! Program flow: branches, calls, returns, traps, and processor control.

use super::helpers::word_displacement;
use crate::decoder::Instruction;
use crate::encoding::HandlerId;
use crate::state::{Condition, SR_N, SR_S, SR_V};
use crate::{Machine, OpSize, RunState, Trap};

/// Branch displacement: the opcode's low byte, or the extension word when that byte is zero.
const fn branch_displacement(instr: &Instruction) -> u32 {
    match instr.opcode & 0xFF {
        0 => word_displacement(instr),
        byte => OpSize::Byte.sign_extend(byte as u32),
    }
}

/// `BRA`, `BSR`, `Bcc`.
pub fn execute_branch(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let displacement = branch_displacement(instr);
    match instr.handler {
        HandlerId::Bsr => {
            machine.push_long(instr.next_address())?;
            machine.call_depth += 1;
            machine.branch_to(instr, displacement);
        }
        HandlerId::Bcc => {
            let condition = Condition::from_opcode(instr.opcode);
            if machine.registers.evaluate_condition(condition) {
                machine.branch_to(instr, displacement);
            }
        }
        _ => machine.branch_to(instr, displacement),
    }
    Ok(())
}

/// `DBcc Dn,<label>`: exits on the condition, otherwise decrements and loops until -1.
pub fn execute_dbcc(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let condition = Condition::from_opcode(instr.opcode);
    if machine.registers.evaluate_condition(condition) {
        return Ok(());
    }
    let dn = instr.low_register();
    let counter = OpSize::Word.truncate(machine.registers.read_data(dn).wrapping_sub(1));
    machine.registers.write_data(dn, counter, OpSize::Word);
    if counter != 0xFFFF {
        machine.branch_to(instr, word_displacement(instr));
    }
    Ok(())
}

/// `JMP`, `JSR`.
pub fn execute_jump(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let target = machine.control(instr.src.as_ref())?;
    if instr.handler == HandlerId::Jsr {
        machine.push_long(instr.next_address())?;
        machine.call_depth += 1;
    }
    machine.registers.set_pc(target);
    Ok(())
}

/// `RTS`. Returning with no call outstanding finishes the program.
pub fn execute_rts(machine: &mut Machine, _instr: &Instruction) -> Result<(), Trap> {
    if machine.call_depth == 0 {
        machine.run_state = RunState::Finished;
        return Ok(());
    }
    let pc = machine.pop_long()?;
    machine.registers.set_pc(pc);
    machine.call_depth -= 1;
    Ok(())
}

/// `RTR`: restores CCR then PC.
pub fn execute_rtr(machine: &mut Machine, _instr: &Instruction) -> Result<(), Trap> {
    let ccr = machine.pop_word()?;
    let pc = machine.pop_long()?;
    machine.registers.set_ccr(ccr);
    machine.registers.set_pc(pc);
    machine.call_depth = machine.call_depth.saturating_sub(1);
    Ok(())
}

/// `RTE` (privileged): pops SR then PC from the supervisor stack.
pub fn execute_rte(machine: &mut Machine, _instr: &Instruction) -> Result<(), Trap> {
    machine.require_supervisor()?;
    let sr = machine.pop_word()?;
    let pc = machine.pop_long()?;
    machine.registers.set_sr(sr);
    machine.registers.set_pc(pc);
    Ok(())
}

/// `TRAP #n`, `TRAPV`, `ILLEGAL`.
pub fn execute_trap(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    match instr.handler {
        HandlerId::Trap => Err(Trap::Explicit((instr.opcode & 0x0F) as u8)),
        HandlerId::Trapv if machine.registers.flag(SR_V) => Err(Trap::TrapvOverflow),
        HandlerId::Trapv => Ok(()),
        _ => Err(Trap::IllegalInstruction),
    }
}

/// `CHK <ea>,Dn`: traps when `Dn.w` is negative or above the bound.
pub fn execute_chk(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    let src = machine.source(instr)?;
    let bound = OpSize::Word.sign_extend(machine.read(src, OpSize::Word)?) as i32;
    let dn = machine.registers.read_data(instr.high_register());
    let value = OpSize::Word.sign_extend(dn) as i32;
    if value < 0 {
        machine.registers.set_flag(SR_N, true);
        return Err(Trap::ChkBounds);
    }
    if value > bound {
        machine.registers.set_flag(SR_N, false);
        return Err(Trap::ChkBounds);
    }
    Ok(())
}

/// `STOP #imm` (privileged): loads SR and halts until the host resumes.
pub fn execute_stop(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    machine.require_supervisor()?;
    let sr = instr.extension.word();
    if sr & SR_S == 0 {
        return Err(Trap::PrivilegeViolation);
    }
    machine.registers.set_sr(sr);
    machine.run_state = RunState::Stopped;
    Ok(())
}

/// `RESET` (privileged). There are no external devices to reset.
pub fn execute_reset(machine: &mut Machine, _instr: &Instruction) -> Result<(), Trap> {
    machine.require_supervisor()
}

#[cfg(test)]
mod tests {
    use crate::state::{SR_C, SR_N, SR_S, SR_V, SR_X, SR_Z};
    use crate::{Machine, MachineConfig, MachineError, OpSize, RunBoundary, RunState, Trap};

    fn machine_with(words: &[u16]) -> Machine {
        let mut machine = Machine::with_config(&MachineConfig {
            memory_bytes: 0x1_0000,
            trace_instructions: false,
        });
        machine.load_executable_words(words, 0x200, true).expect("fits");
        machine.registers.set_usp(0x8000);
        machine
    }

    fn trap_of(machine: &mut Machine) -> Option<Trap> {
        match machine.step() {
            Err(MachineError::Trap { trap }) => Some(trap),
            _ => None,
        }
    }

    #[test]
    fn short_and_word_branches() {
        // BRA.S +4 ; (skipped) ; BNE.W -6 taken when Z clear
        let mut machine = machine_with(&[0x6004, 0x4E71, 0x4E71, 0x6600, 0xFFFA]);
        machine.step().expect("executes");
        assert_eq!(machine.registers.pc(), 0x206);
        machine.step().expect("executes");
        assert_eq!(machine.registers.pc(), 0x202);
    }

    #[test]
    fn conditional_branch_falls_through() {
        // BEQ.S +4
        let mut machine = machine_with(&[0x6704]);
        machine.step().expect("executes");
        assert_eq!(machine.registers.pc(), 0x202);
    }

    #[test]
    fn dbra_counts_down_to_minus_one() {
        // MOVEQ #2,D0 ; loop: DBRA D0,loop
        let mut machine = machine_with(&[0x7002, 0x51C8, 0xFFFE]);
        let outcome = machine.run_with_limit(Some(10)).expect("runs");
        assert_eq!(outcome.steps, 4);
        assert_eq!(outcome.boundary, RunBoundary::EndOfCode);
        assert_eq!(machine.registers.read_data(0), 0x0000_FFFF);
    }

    #[test]
    fn dbcc_exits_when_condition_true() {
        // DBEQ D1,* with Z set
        let mut machine = machine_with(&[0x57C9, 0xFFFE]);
        machine.registers.write_data(1, 5, OpSize::Long);
        machine.registers.set_ccr(SR_Z);
        machine.step().expect("executes");
        assert_eq!(machine.registers.read_data(1), 5);
        assert_eq!(machine.registers.pc(), 0x204);
    }

    #[test]
    fn bsr_and_rts_track_call_depth() {
        // BSR.S +2 ; RTS(outer) ; sub: RTS
        let mut machine = machine_with(&[0x6102, 0x4E75, 0x4E75]);
        machine.step().expect("executes");
        assert_eq!(machine.registers.pc(), 0x204);
        assert_eq!(machine.call_depth(), 1);
        assert_eq!(machine.memory.read_long(0x7FFC), Ok(0x202));
        machine.step().expect("executes");
        assert_eq!(machine.registers.pc(), 0x202);
        assert_eq!(machine.call_depth(), 0);
        machine.step().expect("executes");
        assert_eq!(machine.run_state(), RunState::Finished);
    }

    #[test]
    fn jsr_pushes_address_after_extension_words() {
        // JSR $0000020A.L ; NOP ; NOP ; sub: RTS
        let mut machine = machine_with(&[0x4EB9, 0x0000, 0x020A, 0x4E71, 0x4E71, 0x4E75]);
        machine.step().expect("executes");
        assert_eq!(machine.registers.pc(), 0x20A);
        assert_eq!(machine.memory.read_long(0x7FFC), Ok(0x206));
    }

    #[test]
    fn jmp_through_address_register() {
        // JMP (A0)
        let mut machine = machine_with(&[0x4ED0]);
        machine.registers.write_address(0, 0x300, OpSize::Long);
        machine.step().expect("executes");
        assert_eq!(machine.registers.pc(), 0x300);
    }

    #[test]
    fn rtr_restores_condition_codes() {
        let mut machine = machine_with(&[0x4E77]);
        machine.push_long(0x0400).expect("aligned");
        machine.push_word(0xFF1F).expect("aligned");
        machine.step().expect("executes");
        assert_eq!(machine.registers.pc(), 0x400);
        assert_eq!(machine.registers.sr(), SR_X | SR_N | SR_Z | SR_V | SR_C);
        assert_eq!(machine.registers.sp(), 0x8000);
    }

    #[test]
    fn rte_drops_to_user_mode() {
        let mut machine = machine_with(&[0x4E73]);
        machine.registers.set_sr(SR_S);
        machine.registers.set_ssp(0x9000);
        machine.push_long(0x0300).expect("aligned");
        machine.push_word(SR_Z).expect("aligned");
        machine.step().expect("executes");
        assert_eq!(machine.registers.pc(), 0x300);
        assert_eq!(machine.registers.sr(), SR_Z);
        assert_eq!(machine.registers.ssp(), 0x9000);
        assert_eq!(machine.registers.sp(), 0x8000);
    }

    #[test]
    fn traps_carry_their_vectors() {
        let mut machine = machine_with(&[0x4E45, 0x4E76, 0x4E76, 0x4AFC]);
        assert_eq!(trap_of(&mut machine), Some(Trap::Explicit(5)));
        machine.step().expect("no overflow");
        machine.registers.set_ccr(SR_V);
        assert_eq!(trap_of(&mut machine), Some(Trap::TrapvOverflow));
        assert_eq!(trap_of(&mut machine), Some(Trap::IllegalInstruction));
    }

    #[test]
    fn chk_bounds() {
        // CHK D1,D0
        let cases = [
            (5, None, false),
            (0xFFFF, Some(Trap::ChkBounds), true),
            (11, Some(Trap::ChkBounds), false),
        ];
        for (d0, expected, n) in cases {
            let mut machine = machine_with(&[0x4181]);
            machine.registers.write_data(0, d0, OpSize::Long);
            machine.registers.write_data(1, 10, OpSize::Long);
            machine.registers.set_ccr(if n { 0 } else { SR_N });
            if expected.is_none() {
                machine.step().expect("in bounds");
            } else {
                assert_eq!(trap_of(&mut machine), expected);
                assert_eq!(machine.registers.flag(SR_N), n);
            }
        }
    }

    #[test]
    fn stop_loads_sr_and_halts() {
        let mut machine = machine_with(&[0x4E72, 0x2704, 0x4E71]);
        machine.registers.set_sr(SR_S);
        let outcome = machine.run().expect("runs");
        assert_eq!(outcome.boundary, RunBoundary::Stopped);
        assert_eq!(machine.registers.sr(), 0x2704);
        assert_eq!(machine.registers.pc(), 0x204);
    }

    #[test]
    fn stop_without_supervisor_bit_in_operand_is_privileged() {
        let mut machine = machine_with(&[0x4E72, 0x0000]);
        machine.registers.set_sr(SR_S);
        assert_eq!(trap_of(&mut machine), Some(Trap::PrivilegeViolation));
        assert_eq!(machine.run_state(), RunState::Running);
    }

    #[test]
    fn reset_is_privileged() {
        let mut machine = machine_with(&[0x4E70]);
        assert_eq!(trap_of(&mut machine), Some(Trap::PrivilegeViolation));
    }
}
