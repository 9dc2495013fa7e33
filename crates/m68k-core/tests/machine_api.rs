//! Host-surface behavior: loading, running, snapshots, dumps, and reset.

#![allow(clippy::pedantic, clippy::nursery, clippy::unreadable_literal)]

use m68k_core::state::{SR_S, SR_X, SR_Z};
use m68k_core::{
    CpuState, Machine, MachineConfig, MachineError, RunBoundary, RunState, StepOutcome, Trap,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn small_machine() -> Machine {
    Machine::with_config(&MachineConfig {
        memory_bytes: 0x1_0000,
        trace_instructions: false,
    })
}

#[test]
fn load_data_merges_unless_cleared() {
    let mut machine = small_machine();
    machine.load_data(&[1, 2, 3, 4], 0x100, false).unwrap();
    machine.load_data(&[9], 0x102, false).unwrap();
    assert_eq!(machine.dump_memory(0x100, 4).unwrap(), &[1, 2, 9, 4]);

    machine.load_data(&[7], 0x200, true).unwrap();
    assert_eq!(machine.dump_memory(0x100, 4).unwrap(), &[0, 0, 0, 0]);
    assert_eq!(machine.dump_memory(0x200, 1).unwrap(), &[7]);
}

#[test]
fn load_data_leaves_program_counter() {
    let mut machine = small_machine();
    machine.load_executable_words(&[0x4E71], 0x400, true).unwrap();
    machine.load_data_words(&[0xBEEF], 0x800, false).unwrap();

    assert_eq!(machine.registers.pc(), 0x400);
    assert_eq!(machine.code_range(), (0x400, 0x402));
    assert_eq!(machine.dump_memory(0x800, 2).unwrap(), &[0xBE, 0xEF]);
}

#[test]
fn data_load_past_capacity_is_rejected() {
    let mut machine = small_machine();
    let error = machine.load_data(&[0; 4], 0xFFFE, false).unwrap_err();
    assert!(matches!(error, MachineError::LoadOutOfRange { .. }));
    assert_eq!(machine.dump_memory(0xFFFE, 2).unwrap(), &[0, 0]);
}

#[test]
fn dump_outside_memory_fails() {
    let machine = small_machine();
    assert!(machine.dump_memory(0xFFF0, 0x10).is_ok());
    assert_eq!(
        machine.dump_memory(0xFFF0, 0x11).unwrap_err(),
        MachineError::RangeOutOfBounds {
            address: 0xFFF0,
            len: 0x11,
        }
    );
}

#[test]
fn truncated_instruction_reports_past_end_of_code() {
    // MOVE.W #imm,D0 with its immediate missing
    let mut machine = small_machine();
    machine.load_executable_words(&[0x303C], 0x1000, true).unwrap();

    let error = machine.step().unwrap_err();
    assert_eq!(error, MachineError::PastEndOfCode { pc: 0x1002 });
    assert_eq!(error.trap(), None);
    assert_eq!(machine.registers.pc(), 0x1000);
}

#[test]
fn stop_halts_until_resumed() {
    // STOP #$2004 / MOVEQ #1,D0
    let mut machine = small_machine();
    machine
        .load_executable_words(&[0x4E72, 0x2004, 0x7001], 0x1000, true)
        .unwrap();
    machine.set_cpu_state(&CpuState {
        sr: Some(SR_S),
        ssp: Some(0x8000),
        ..CpuState::default()
    });

    let outcome = machine.run().unwrap();
    assert_eq!(outcome.boundary, RunBoundary::Stopped);
    assert_eq!(outcome.steps, 1);
    assert_eq!(machine.registers.sr(), SR_S | SR_Z);
    assert_eq!(machine.registers.pc(), 0x1004);
    assert_eq!(machine.step().unwrap(), StepOutcome::Stopped);

    machine.resume();
    assert_eq!(machine.run_state(), RunState::Running);
    let outcome = machine.run().unwrap();
    assert_eq!(outcome.boundary, RunBoundary::EndOfCode);
    assert_eq!(machine.registers.read_data(0), 1);
}

#[test]
fn resume_does_not_restart_finished_program() {
    let mut machine = small_machine();
    machine.load_executable_words(&[0x4E75], 0x1000, true).unwrap();
    machine.run().unwrap();

    machine.resume();
    assert_eq!(machine.run_state(), RunState::Finished);
    assert_eq!(machine.step().unwrap(), StepOutcome::Finished);
}

#[test]
fn snapshot_round_trip_and_overlay() {
    let mut machine = small_machine();
    let mut seed = CpuState::default();
    seed.d[3] = Some(0x3333);
    seed.a[2] = Some(0x2222);
    seed.usp = Some(0x4000);
    seed.sr = Some(SR_X);
    machine.set_cpu_state(&seed);

    let full = machine.cpu_state();
    assert_eq!(full.d[3], Some(0x3333));
    assert_eq!(full.d[0], Some(0));
    assert_eq!(full.a[2], Some(0x2222));
    assert_eq!(full.usp, Some(0x4000));
    assert_eq!(full.sr, Some(SR_X));
    assert!(!full.is_empty());

    let mut top = CpuState::default();
    top.d[3] = Some(0x9999);
    let merged = full.overlay(&top);
    assert_eq!(merged.d[3], Some(0x9999));
    assert_eq!(merged.a[2], Some(0x2222));

    let mut other = small_machine();
    other.set_cpu_state(&merged);
    assert_eq!(other.cpu_state(), merged);
}

#[test]
fn empty_snapshot_changes_nothing() {
    let mut machine = small_machine();
    machine.registers.set_pc(0x1234);
    let before = machine.cpu_state();
    machine.set_cpu_state(&CpuState::default());
    assert_eq!(machine.cpu_state(), before);
    assert!(CpuState::default().is_empty());
}

#[test]
fn state_dump_lists_registers_and_flags() {
    let mut machine = small_machine();
    let mut state = CpuState {
        sr: Some(SR_S | SR_Z),
        pc: Some(0x1000),
        ..CpuState::default()
    };
    state.d[0] = Some(42);
    machine.set_cpu_state(&state);

    let dump = machine.dump_state();
    assert!(dump.contains("D0: 0x0000002A (42)"));
    assert!(dump.contains("PC: 0x00001000 (4096)"));
    assert!(dump.contains("Status Register: 0x2004 (Supervisor Zero)"));
}

#[test]
fn cycles_accumulate_across_runs() {
    let mut machine = small_machine();
    machine
        .load_executable_words(&[0x4E71, 0x4E71, 0x4E71], 0x1000, true)
        .unwrap();

    let first = machine.run_with_limit(Some(2)).unwrap();
    assert_eq!(first.boundary, RunBoundary::StepLimit);
    let second = machine.run().unwrap();
    assert_eq!(second.steps, 1);
    assert!(first.cycles > 0);
    assert_eq!(machine.cycles(), first.cycles + second.cycles);
}

#[test]
fn trap_stops_run_and_reports_vector() {
    // MOVEQ #1,D0 / TRAP #3 / MOVEQ #2,D0
    let mut machine = small_machine();
    machine
        .load_executable_words(&[0x7001, 0x4E43, 0x7002], 0x1000, true)
        .unwrap();

    let error = machine.run().unwrap_err();
    assert_eq!(error.trap(), Some(Trap::Explicit(3)));
    assert_eq!(error.to_string(), "trap #3 (vector 35)");
    assert_eq!(machine.registers.read_data(0), 1);
    assert_eq!(machine.registers.pc(), 0x1004);
}

#[test]
fn reload_after_finish_runs_again() {
    let mut machine = small_machine();
    machine.load_executable_words(&[0x4E75], 0x1000, true).unwrap();
    assert_eq!(machine.run().unwrap().boundary, RunBoundary::Finished);

    machine
        .load_executable_words(&[0x7005, 0x4E75], 0x2000, false)
        .unwrap();
    assert_eq!(machine.run_state(), RunState::Running);
    let outcome = machine.run().unwrap();
    assert_eq!(outcome.boundary, RunBoundary::Finished);
    assert_eq!(machine.registers.read_data(0), 5);
    assert_eq!(machine.dump_memory(0x1000, 2).unwrap(), &[0x4E, 0x75]);
}

#[test]
fn reset_returns_to_power_on_state() {
    let mut machine = small_machine();
    machine
        .load_executable_words(&[0x7005, 0x4E71], 0x1000, true)
        .unwrap();
    machine.run().unwrap();

    machine.reset();
    assert_eq!(machine.registers.read_data(0), 0);
    assert_eq!(machine.registers.pc(), 0);
    assert_eq!(machine.cycles(), 0);
    assert_eq!(machine.code_range(), (0, 0));
    assert_eq!(machine.dump_memory(0x1000, 4).unwrap(), &[0, 0, 0, 0]);
}

#[test]
fn misaligned_stack_push_leaves_pointer() {
    let mut machine = small_machine();
    machine.set_cpu_state(&CpuState {
        usp: Some(0x4001),
        ..CpuState::default()
    });
    assert_eq!(machine.push_long(1), Err(Trap::AddressError));
    assert_eq!(machine.registers.usp(), 0x4001);
}
