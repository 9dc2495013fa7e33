#![no_main]

use libfuzzer_sys::fuzz_target;
use m68k_core::{disassemble_range, Machine, MachineConfig, MachineError};

const LOAD_ADDRESS: u32 = 0x1000;
const STACK_TOP: u32 = 0x8000;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let mut machine = Machine::with_config(&MachineConfig {
        memory_bytes: 0x1_0000,
        trace_instructions: false,
    });
    let code = &data[..data.len().min(0x2000) & !1];
    if machine.load_executable(code, LOAD_ADDRESS, true).is_err() {
        return;
    }
    machine.registers.set_usp(STACK_TOP);
    machine.registers.set_ssp(STACK_TOP + 0x1000);

    let end = LOAD_ADDRESS + code.len() as u32;
    let _ = disassemble_range(&machine.memory, LOAD_ADDRESS, end);

    match machine.run_with_limit(Some(4096)) {
        Ok(_) | Err(MachineError::Trap { .. } | MachineError::PastEndOfCode { .. }) => {}
        Err(other) => panic!("unexpected machine error: {other}"),
    }
    let _ = machine.dump_state();
});
