//! Canned programs and runners for the `m68k-demo` binary.
//!
//! The sort demo loads a small bubble sort at [`SORT_LOAD_ADDRESS`], gives it
//! a length-prefixed byte list at [`SORT_DATA_ADDRESS`], and runs it until the
//! outermost `RTS` returns control to the host.

use m68k_core::{CpuState, Machine, MachineError, RunOutcome};
use tracing::info;
#[cfg(test)]
use tempfile as _;
use tracing_subscriber as _;

/// Address the sort routine is loaded at.
pub const SORT_LOAD_ADDRESS: u32 = 0x1000;

/// Address of the length-prefixed byte list the routine sorts in place.
pub const SORT_DATA_ADDRESS: u32 = 0x2000;

/// Initial user stack pointer for the sort routine.
pub const SORT_STACK_POINTER: u32 = 0x4000;

/// Number of values in the canned input list.
pub const SORT_VALUE_COUNT: usize = 50;

/// Stack pointer given to raw binaries: the top of default memory.
pub const DEFAULT_STACK_TOP: u32 = 0x0100_0000;

/// Ascending unsigned bubble sort over the byte list addressed by `$2000.W`.
///
/// The first byte holds the count; the routine repeats passes until one
/// makes no swaps and then returns with `RTS`.
pub const SORT_PROGRAM: [u16; 21] = [
    0x41F8, 0x2000, // LEA     $2000.W,A0
    0x4240, // CLR.W   D0
    0x1018, // MOVE.B  (A0)+,D0
    0x43F0, 0x00FF, // LEA     -1(A0,D0.W),A1
    0x4241, // CLR.W   D1
    0x2448, // MOVEA.L A0,A2
    0x101A, // MOVE.B  (A2)+,D0
    0xB012, // CMP.B   (A2),D0
    0x650A, // BCS.S   no swap
    0x1212, // MOVE.B  (A2),D1
    0x1541, 0xFFFF, // MOVE.B  D1,-1(A2)
    0x1480, // MOVE.B  D0,(A2)
    0x5241, // ADDQ.W  #1,D1
    0xB3CA, // CMPA.L  A2,A1
    0x62EC, // BHI.S   next pair
    0x4A41, // TST.W   D1
    0x66E4, // BNE.S   next pass
    0x4E75, // RTS
];

/// What the sort demo observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortReport {
    /// Values before the run.
    pub unsorted: Vec<u8>,
    /// Values read back from memory after the run.
    pub sorted: Vec<u8>,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Register dump taken after the run.
    pub state_dump: String,
}

/// The length-prefixed input list: a count byte followed by interleaved
/// descending values.
#[must_use]
pub fn sort_input() -> Vec<u8> {
    let mut data = Vec::with_capacity(SORT_VALUE_COUNT + 1);
    data.push(50);
    for i in 0..50u8 {
        let value = if i % 2 == 0 { (100 - i) * 2 } else { (50 - i) * 2 };
        data.push(value);
    }
    data
}

/// Loads the sort routine and its data into `machine` without running it.
///
/// # Errors
///
/// [`MachineError::LoadOutOfRange`] when the machine is too small.
pub fn load_sort_demo(machine: &mut Machine) -> Result<(), MachineError> {
    machine.load_executable_words(&SORT_PROGRAM, SORT_LOAD_ADDRESS, true)?;
    machine.set_cpu_state(&CpuState {
        usp: Some(SORT_STACK_POINTER),
        ..CpuState::default()
    });
    machine.load_data(&sort_input(), SORT_DATA_ADDRESS, false)
}

/// Loads and runs the sort routine on `machine`.
///
/// # Errors
///
/// Any load failure or trap raised while the routine runs.
pub fn run_sort_demo(machine: &mut Machine) -> Result<SortReport, MachineError> {
    load_sort_demo(machine)?;
    let input = sort_input();
    let outcome = machine.run()?;
    info!(
        steps = outcome.steps,
        cycles = outcome.cycles,
        "sort routine returned"
    );
    let sorted = machine.dump_memory(SORT_DATA_ADDRESS, input.len())?[1..].to_vec();
    Ok(SortReport {
        unsorted: input[1..].to_vec(),
        sorted,
        outcome,
        state_dump: machine.dump_state(),
    })
}

/// Parses an address or count written as `$hex`, `0xhex`, or decimal.
///
/// # Errors
///
/// A message naming the text that failed to parse.
pub fn parse_number(text: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = text.strip_prefix('$') {
        u32::from_str_radix(hex, 16)
    } else if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|_| format!("invalid number: {text}"))
}

/// Formats `bytes` as rows of sixteen, each prefixed with its address.
#[must_use]
pub fn hex_dump(address: u32, bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in (0u32..).zip(bytes.chunks(16)) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02X}")).collect();
        out.push_str(&format!(
            "{:08X}  {}\n",
            address.wrapping_add(row * 16),
            hex.join(" ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use m68k_core::{RunBoundary, RunState};

    #[test]
    fn input_is_count_prefixed() {
        let data = sort_input();
        assert_eq!(data.len(), 51);
        assert_eq!(data[0], 50);
        assert_eq!(&data[1..5], &[200, 98, 196, 94]);
        assert_eq!(data[50], 2);
    }

    #[test]
    fn sort_demo_sorts_ascending() {
        let mut machine = Machine::new();
        let report = run_sort_demo(&mut machine).expect("sort demo should run");

        let mut expected = report.unsorted.clone();
        expected.sort_unstable();
        assert_eq!(report.sorted, expected);
        assert_eq!(report.outcome.boundary, RunBoundary::Finished);
        assert_eq!(machine.run_state(), RunState::Finished);
        assert!(report.state_dump.contains("USP: 0x00004000"));
    }

    #[test]
    fn parses_number_forms() {
        assert_eq!(parse_number("$1000"), Ok(0x1000));
        assert_eq!(parse_number("0x2000"), Ok(0x2000));
        assert_eq!(parse_number("42"), Ok(42));
        assert!(parse_number("$zz").is_err());
    }

    #[test]
    fn hex_dump_wraps_rows() {
        let bytes: Vec<u8> = (0..18).collect();
        let dump = hex_dump(0x100, &bytes);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000100  00 01 02"));
        assert_eq!(lines[1], "00000110  10 11");
    }
}
