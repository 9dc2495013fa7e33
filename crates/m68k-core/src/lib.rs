//! Interpreter for the Motorola 68000 user and supervisor integer instruction set.
//!
//! A [`Machine`] owns a flat big-endian [`Memory`] and a [`RegisterFile`].
//! The host loads an executable, then drives it with [`Machine::step`] or
//! [`Machine::run`]; traps come back to the host as [`MachineError::Trap`]
//! instead of being vectored through a guest exception table.

/// Operation sizes and their bit-level helpers.
pub mod size;
pub use size::OpSize;

/// Flat big-endian memory with alignment and bounds checks.
pub mod memory;
pub use memory::{Memory, DEFAULT_MEMORY_BYTES};

/// Register file, status-register flags, and run state.
pub mod state;
pub use state::{Condition, RegisterFile, RunState};

/// Opcode pattern table and the precomputed handler lookup.
pub mod encoding;
pub use encoding::{lookup_handler, HandlerId, OpcodePattern};

/// Instruction fetch and operand-shape decoding.
pub mod decoder;
pub use decoder::{AddressingMode, Decoder, EaField, ExtensionWords, Instruction};

/// Effective-address resolution.
pub mod ea;
pub use ea::Operand;

/// Per-family instruction handlers and flag policies.
pub mod execute;
pub use execute::{execute_instruction, FlagsUpdate};

/// Trap and machine error taxonomy.
pub mod fault;
pub use fault::{MachineError, Trap, TrapClass};

/// Approximate base cycle costs per instruction class.
pub mod timing;
pub use timing::{cycle_cost, instruction_cycles, CycleCostKind, CYCLE_COST_TABLE};

/// Motorola-syntax disassembly.
pub mod disasm;
pub use disasm::{disassemble, disassemble_range, DisassemblyRow};

/// Optional-field register snapshots.
pub mod snapshot;
pub use snapshot::CpuState;

/// Host-facing machine API.
pub mod api;
pub use api::{Machine, MachineConfig, RunBoundary, RunOutcome, StepOutcome};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
