//! Architectural CPU state: registers, status flags, and run state.

/// Status register bits and the condition-code evaluator.
pub mod flags;
/// Register file storage and sized accessors.
pub mod registers;
/// Machine run-state model.
pub mod run_state;

pub use flags::{
    Condition, CCR_MASK, SR_C, SR_FLAG_NAMES, SR_INTERRUPT_MASK, SR_N, SR_S, SR_T, SR_V,
    SR_WRITE_MASK, SR_X, SR_Z,
};
pub use registers::{RegisterFile, ADDRESS_REGISTER_COUNT, DATA_REGISTER_COUNT};
pub use run_state::RunState;
