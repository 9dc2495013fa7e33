//! Host-facing machine surface: loading, stepping, running, and inspection.

use tracing::{debug, trace};

use crate::decoder::Decoder;
use crate::disasm::disassemble;
use crate::execute::execute_instruction;
use crate::memory::DEFAULT_MEMORY_BYTES;
use crate::timing::instruction_cycles;
use crate::{CpuState, MachineError, Memory, RegisterFile, RunState, Trap};

/// Construction-time configuration for a [`Machine`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Memory capacity in bytes.
    pub memory_bytes: usize,
    /// Emits a `trace!` event with the disassembly of every executed instruction.
    pub trace_instructions: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_bytes: DEFAULT_MEMORY_BYTES,
            trace_instructions: false,
        }
    }
}

/// Result of one `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// One instruction executed.
    Retired {
        /// Approximate base cycle cost of the instruction.
        cycles: u16,
    },
    /// Nothing executed: the machine is stopped.
    Stopped,
    /// Nothing executed: the program has finished.
    Finished,
}

/// Why a `run` call returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunBoundary {
    /// The program counter reached the end of the loaded executable.
    EndOfCode,
    /// An outermost `RTS` finished the program.
    Finished,
    /// `STOP` halted the machine.
    Stopped,
    /// The step cap passed to `run_with_limit` was reached.
    StepLimit,
}

/// Aggregated outcome of a `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Instructions executed during this call.
    pub steps: u64,
    /// Approximate cycles consumed during this call.
    pub cycles: u64,
    /// Condition that ended the run.
    pub boundary: RunBoundary,
}

/// A single interpreter instance owning its registers and memory.
#[derive(Debug, Clone)]
pub struct Machine {
    /// Programmer-visible registers.
    pub registers: RegisterFile,
    /// Byte-addressable memory.
    pub memory: Memory,
    pub(crate) call_depth: u32,
    pub(crate) run_state: RunState,
    cycles: u64,
    code_start: u32,
    code_end: u32,
    trace_instructions: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

/// Flattens big-endian words into bytes.
fn words_to_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_be_bytes()).collect()
}

impl Machine {
    /// Creates a machine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&MachineConfig::default())
    }

    /// Creates a machine from an explicit configuration.
    #[must_use]
    pub fn with_config(config: &MachineConfig) -> Self {
        Self {
            registers: RegisterFile::default(),
            memory: Memory::new(config.memory_bytes),
            call_depth: 0,
            run_state: RunState::Running,
            cycles: 0,
            code_start: 0,
            code_end: 0,
            trace_instructions: config.trace_instructions,
        }
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Clears a `STOP` so the next `step` executes again.
    ///
    /// A finished machine stays finished until the next load or reset.
    pub fn resume(&mut self) {
        if self.run_state == RunState::Stopped {
            debug!(pc = %format!("{:#x}", self.registers.pc()), "resumed after stop");
            self.run_state = RunState::Running;
        }
    }

    /// Number of subroutine calls not yet returned from.
    #[must_use]
    pub const fn call_depth(&self) -> u32 {
        self.call_depth
    }

    /// Approximate cycles consumed since the last reset.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Address range `[start, end)` of the loaded executable.
    #[must_use]
    pub const fn code_range(&self) -> (u32, u32) {
        (self.code_start, self.code_end)
    }

    /// Returns `true` once the program counter has reached the end of loaded code.
    #[must_use]
    pub const fn is_end_of_code(&self) -> bool {
        self.registers.pc() >= self.code_end
    }

    /// Loads an executable image and points the program counter at it.
    ///
    /// # Errors
    ///
    /// [`MachineError::LoadOutOfRange`] when the image does not fit; the
    /// machine is left untouched.
    pub fn load_executable(
        &mut self,
        bytes: &[u8],
        address: u32,
        clear_first: bool,
    ) -> Result<(), MachineError> {
        let len = u32::try_from(bytes.len()).map_err(|_| MachineError::LoadOutOfRange {
            address,
            len: bytes.len(),
            capacity: self.memory.capacity(),
        })?;
        self.memory.load(bytes, address, clear_first)?;
        self.code_start = address;
        self.code_end = address.wrapping_add(len);
        self.registers.set_pc(address);
        self.call_depth = 0;
        self.run_state = RunState::Running;
        debug!(
            address = %format!("{address:#x}"),
            len = bytes.len(),
            "loaded executable"
        );
        Ok(())
    }

    /// Word-slice form of [`Machine::load_executable`].
    ///
    /// # Errors
    ///
    /// As for [`Machine::load_executable`].
    pub fn load_executable_words(
        &mut self,
        words: &[u16],
        address: u32,
        clear_first: bool,
    ) -> Result<(), MachineError> {
        self.load_executable(&words_to_bytes(words), address, clear_first)
    }

    /// Loads non-executable data without touching the program counter.
    ///
    /// # Errors
    ///
    /// [`MachineError::LoadOutOfRange`] when the data does not fit.
    pub fn load_data(
        &mut self,
        bytes: &[u8],
        address: u32,
        clear_first: bool,
    ) -> Result<(), MachineError> {
        self.memory.load(bytes, address, clear_first)?;
        debug!(
            address = %format!("{address:#x}"),
            len = bytes.len(),
            "loaded data"
        );
        Ok(())
    }

    /// Word-slice form of [`Machine::load_data`].
    ///
    /// # Errors
    ///
    /// As for [`Machine::load_data`].
    pub fn load_data_words(
        &mut self,
        words: &[u16],
        address: u32,
        clear_first: bool,
    ) -> Result<(), MachineError> {
        self.load_data(&words_to_bytes(words), address, clear_first)
    }

    /// Executes exactly one instruction.
    ///
    /// A stopped or finished machine reports its state without executing.
    /// When a trap is raised the program counter stays at the faulting
    /// opcode for decode failures and after the instruction otherwise.
    ///
    /// # Errors
    ///
    /// [`MachineError::PastEndOfCode`] when the fetch leaves the loaded
    /// code, or [`MachineError::Trap`] for any trap raised by the instruction.
    pub fn step(&mut self) -> Result<StepOutcome, MachineError> {
        match self.run_state {
            RunState::Running => {}
            RunState::Stopped => return Ok(StepOutcome::Stopped),
            RunState::Finished => return Ok(StepOutcome::Finished),
        }

        let pc = self.registers.pc();
        let Some(instr) = Decoder::new(&self.memory, pc, self.code_end).fetch()? else {
            let opcode = self.memory.read_word(pc).unwrap_or_default();
            debug!(
                pc = %format!("{pc:#x}"),
                opcode = %format!("{opcode:#06x}"),
                "illegal instruction"
            );
            return Err(Trap::IllegalInstruction.into());
        };

        if self.trace_instructions {
            trace!(
                pc = %format!("{pc:#x}"),
                opcode = %format!("{:#06x}", instr.opcode),
                mnemonic = instr.handler.mnemonic(),
                "{}",
                disassemble(&instr)
            );
        }

        self.registers.set_pc(instr.next_address());
        if let Err(trap) = execute_instruction(self, &instr) {
            debug!(
                pc = %format!("{pc:#x}"),
                vector = trap.vector(),
                %trap,
                "trap raised"
            );
            return Err(trap.into());
        }

        let cycles = instruction_cycles(instr.handler);
        self.cycles += u64::from(cycles);
        Ok(StepOutcome::Retired { cycles })
    }

    /// Runs until end of code, `STOP`, or an outermost `RTS`.
    ///
    /// # Errors
    ///
    /// The first error raised by [`Machine::step`].
    pub fn run(&mut self) -> Result<RunOutcome, MachineError> {
        self.run_with_limit(None)
    }

    /// Like [`Machine::run`], additionally stopping after `max_steps` instructions.
    ///
    /// # Errors
    ///
    /// The first error raised by [`Machine::step`].
    pub fn run_with_limit(&mut self, max_steps: Option<u64>) -> Result<RunOutcome, MachineError> {
        let mut steps = 0u64;
        let mut cycles = 0u64;
        let boundary = loop {
            match self.run_state {
                RunState::Stopped => break RunBoundary::Stopped,
                RunState::Finished => break RunBoundary::Finished,
                RunState::Running => {}
            }
            if self.is_end_of_code() {
                break RunBoundary::EndOfCode;
            }
            if max_steps.is_some_and(|max| steps >= max) {
                break RunBoundary::StepLimit;
            }
            if let StepOutcome::Retired { cycles: spent } = self.step()? {
                steps += 1;
                cycles += u64::from(spent);
            }
        };
        debug!(steps, cycles, ?boundary, "run finished");
        Ok(RunOutcome {
            steps,
            cycles,
            boundary,
        })
    }

    /// Read-only view of `len` bytes at `address`.
    ///
    /// # Errors
    ///
    /// [`MachineError::RangeOutOfBounds`] when the range leaves memory.
    pub fn dump_memory(&self, address: u32, len: usize) -> Result<&[u8], MachineError> {
        self.memory.dump(address, len)
    }

    /// Human-readable register and flag listing.
    #[must_use]
    pub fn dump_state(&self) -> String {
        self.registers.to_string()
    }

    /// Fully populated register snapshot.
    #[must_use]
    pub fn cpu_state(&self) -> CpuState {
        self.registers.snapshot()
    }

    /// Writes the present fields of `state` into the registers.
    pub fn set_cpu_state(&mut self, state: &CpuState) {
        self.registers = state.apply_to(&self.registers);
    }

    /// Clears memory, registers, call depth, cycle count, and the loaded-code range.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.registers = RegisterFile::default();
        self.call_depth = 0;
        self.run_state = RunState::Running;
        self.cycles = 0;
        self.code_start = 0;
        self.code_end = 0;
        debug!("machine reset");
    }

    /// Pushes a long word onto the active stack.
    ///
    /// # Errors
    ///
    /// [`Trap::AddressError`] when the new stack slot is misaligned or out
    /// of bounds; the stack pointer is left unchanged.
    pub fn push_long(&mut self, value: u32) -> Result<(), Trap> {
        let sp = self.registers.sp().wrapping_sub(4);
        self.memory.write_long(sp, value)?;
        self.registers.set_sp(sp);
        Ok(())
    }

    /// Pushes a word onto the active stack.
    ///
    /// # Errors
    ///
    /// As for [`Machine::push_long`].
    pub fn push_word(&mut self, value: u16) -> Result<(), Trap> {
        let sp = self.registers.sp().wrapping_sub(2);
        self.memory.write_word(sp, value)?;
        self.registers.set_sp(sp);
        Ok(())
    }

    /// Pops a long word from the active stack.
    ///
    /// # Errors
    ///
    /// [`Trap::AddressError`] when the stack pointer is misaligned or out
    /// of bounds.
    pub fn pop_long(&mut self) -> Result<u32, Trap> {
        let sp = self.registers.sp();
        let value = self.memory.read_long(sp)?;
        self.registers.set_sp(sp.wrapping_add(4));
        Ok(value)
    }

    /// Pops a word from the active stack.
    ///
    /// # Errors
    ///
    /// As for [`Machine::pop_long`].
    pub fn pop_word(&mut self) -> Result<u16, Trap> {
        let sp = self.registers.sp();
        let value = self.memory.read_word(sp)?;
        self.registers.set_sp(sp.wrapping_add(2));
        Ok(value)
    }
}
