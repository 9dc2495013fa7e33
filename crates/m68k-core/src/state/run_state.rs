/// Execution state of a machine between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// `STOP` executed; waits for `Machine::resume`.
    Stopped,
    /// `RTS` executed with no outstanding subroutine call.
    Finished,
}

impl RunState {
    /// Returns `true` when the next `step` would execute an instruction.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
        assert!(RunState::default().is_running());
    }

    #[test]
    fn terminal_states_do_not_run() {
        assert!(!RunState::Stopped.is_running());
        assert!(!RunState::Finished.is_running());
    }
}
