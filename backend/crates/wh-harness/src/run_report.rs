use crate::{HarnessError, HarnessState};

use std::fmt;

/// A failure together with the stage it happened in.
#[derive(Debug)]
pub struct StageFailure {
    pub state: HarnessState,
    pub error: HarnessError,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.state, self.error.kind(), self.error)
    }
}

/// Outcome of a complete harness run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Launch attempts actually made
    pub attempts: u32,
    /// Every failure in the order it happened; empty on success
    pub failures: Vec<StageFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `0` on success, `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn record(&mut self, state: HarnessState, error: HarnessError) {
        self.failures.push(StageFailure { state, error });
    }

    /// First failure of the given kind, if any.
    pub fn failure_of_kind(&self, kind: &str) -> Option<&StageFailure> {
        self.failures.iter().find(|f| f.error.kind() == kind)
    }
}
