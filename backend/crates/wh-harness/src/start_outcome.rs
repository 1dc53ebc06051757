use crate::HarnessError;

use std::panic::Location;
use std::time::Duration;

use error_location::ErrorLocation;

/// Result of a single launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Marker seen and the health endpoint answered 2xx
    Ready { elapsed: Duration },
    Failed { reason: StartFailure },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartFailure {
    /// Neither marker plus healthy probe arrived before the deadline
    Timeout { waited: Duration },
    /// The process could not be started at all
    Spawn { message: String },
    /// The process exited before it became ready
    EarlyExit { code: Option<i32> },
}

impl StartOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

impl StartFailure {
    #[track_caller]
    pub fn into_error(self, command: &str, timeout: Duration) -> HarnessError {
        let location = ErrorLocation::from(Location::caller());
        match self {
            Self::Timeout { .. } => HarnessError::StartupTimeout {
                timeout_ms: timeout.as_millis() as u64,
                location,
            },
            Self::Spawn { message } => HarnessError::SpawnError {
                command: command.to_string(),
                message,
                location,
            },
            Self::EarlyExit { code } => HarnessError::EarlyExit { code, location },
        }
    }
}
