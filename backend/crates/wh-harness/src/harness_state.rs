use std::fmt;

/// Stage of a harness run.
///
/// Transitions: `Idle -> PortWait -> Launching -> Probing -> Running ->
/// Terminating -> PortWaitPost -> Done`. Launch failures loop back to
/// `Launching` with the next attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    /// Nothing has happened yet
    Idle,
    /// Waiting for a leftover process to release the port
    PortWait,
    /// Process spawned, waiting for the readiness marker
    Launching { attempt: u32 },
    /// Marker seen, polling the health endpoint
    Probing { attempt: u32 },
    /// Server ready, assertion in progress
    Running,
    /// Stopping the process tree
    Terminating,
    /// Waiting for the port to be released after shutdown
    PortWaitPost,
    /// Run finished
    Done { success: bool },
}

impl fmt::Display for HarnessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::PortWait => write!(f, "PortWait"),
            Self::Launching { attempt } => write!(f, "Launching (attempt {attempt})"),
            Self::Probing { attempt } => write!(f, "Probing (attempt {attempt})"),
            Self::Running => write!(f, "Running"),
            Self::Terminating => write!(f, "Terminating"),
            Self::PortWaitPost => write!(f, "PortWaitPost"),
            Self::Done { success: true } => write!(f, "Done (success)"),
            Self::Done { success: false } => write!(f, "Done (failure)"),
        }
    }
}
