//! Server lifecycle test harness.
//!
//! Starts a server as a child process, waits until it has printed its
//! readiness marker and answers its health endpoint, runs one assertion
//! against it and tears the process tree down again, confirming the port
//! has been released.

mod assertion;
mod endpoint;
mod error;
mod harness_state;
mod health;
mod launch_command;
mod launcher;
mod marker;
mod orchestrator;
mod port;
mod process;
mod run_report;
mod shutdown_coordinator;
mod shutdown_guard;
pub mod signals;
mod start_outcome;
mod terminator;

#[cfg(test)]
mod tests;

pub use assertion::{Assertion, HealthAssertion};
pub use endpoint::ServerEndpoint;
pub use error::{HarnessError, Result as HarnessResult};
pub use harness_state::HarnessState;
pub use health::{HealthProber, HealthResponse, ProbeResult};
pub use launch_command::LaunchCommand;
pub use launcher::ProcessLauncher;
pub use marker::MarkerScanner;
pub use orchestrator::Orchestrator;
pub use port::PortWaiter;
pub use process::ChildProcessHandle;
pub use run_report::{RunReport, StageFailure};
pub use shutdown_coordinator::ShutdownCoordinator;
pub use shutdown_guard::ShutdownGuard;
pub use start_outcome::{StartFailure, StartOutcome};
pub use terminator::{ProcessTerminator, StopOutcome};
