//! One-shot test run: port wait, launch with retries, assertion, cleanup.

use crate::{
    Assertion, ChildProcessHandle, HarnessError, HarnessState, HealthAssertion, HealthProber,
    LaunchCommand, PortWaiter, ProcessLauncher, ProcessTerminator, RunReport, ServerEndpoint,
    ShutdownCoordinator, StartOutcome, StopOutcome,
};

use std::panic::Location;
use std::sync::Arc;

use error_location::ErrorLocation;
use log::{error, info, warn};
use tokio::sync::watch;
use wh_config::{Config, HarnessConfig, RetryConfig};

/// Drives the server through
/// `Idle -> PortWait -> Launching -> Probing -> Running -> Terminating ->
/// PortWaitPost -> Done`.
///
/// Owns the single active process handle. `Terminating` and `PortWaitPost`
/// always run once anything was launched, whether the run succeeded,
/// failed or was interrupted.
pub struct Orchestrator {
    harness: HarnessConfig,
    retry: RetryConfig,
    endpoint: ServerEndpoint,
    command: LaunchCommand,
    coordinator: ShutdownCoordinator,
    assertion: Box<dyn Assertion>,
    state_tx: Arc<watch::Sender<HarnessState>>,
    active: Option<ChildProcessHandle>,
    launched: bool,
}

impl Orchestrator {
    pub fn new(
        harness: HarnessConfig,
        retry: RetryConfig,
        endpoint: ServerEndpoint,
        command: LaunchCommand,
        coordinator: ShutdownCoordinator,
    ) -> Self {
        let (state_tx, _) = watch::channel(HarnessState::Idle);
        Self {
            harness,
            retry,
            endpoint,
            command,
            coordinator,
            assertion: Box::new(HealthAssertion),
            state_tx: Arc::new(state_tx),
            active: None,
            launched: false,
        }
    }

    /// Build from configuration; the start command runs through the shell.
    ///
    /// The server's host, port and URL are exported to the child as both
    /// `WH_*` and conventional variables, so it listens where it is probed.
    pub fn from_config(config: &Config, coordinator: ShutdownCoordinator) -> Self {
        Self::new(
            config.harness.clone(),
            config.retry.clone(),
            ServerEndpoint::from_config(&config.server),
            server_command(config),
            coordinator,
        )
    }

    pub fn with_command(mut self, command: LaunchCommand) -> Self {
        self.command = command;
        self
    }

    pub fn with_assertion<A: Assertion + 'static>(mut self, assertion: A) -> Self {
        self.assertion = Box::new(assertion);
        self
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<HarnessState> {
        self.state_tx.subscribe()
    }

    /// Execute the whole scenario and report how it went.
    pub async fn run(mut self) -> RunReport {
        let mut report = RunReport::default();

        info!(
            "Starting harness run: '{}' against {}",
            self.command.display(),
            self.endpoint.health_url()
        );

        let prober = match HealthProber::new(self.endpoint.health_url(), self.harness.probe_timeout())
        {
            Ok(prober) => prober,
            Err(e) => {
                fail(&mut report, HarnessState::Idle, e);
                self.set_state(HarnessState::Done { success: false });
                return report;
            }
        };
        let port_waiter = PortWaiter::new(self.harness.port_poll_interval());
        let terminator =
            ProcessTerminator::new(self.harness.grace_period(), self.harness.shutdown_timeout());

        if self
            .start(&prober, &port_waiter, &terminator, &mut report)
            .await
        {
            self.set_state(HarnessState::Running);
            let mut guard = self.coordinator.subscribe_guard();
            let result = tokio::select! {
                biased;
                _ = guard.wait() => Err(HarnessError::interrupted()),
                result = self.assertion.verify(&self.endpoint, &prober) => result,
            };
            match result {
                Ok(()) => info!("Assertion '{}' passed", self.assertion.name()),
                Err(e) => fail(&mut report, HarnessState::Running, e),
            }
        }

        self.cleanup(&port_waiter, &terminator, &mut report).await;

        let success = report.is_success();
        self.set_state(HarnessState::Done { success });
        if success {
            info!("Harness run passed after {} attempt(s)", report.attempts);
        } else {
            error!(
                "Harness run failed after {} attempt(s) with {} failure(s)",
                report.attempts,
                report.failures.len()
            );
        }
        report
    }

    /// `PortWait` followed by the launch retry loop. Returns `true` once the
    /// server is ready.
    async fn start(
        &mut self,
        prober: &HealthProber,
        port_waiter: &PortWaiter,
        terminator: &ProcessTerminator,
        report: &mut RunReport,
    ) -> bool {
        let mut guard = self.coordinator.subscribe_guard();
        let host = self.endpoint.host.clone();
        let port = self.endpoint.port;

        self.set_state(HarnessState::PortWait);
        let waited = tokio::select! {
            biased;
            _ = guard.wait() => Err(HarnessError::interrupted()),
            result = port_waiter.wait_for_port_free(&host, port, self.harness.port_free_timeout()) => result,
        };
        if let Err(e) = waited {
            fail(report, HarnessState::PortWait, e);
            return false;
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            report.attempts = attempt;
            self.set_state(HarnessState::Launching { attempt });

            let state_tx = Arc::clone(&self.state_tx);
            let launcher = ProcessLauncher::new(
                self.harness.readiness_marker.clone(),
                self.harness.startup_timeout(),
                self.harness.probe_interval(),
                prober.clone(),
            )
            .on_marker(move || {
                state_tx.send_replace(HarnessState::Probing { attempt });
            });

            let outcome = tokio::select! {
                biased;
                _ = guard.wait() => None,
                outcome = launcher.launch(&self.command, &mut self.active) => Some(outcome),
            };
            self.launched |= self.active.is_some();
            let stage = *self.state_tx.borrow();

            let reason = match outcome {
                Some(StartOutcome::Ready { .. }) => return true,
                Some(StartOutcome::Failed { reason }) => reason,
                None => {
                    fail(report, stage, HarnessError::interrupted());
                    return false;
                }
            };

            let error = reason.into_error(&self.command.display(), self.harness.startup_timeout());
            warn!("Launch attempt {attempt}/{max_attempts} failed: {error}");
            if !error.is_retryable() {
                fail(report, stage, error);
                return false;
            }
            last_failure = Some((stage, error));

            // The partial process must be gone before the next attempt
            if terminator.terminate(&mut self.active).await == StopOutcome::FailedToStop {
                fail(report, HarnessState::Terminating, self.shutdown_timeout_error());
                return false;
            }

            if attempt == max_attempts {
                break;
            }

            let delay = self.retry.delay_after(attempt);
            info!(
                "Retrying in {}ms (attempt {}/{max_attempts})",
                delay.as_millis(),
                attempt + 1
            );
            let settled = tokio::select! {
                biased;
                _ = guard.wait() => Err(HarnessError::interrupted()),
                result = async {
                    port_waiter
                        .wait_for_port_free(&host, port, self.harness.port_free_timeout())
                        .await?;
                    tokio::time::sleep(delay).await;
                    Ok::<(), HarnessError>(())
                } => result,
            };
            if let Err(e) = settled {
                fail(report, HarnessState::PortWait, e);
                return false;
            }
        }

        if let Some((stage, error)) = last_failure {
            fail(report, stage, error);
        }
        false
    }

    /// `Terminating` and `PortWaitPost`. Not interruptible.
    async fn cleanup(
        &mut self,
        port_waiter: &PortWaiter,
        terminator: &ProcessTerminator,
        report: &mut RunReport,
    ) {
        self.set_state(HarnessState::Terminating);
        if terminator.terminate(&mut self.active).await == StopOutcome::FailedToStop {
            fail(report, HarnessState::Terminating, self.shutdown_timeout_error());
        }

        if !self.launched {
            return;
        }

        self.set_state(HarnessState::PortWaitPost);
        if let Err(e) = port_waiter
            .wait_for_port_free(
                &self.endpoint.host,
                self.endpoint.port,
                self.harness.port_free_timeout(),
            )
            .await
        {
            fail(report, HarnessState::PortWaitPost, e);
        }
    }

    fn set_state(&self, state: HarnessState) {
        info!("Harness state: {state}");
        self.state_tx.send_replace(state);
    }

    #[track_caller]
    fn shutdown_timeout_error(&self) -> HarnessError {
        HarnessError::ShutdownTimeout {
            timeout_ms: self.harness.shutdown_timeout_ms,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

fn server_command(config: &Config) -> LaunchCommand {
    let server = &config.server;
    let port = server.port.to_string();
    let mut command = LaunchCommand::shell(config.harness.start_command.clone())
        .env("WH_SERVER_HOST", server.host.clone())
        .env("WH_SERVER_PORT", port.clone())
        .env("PORT", port);
    if let Some(ref url) = server.base_url {
        command = command
            .env("WH_SERVER_URL", url.clone())
            .env("SERVER_URL", url.clone());
    }
    command
}

fn fail(report: &mut RunReport, state: HarnessState, error: HarnessError) {
    error!("{state} failed: {error}");
    report.record(state, error);
}
