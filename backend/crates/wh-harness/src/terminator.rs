//! Process tree termination: polite signal, grace period, then kill.

use crate::ChildProcessHandle;

use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::time::Instant;

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Process is gone (or never existed)
    Stopped,
    /// Process survived the forceful kill within the shutdown timeout
    FailedToStop,
}

/// Stops the server process and its whole process group.
#[derive(Debug, Clone)]
pub struct ProcessTerminator {
    grace_period: Duration,
    shutdown_timeout: Duration,
}

impl ProcessTerminator {
    pub fn new(grace_period: Duration, shutdown_timeout: Duration) -> Self {
        Self {
            grace_period,
            shutdown_timeout,
        }
    }

    /// Stop the process held in `slot`.
    ///
    /// Idempotent: an empty slot or an already exited process yields
    /// `Stopped`. On `FailedToStop` the handle is put back into `slot`.
    pub async fn terminate(&self, slot: &mut Option<ChildProcessHandle>) -> StopOutcome {
        let Some(mut handle) = slot.take() else {
            return StopOutcome::Stopped;
        };

        match handle.try_wait() {
            Ok(Some(status)) => {
                debug!("Server process already exited ({status})");
                finish(&mut handle);
                return StopOutcome::Stopped;
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to query server process state: {e}"),
        }

        let deadline = Instant::now() + self.shutdown_timeout;
        let grace_deadline = (Instant::now() + self.grace_period).min(deadline);

        info!(
            "Stopping '{}' (pid {:?}, up {}ms)",
            handle.command(),
            handle.pid(),
            handle.started_at().elapsed().as_millis()
        );
        send_terminate(&mut handle);

        if wait_until(&mut handle, grace_deadline).await {
            info!("Server process exited gracefully");
            finish(&mut handle);
            return StopOutcome::Stopped;
        }

        warn!(
            "Server process still running after {}ms, killing",
            self.grace_period.as_millis()
        );
        send_kill(&mut handle);

        if wait_until(&mut handle, deadline).await {
            info!("Server process killed");
            finish(&mut handle);
            StopOutcome::Stopped
        } else {
            error!(
                "Server process (pid {:?}) did not exit within {}ms",
                handle.pid(),
                self.shutdown_timeout.as_millis()
            );
            *slot = Some(handle);
            StopOutcome::FailedToStop
        }
    }
}

async fn wait_until(handle: &mut ChildProcessHandle, deadline: Instant) -> bool {
    match tokio::time::timeout_at(deadline, handle.wait()).await {
        Ok(Ok(status)) => {
            debug!("Server process exited ({status})");
            true
        }
        Ok(Err(e)) => {
            warn!("Failed waiting for server process: {e}");
            false
        }
        Err(_) => false,
    }
}

/// Leader is gone; clear out anything left in its group and stop log pumps.
fn finish(handle: &mut ChildProcessHandle) {
    #[cfg(unix)]
    {
        if let Some(pid) = handle.pid() {
            signal_group(pid, nix::sys::signal::Signal::SIGKILL);
        }
    }
    handle.abort_readers();
}

#[cfg(unix)]
fn send_terminate(handle: &mut ChildProcessHandle) {
    use nix::sys::signal::Signal;

    match handle.pid() {
        Some(pid) => signal_group(pid, Signal::SIGTERM),
        None => {
            let _ = handle.start_kill();
        }
    }
}

#[cfg(unix)]
fn send_kill(handle: &mut ChildProcessHandle) {
    use nix::sys::signal::Signal;

    if let Some(pid) = handle.pid() {
        signal_group(pid, Signal::SIGKILL);
    }
    if let Err(e) = handle.start_kill() {
        debug!("start_kill failed: {e}");
    }
}

/// Signal the process group led by `pid`, falling back to the single
/// process if the group is gone. ESRCH is not an error here.
#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, killpg};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(pid as i32);
    match killpg(pid, signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => {
            debug!("killpg({pid}, {signal}) failed: {e}, signalling process only");
            match kill(pid, signal) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => warn!("kill({pid}, {signal}) failed: {e}"),
            }
        }
    }
}

#[cfg(windows)]
fn send_terminate(handle: &mut ChildProcessHandle) {
    match handle.pid() {
        Some(pid) => taskkill(pid, false),
        None => {
            let _ = handle.start_kill();
        }
    }
}

#[cfg(windows)]
fn send_kill(handle: &mut ChildProcessHandle) {
    if let Some(pid) = handle.pid() {
        taskkill(pid, true);
    }
    if let Err(e) = handle.start_kill() {
        debug!("start_kill failed: {e}");
    }
}

#[cfg(windows)]
fn taskkill(pid: u32, force: bool) {
    let mut cmd = std::process::Command::new("taskkill");
    cmd.args(["/T", "/PID", &pid.to_string()]);
    if force {
        cmd.arg("/F");
    }
    if let Err(e) = cmd.output() {
        warn!("taskkill failed for pid {pid}: {e}");
    }
}
