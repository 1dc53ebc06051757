//! Single launch attempt: spawn, wait for the marker, then for health.

use crate::{ChildProcessHandle, HealthProber, LaunchCommand, StartFailure, StartOutcome};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{Instant, MissedTickBehavior};

type MarkerHook = Arc<dyn Fn() + Send + Sync>;

/// Spawns the server and waits until it is ready.
///
/// Ready means the marker appeared on stdout *and* the health endpoint
/// answered 2xx afterwards, both within `startup_timeout` of the spawn.
/// Probing does not start before the marker is seen.
#[derive(Clone)]
pub struct ProcessLauncher {
    marker: String,
    startup_timeout: Duration,
    probe_interval: Duration,
    prober: HealthProber,
    on_marker: Option<MarkerHook>,
}

impl ProcessLauncher {
    pub fn new(
        marker: impl Into<String>,
        startup_timeout: Duration,
        probe_interval: Duration,
        prober: HealthProber,
    ) -> Self {
        Self {
            marker: marker.into(),
            startup_timeout,
            probe_interval,
            prober,
            on_marker: None,
        }
    }

    /// Callback run once when the marker is first seen.
    pub fn on_marker<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_marker = Some(Arc::new(hook));
        self
    }

    /// Spawn `command` into `slot` and wait for readiness.
    ///
    /// The handle is stored in `slot` as soon as the process exists, so a
    /// caller that abandons this future can still terminate it. On failure
    /// the process is left in `slot`; stopping it is the caller's job.
    pub async fn launch(
        &self,
        command: &LaunchCommand,
        slot: &mut Option<ChildProcessHandle>,
    ) -> StartOutcome {
        if slot.is_some() {
            return StartOutcome::Failed {
                reason: StartFailure::Spawn {
                    message: "a server process is already active".to_string(),
                },
            };
        }

        let handle = match ChildProcessHandle::spawn(command, &self.marker) {
            Ok(handle) => slot.insert(handle),
            Err(e) => {
                warn!("Failed to spawn '{}': {e}", command.display());
                return StartOutcome::Failed {
                    reason: StartFailure::Spawn {
                        message: e.to_string(),
                    },
                };
            }
        };

        let started = Instant::now();
        let deadline = started + self.startup_timeout;

        let mut marker_rx = handle.marker_receiver();
        let mut marker_seen = *marker_rx.borrow_and_update();
        let mut marker_open = true;

        let mut poll = tokio::time::interval(self.probe_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let timeout = tokio::time::sleep_until(deadline);
        tokio::pin!(timeout);

        if marker_seen {
            self.marker_found();
        }

        loop {
            tokio::select! {
                biased;

                status = handle.wait() => {
                    let code = status.ok().and_then(|s| s.code());
                    warn!("Server process exited before becoming ready (code {code:?})");
                    return StartOutcome::Failed {
                        reason: StartFailure::EarlyExit { code },
                    };
                }

                _ = &mut timeout => {
                    let waited = started.elapsed();
                    warn!(
                        "Server not ready after {}ms (marker seen: {marker_seen})",
                        waited.as_millis()
                    );
                    return StartOutcome::Failed {
                        reason: StartFailure::Timeout { waited },
                    };
                }

                changed = marker_rx.changed(), if !marker_seen && marker_open => {
                    match changed {
                        Ok(()) => {
                            if *marker_rx.borrow_and_update() {
                                marker_seen = true;
                                self.marker_found();
                                poll.reset_immediately();
                            }
                        }
                        // stdout closed without the marker; only the deadline remains
                        Err(_) => marker_open = false,
                    }
                }

                _ = poll.tick(), if marker_seen => {
                    if let Ok(true) = tokio::time::timeout_at(deadline, self.prober.probe()).await {
                        let elapsed = started.elapsed();
                        info!("Server ready after {}ms", elapsed.as_millis());
                        return StartOutcome::Ready { elapsed };
                    }
                    debug!(
                        "{} not healthy yet, retrying in {}ms",
                        self.prober.url(),
                        self.probe_interval.as_millis()
                    );
                }
            }
        }
    }

    fn marker_found(&self) {
        info!("Readiness marker '{}' seen, probing health", self.marker);
        if let Some(hook) = &self.on_marker {
            hook();
        }
    }
}
