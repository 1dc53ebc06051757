use crate::{ConfigError, ConfigErrorResult, DEFAULT_READINESS_MARKER, DEFAULT_START_COMMAND};

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 4000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 300;
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 2000;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_PORT_POLL_INTERVAL_MS: u64 = 200;
pub const DEFAULT_PORT_FREE_TIMEOUT_MS: u64 = 5000;

/// Timing and process settings for one harness run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Shell command that starts the target server
    pub start_command: String,
    /// Literal text the server writes to stdout once it is listening
    pub readiness_marker: String,
    /// Overall deadline for marker + healthy probe
    pub startup_timeout_ms: u64,
    /// Per-request timeout of a single health probe
    pub probe_timeout_ms: u64,
    /// Delay between health probes while launching
    pub probe_interval_ms: u64,
    /// Time allowed for cooperative shutdown before the forceful kill
    pub grace_period_ms: u64,
    /// Overall deadline for confirmed exit, including the grace period
    pub shutdown_timeout_ms: u64,
    /// Backoff between port connect attempts
    pub port_poll_interval_ms: u64,
    /// Deadline for a port to become free
    pub port_free_timeout_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            start_command: String::from(DEFAULT_START_COMMAND),
            readiness_marker: String::from(DEFAULT_READINESS_MARKER),
            startup_timeout_ms: DEFAULT_STARTUP_TIMEOUT_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            port_poll_interval_ms: DEFAULT_PORT_POLL_INTERVAL_MS,
            port_free_timeout_ms: DEFAULT_PORT_FREE_TIMEOUT_MS,
        }
    }
}

impl HarnessConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn port_poll_interval(&self) -> Duration {
        Duration::from_millis(self.port_poll_interval_ms)
    }

    pub fn port_free_timeout(&self) -> Duration {
        Duration::from_millis(self.port_free_timeout_ms)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.start_command.trim().is_empty() {
            return Err(ConfigError::harness("harness.start_command must not be empty"));
        }

        if self.readiness_marker.is_empty() {
            return Err(ConfigError::harness(
                "harness.readiness_marker must not be empty",
            ));
        }

        let timeouts = [
            ("startup_timeout_ms", self.startup_timeout_ms),
            ("probe_timeout_ms", self.probe_timeout_ms),
            ("probe_interval_ms", self.probe_interval_ms),
            ("grace_period_ms", self.grace_period_ms),
            ("shutdown_timeout_ms", self.shutdown_timeout_ms),
            ("port_poll_interval_ms", self.port_poll_interval_ms),
            ("port_free_timeout_ms", self.port_free_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::harness(format!("harness.{name} must be > 0")));
            }
        }

        if self.grace_period_ms >= self.shutdown_timeout_ms {
            return Err(ConfigError::harness(format!(
                "harness.grace_period_ms ({}) must be less than harness.shutdown_timeout_ms ({})",
                self.grace_period_ms, self.shutdown_timeout_ms
            )));
        }

        Ok(())
    }
}
