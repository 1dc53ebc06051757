#![allow(dead_code)]

use std::time::Duration;

use wh_config::{HarnessConfig, RetryConfig};
use wh_harness::{HealthProber, ServerEndpoint};
use wiremock::MockServer;

pub const MARKER: &str = "Server running";

/// A port nothing listens on: bind an ephemeral port and release it.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Short timings so failure scenarios finish quickly.
pub fn fast_harness(startup_timeout_ms: u64) -> HarnessConfig {
    HarnessConfig {
        readiness_marker: MARKER.to_string(),
        startup_timeout_ms,
        probe_timeout_ms: 500,
        probe_interval_ms: 50,
        grace_period_ms: 300,
        shutdown_timeout_ms: 2000,
        port_poll_interval_ms: 50,
        port_free_timeout_ms: 1000,
        ..HarnessConfig::default()
    }
}

pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay_ms: 10,
        max_delay_ms: 50,
        backoff_multiplier: 2.0,
    }
}

/// Endpoint whose port is unused but whose probes go to the mock server.
pub fn endpoint_for(server: &MockServer) -> ServerEndpoint {
    ServerEndpoint::new("127.0.0.1", free_port(), "/health").with_base_url(server.uri())
}

pub fn prober_for(server: &MockServer) -> HealthProber {
    HealthProber::new(
        format!("{}/health", server.uri()),
        Duration::from_millis(500),
    )
    .unwrap()
}
