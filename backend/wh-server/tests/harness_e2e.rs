#![cfg(unix)]

//! Drives the real `wh-server` binary through the harness.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use googletest::assert_that;
use googletest::prelude::eq;
use wh_config::{Config, HarnessConfig, RetryConfig};
use wh_harness::{
    Assertion, HarnessError, HarnessResult, HealthAssertion, HealthProber, LaunchCommand,
    Orchestrator, PortWaiter, ServerEndpoint, ShutdownCoordinator,
};
use wh_server::{SIGNATURE_HEADER, sign};

const SECRET: &str = "e2e-secret";

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn server_command(port: u16, config_dir: &Path) -> LaunchCommand {
    LaunchCommand::new(env!("CARGO_BIN_EXE_wh-server"))
        .env("WH_CONFIG_DIR", config_dir.display().to_string())
        .env("WH_SERVER_HOST", "127.0.0.1")
        .env("WH_SERVER_PORT", port.to_string())
        .env("WH_ENVIRONMENT", "test")
        .env("WH_WEBHOOK_SECRET", SECRET)
        .env("WH_LOG_COLORED", "false")
        .current_dir(config_dir)
}

fn harness() -> HarnessConfig {
    HarnessConfig {
        readiness_marker: "Server running on port".to_string(),
        startup_timeout_ms: 15_000,
        probe_interval_ms: 100,
        grace_period_ms: 2000,
        shutdown_timeout_ms: 5000,
        port_poll_interval_ms: 100,
        port_free_timeout_ms: 5000,
        ..HarnessConfig::default()
    }
}

/// Health must pass, then a signed webhook is accepted and a forged one rejected.
struct SignedWebhookAssertion;

#[async_trait]
impl Assertion for SignedWebhookAssertion {
    fn name(&self) -> &str {
        "signed-webhook"
    }

    async fn verify(&self, endpoint: &ServerEndpoint, prober: &HealthProber) -> HarnessResult<()> {
        HealthAssertion.verify(endpoint, prober).await?;

        let url = format!("{}/webhook", endpoint.base_url);
        let client = reqwest::Client::new();
        let payload = r#"{"action":"opened"}"#;

        let signed = client
            .post(&url)
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, sign(SECRET, payload.as_bytes()).unwrap())
            .body(payload)
            .send()
            .await?;
        if signed.status().as_u16() != 200 {
            return Err(HarnessError::health_check(format!(
                "signed webhook returned {}",
                signed.status()
            )));
        }

        let forged = client
            .post(&url)
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, sign("forged", payload.as_bytes()).unwrap())
            .body(payload)
            .send()
            .await?;
        if forged.status().as_u16() != 401 {
            return Err(HarnessError::health_check(format!(
                "forged webhook returned {}",
                forged.status()
            )));
        }

        Ok(())
    }
}

#[tokio::test]
async fn given_real_server_when_harness_runs_then_passes_and_releases_port() {
    // Given
    let config_dir = tempfile::tempdir().unwrap();
    let port = free_port();
    let orchestrator = Orchestrator::new(
        harness(),
        RetryConfig::default(),
        ServerEndpoint::new("127.0.0.1", port, "/health"),
        server_command(port, config_dir.path()),
        ShutdownCoordinator::new(),
    );

    // When
    let report = orchestrator.run().await;

    // Then
    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_that!(report.exit_code(), eq(0));
    let waiter = PortWaiter::new(Duration::from_millis(100));
    assert!(waiter.is_port_free("127.0.0.1", port).await);
}

#[tokio::test]
async fn given_real_server_when_webhook_assertion_runs_then_signatures_enforced() {
    // Given
    let config_dir = tempfile::tempdir().unwrap();
    let port = free_port();
    let orchestrator = Orchestrator::new(
        harness(),
        RetryConfig::default(),
        ServerEndpoint::new("127.0.0.1", port, "/health"),
        server_command(port, config_dir.path()),
        ShutdownCoordinator::new(),
    )
    .with_assertion(SignedWebhookAssertion);

    // When
    let report = orchestrator.run().await;

    // Then
    assert!(report.is_success(), "failures: {:?}", report.failures);
}

#[tokio::test]
async fn given_port_only_in_config_when_run_from_config_then_server_binds_it() {
    // Given
    let config_dir = tempfile::tempdir().unwrap();
    let port = free_port();
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config.harness = harness();
    config.harness.start_command = format!(
        "cd '{dir}' && WH_CONFIG_DIR='{dir}' WH_LOG_COLORED=false exec '{bin}'",
        dir = config_dir.path().display(),
        bin = env!("CARGO_BIN_EXE_wh-server"),
    );

    // When
    let report = Orchestrator::from_config(&config, ShutdownCoordinator::new())
        .run()
        .await;

    // Then
    assert!(report.is_success(), "failures: {:?}", report.failures);
    let waiter = PortWaiter::new(Duration::from_millis(100));
    assert!(waiter.is_port_free("127.0.0.1", port).await);
}
