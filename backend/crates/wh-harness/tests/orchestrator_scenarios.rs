#![cfg(unix)]

mod common;

use common::{endpoint_for, fast_harness, fast_retry, free_port};

use std::time::{Duration, Instant};

use googletest::assert_that;
use googletest::prelude::{eq, some};
use wh_config::Config;
use wh_harness::{
    HarnessState, LaunchCommand, Orchestrator, ServerEndpoint, ShutdownCoordinator,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const READY_THEN_IDLE: &str = "echo \"Server running on port 4000\"; exec sleep 30";

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

// =========================================================================
// Happy path
// =========================================================================

#[tokio::test]
async fn given_marker_and_healthy_endpoint_when_run_then_exit_zero() {
    // Given
    let server = healthy_server().await;
    let orchestrator = Orchestrator::new(
        fast_harness(3000),
        fast_retry(3),
        endpoint_for(&server),
        LaunchCommand::shell(READY_THEN_IDLE),
        ShutdownCoordinator::new(),
    );
    let states = orchestrator.subscribe();

    // When
    let report = orchestrator.run().await;

    // Then
    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_that!(report.exit_code(), eq(0));
    assert_that!(report.attempts, eq(1));
    assert_that!(*states.borrow(), eq(HarnessState::Done { success: true }));
}

#[tokio::test]
async fn given_configured_port_when_run_from_config_then_server_told_where_to_listen() {
    // Given
    let server = healthy_server().await;
    let port = free_port();
    let mut config = Config::default();
    config.server.port = port;
    config.server.base_url = Some(server.uri());
    config.harness = fast_harness(3000);
    config.harness.start_command =
        "echo \"Server running on port $PORT/$WH_SERVER_PORT\"; exec sleep 30".to_string();
    config.harness.readiness_marker = format!("Server running on port {port}/{port}");
    config.retry = fast_retry(1);

    // When
    let report = Orchestrator::from_config(&config, ShutdownCoordinator::new())
        .run()
        .await;

    // Then
    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_that!(report.attempts, eq(1));
}

// =========================================================================
// Launch failures
// =========================================================================

#[tokio::test]
async fn given_marker_never_printed_when_run_then_startup_timeout_after_all_attempts() {
    // Given
    let server = healthy_server().await;
    let orchestrator = Orchestrator::new(
        fast_harness(300),
        fast_retry(2),
        endpoint_for(&server),
        LaunchCommand::shell("exec sleep 30"),
        ShutdownCoordinator::new(),
    );

    // When
    let report = orchestrator.run().await;

    // Then
    assert_that!(report.exit_code(), eq(1));
    assert_that!(report.attempts, eq(2));
    let failure = report.failure_of_kind("StartupTimeout");
    assert_that!(
        failure.map(|f| f.state),
        some(eq(HarnessState::Launching { attempt: 2 }))
    );
}

#[tokio::test]
async fn given_marker_never_printed_when_launching_then_health_never_probed() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let orchestrator = Orchestrator::new(
        fast_harness(300),
        fast_retry(1),
        endpoint_for(&server),
        LaunchCommand::shell("echo booting; exec sleep 30"),
        ShutdownCoordinator::new(),
    );

    // When
    let report = orchestrator.run().await;

    // Then
    assert_that!(report.exit_code(), eq(1));
    server.verify().await;
}

#[tokio::test]
async fn given_process_exits_immediately_when_run_then_early_exit_reported() {
    // Given
    let server = healthy_server().await;
    let orchestrator = Orchestrator::new(
        fast_harness(3000),
        fast_retry(2),
        endpoint_for(&server),
        LaunchCommand::shell("exit 3"),
        ShutdownCoordinator::new(),
    );
    let started = Instant::now();

    // When
    let report = orchestrator.run().await;

    // Then
    assert_that!(report.exit_code(), eq(1));
    assert!(report.failure_of_kind("EarlyExit").is_some());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn given_missing_program_when_run_then_spawn_error_reported() {
    // Given
    let server = healthy_server().await;
    let orchestrator = Orchestrator::new(
        fast_harness(1000),
        fast_retry(1),
        endpoint_for(&server),
        LaunchCommand::new("/nonexistent/wh-missing-server"),
        ShutdownCoordinator::new(),
    );

    // When
    let report = orchestrator.run().await;

    // Then
    assert_that!(report.exit_code(), eq(1));
    assert!(report.failure_of_kind("SpawnError").is_some());
}

// =========================================================================
// Assertion and cleanup
// =========================================================================

#[tokio::test]
async fn given_endpoint_fails_after_launch_when_run_then_running_fails_and_cleanup_happens() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let orchestrator = Orchestrator::new(
        fast_harness(3000),
        fast_retry(3),
        endpoint_for(&server),
        LaunchCommand::shell(READY_THEN_IDLE),
        ShutdownCoordinator::new(),
    );
    let states = orchestrator.subscribe();

    // When
    let report = orchestrator.run().await;

    // Then
    assert_that!(report.exit_code(), eq(1));
    assert_that!(report.attempts, eq(1));
    let failure = report.failure_of_kind("HealthCheckFailure");
    assert_that!(failure.map(|f| f.state), some(eq(HarnessState::Running)));
    assert_that!(report.failures.len(), eq(1));
    assert_that!(*states.borrow(), eq(HarnessState::Done { success: false }));
}

#[tokio::test]
async fn given_port_held_by_leftover_process_when_run_then_port_wait_fails_without_launch() {
    // Given
    let server = healthy_server().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let endpoint = ServerEndpoint::new("127.0.0.1", port, "/health").with_base_url(server.uri());
    let orchestrator = Orchestrator::new(
        fast_harness(1000),
        fast_retry(1),
        endpoint,
        LaunchCommand::shell(READY_THEN_IDLE),
        ShutdownCoordinator::new(),
    );

    // When
    let report = orchestrator.run().await;

    // Then
    assert_that!(report.attempts, eq(0));
    let failure = report.failure_of_kind("PortStillBound");
    assert_that!(failure.map(|f| f.state), some(eq(HarnessState::PortWait)));
    drop(listener);
}

// =========================================================================
// Interruption
// =========================================================================

#[tokio::test]
async fn given_shutdown_during_launch_when_run_then_interrupted_and_process_stopped() {
    // Given
    let server = healthy_server().await;
    let coordinator = ShutdownCoordinator::new();
    let orchestrator = Orchestrator::new(
        fast_harness(10_000),
        fast_retry(3),
        endpoint_for(&server),
        LaunchCommand::shell("exec sleep 30"),
        coordinator.clone(),
    );

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        coordinator.shutdown();
    });
    let started = Instant::now();

    // When
    let report = orchestrator.run().await;

    // Then
    assert_that!(report.exit_code(), eq(1));
    let failure = report.failure_of_kind("Interrupted");
    assert_that!(
        failure.map(|f| f.state),
        some(eq(HarnessState::Launching { attempt: 1 }))
    );
    assert_that!(report.attempts, eq(1));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn given_shutdown_before_run_when_run_then_nothing_launched() {
    // Given
    let server = healthy_server().await;
    let coordinator = ShutdownCoordinator::new();
    coordinator.shutdown();
    let orchestrator = Orchestrator::new(
        fast_harness(1000),
        fast_retry(1),
        ServerEndpoint::new("127.0.0.1", free_port(), "/health").with_base_url(server.uri()),
        LaunchCommand::shell(READY_THEN_IDLE),
        coordinator,
    );

    // When
    let report = orchestrator.run().await;

    // Then
    assert_that!(report.attempts, eq(0));
    let failure = report.failure_of_kind("Interrupted");
    assert_that!(failure.map(|f| f.state), some(eq(HarnessState::PortWait)));
}
