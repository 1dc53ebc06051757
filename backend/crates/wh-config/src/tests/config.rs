use crate::Config;
use crate::tests::{EnvGuard, setup_config_dir};

use googletest::assert_that;
use googletest::prelude::{anything, contains_substring, eq, err, none, ok, some};
use serial_test::serial;

// =========================================================================
// Loading - Defaults and TOML
// =========================================================================

#[test]
#[serial]
fn given_no_config_file_when_load_then_defaults_used() {
    // Given
    let (_temp, _guards) = setup_config_dir();

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(4000));
    assert_that!(config.server.health_path.as_str(), eq("/health"));
    assert_that!(config.harness.readiness_marker.as_str(), eq("Server running"));
    assert_that!(config.harness.startup_timeout_ms, eq(4000));
    assert_that!(config.harness.grace_period_ms, eq(2000));
    assert_that!(config.retry.max_attempts, eq(3));
    assert_that!(config.webhook.secret, none());
    assert_that!(config.validate(), ok(anything()));
}

#[test]
#[serial]
fn given_missing_config_dir_when_load_then_directory_created() {
    // Given
    let (temp, _guards) = setup_config_dir();
    let nested = temp.path().join("nested").join(".wh");
    let _dir = EnvGuard::set("WH_CONFIG_DIR", nested.to_str().unwrap());

    // When
    let result = Config::load();

    // Then
    assert_that!(result, ok(anything()));
    assert!(nested.is_dir());
}

#[test]
#[serial]
fn given_toml_file_when_load_then_values_applied() {
    // Given
    let (temp, _guards) = setup_config_dir();
    std::fs::write(
        temp.path().join("config.toml"),
        r#"
[server]
port = 4100
health_path = "/status"

[harness]
start_command = "node server.js"
readiness_marker = "Listening"
grace_period_ms = 1500

[retry]
max_attempts = 5
"#,
    )
    .unwrap();

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(4100));
    assert_that!(config.server.health_url(), eq("http://127.0.0.1:4100/status"));
    assert_that!(config.harness.start_command.as_str(), eq("node server.js"));
    assert_that!(config.harness.readiness_marker.as_str(), eq("Listening"));
    assert_that!(config.harness.grace_period_ms, eq(1500));
    // Unspecified fields keep their defaults
    assert_that!(config.harness.shutdown_timeout_ms, eq(5000));
    assert_that!(config.retry.max_attempts, eq(5));
}

#[test]
#[serial]
fn given_malformed_toml_when_load_then_error_mentions_file() {
    // Given
    let (temp, _guards) = setup_config_dir();
    std::fs::write(temp.path().join("config.toml"), "this is not valid toml {{{{").unwrap();

    // When
    let result = Config::load();

    // Then
    assert_that!(result, err(anything()));
    let err_msg = format!("{}", result.unwrap_err());
    assert_that!(err_msg, contains_substring("config.toml"));
}

// =========================================================================
// Environment Overrides
// =========================================================================

#[test]
#[serial]
fn given_wh_env_vars_when_load_then_override_file() {
    // Given
    let (temp, _guards) = setup_config_dir();
    std::fs::write(temp.path().join("config.toml"), "[server]\nport = 4100\n").unwrap();
    let _port = EnvGuard::set("WH_SERVER_PORT", "4200");
    let _command = EnvGuard::set("WH_START_COMMAND", "npm start");
    let _timeout = EnvGuard::set("WH_STARTUP_TIMEOUT_MS", "9000");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(4200));
    assert_that!(config.harness.start_command.as_str(), eq("npm start"));
    assert_that!(config.harness.startup_timeout_ms, eq(9000));
}

#[test]
#[serial]
fn given_conventional_env_vars_when_load_then_applied() {
    // Given
    let (_temp, _guards) = setup_config_dir();
    let _port = EnvGuard::set("PORT", "4300");
    let _url = EnvGuard::set("SERVER_URL", "http://localhost:4300/");
    let _env = EnvGuard::set("NODE_ENV", "production");
    let _secret = EnvGuard::set("GITHUB_WEBHOOK_SECRET", "s3cret");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(4300));
    assert_that!(config.server.base_url(), eq("http://localhost:4300"));
    assert_that!(config.server.environment.as_str(), eq("production"));
    assert_that!(config.webhook.secret, some(eq("s3cret")));
}

#[test]
#[serial]
fn given_both_port_vars_when_load_then_wh_name_wins() {
    // Given
    let (_temp, _guards) = setup_config_dir();
    let _port = EnvGuard::set("PORT", "4300");
    let _wh_port = EnvGuard::set("WH_SERVER_PORT", "4400");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(4400));
}

#[test]
#[serial]
fn given_unparseable_env_value_when_load_then_previous_value_kept() {
    // Given
    let (_temp, _guards) = setup_config_dir();
    let _port = EnvGuard::set("WH_SERVER_PORT", "not-a-port");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(4000));
}

#[test]
#[serial]
fn given_empty_secret_env_when_load_then_secret_unset() {
    // Given
    let (_temp, _guards) = setup_config_dir();
    let _secret = EnvGuard::set("WH_WEBHOOK_SECRET", "");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.webhook.secret, none());
}

// =========================================================================
// Logging
// =========================================================================

#[test]
#[serial]
fn given_log_file_with_traversal_when_validate_then_error() {
    // Given
    let (_temp, _guards) = setup_config_dir();
    let _file = EnvGuard::set("WH_LOG_FILE", "../../etc/harness.log");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_log_file_when_log_file_path_then_under_config_dir() {
    // Given
    let (temp, _guards) = setup_config_dir();
    let _file = EnvGuard::set("WH_LOG_FILE", "harness.log");

    // When
    let config = Config::load().unwrap();
    let path = config.log_file_path().unwrap();

    // Then
    assert_that!(
        path,
        some(eq(&temp.path().join("log").join("harness.log")))
    );
}
