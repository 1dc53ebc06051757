use crate::LaunchCommand;

use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn given_args_with_spaces_when_display_then_quoted() {
    let command = LaunchCommand::new("node").args(["server.js", "--name", "my server"]);

    assert_that!(command.display(), eq("node server.js --name \"my server\""));
}

#[cfg(unix)]
#[test]
fn given_shell_command_when_built_then_runs_through_sh() {
    let command = LaunchCommand::shell("npm start");

    assert_that!(command.program(), eq("sh"));
    assert_that!(command.display(), eq("sh -c \"npm start\""));
}

#[cfg(unix)]
#[tokio::test]
async fn given_env_and_dir_when_spawned_then_child_sees_them() {
    // Given
    let dir = std::env::temp_dir();
    let command = LaunchCommand::shell("printf '%s:%s' \"$WH_PROBE\" \"$(pwd)\"")
        .env("WH_PROBE", "value")
        .current_dir(&dir);

    // When
    let output = command.to_command().output().await.unwrap();

    // Then
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("value:"), "unexpected output: {stdout}");
}
