use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_options_and_commands() {
    cargo_bin_cmd!("broterm")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--theme"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_config_help_shows_subcommands() {
    cargo_bin_cmd!("broterm")
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("broterm")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_tui_refuses_without_terminal() {
    let dir = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("broterm")
        .env("BROTERM_HOME", dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a terminal"));
}

#[test]
fn test_unknown_theme_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cargo_bin_cmd!("broterm")
        .env("BROTERM_HOME", dir.path())
        .args(["--theme", "neon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown theme 'neon'"));
}
