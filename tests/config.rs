// ABOUTME: Tests for configuration discovery and parsing.
// ABOUTME: Uses temp directories to exercise the file candidates.

use stackdock::catalog::Profile;
use stackdock::config::Config;
use std::time::Duration;
use tempfile::TempDir;

/// Test: with no config file anywhere, discovery falls back to defaults.
#[test]
fn discover_defaults_without_a_file() {
    let dir = TempDir::new().unwrap();

    let config = Config::discover(dir.path()).unwrap();

    assert_eq!(config.profile, Profile::Community72);
    assert!(!config.expose_ports);
    assert_eq!(config.poll_interval, Duration::from_millis(1500));
}

/// Test: stackdock.yml in the directory is picked up.
#[test]
fn discover_finds_yml() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("stackdock.yml"), "expose_ports: true\n").unwrap();

    let config = Config::discover(dir.path()).unwrap();
    assert!(config.expose_ports);
}

/// Test: the .stackdock/config.yml fallback works too.
#[test]
fn discover_finds_dotdir_config() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join(".stackdock")).unwrap();
    std::fs::write(
        dir.path().join(".stackdock/config.yml"),
        "poll_interval: 5s\n",
    )
    .unwrap();

    let config = Config::discover(dir.path()).unwrap();
    assert_eq!(config.poll_interval, Duration::from_secs(5));
}

/// Test: stackdock.yml wins over the dot-directory candidate.
#[test]
fn yml_takes_precedence_over_dotdir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("stackdock.yml"), "expose_ports: true\n").unwrap();
    std::fs::create_dir(dir.path().join(".stackdock")).unwrap();
    std::fs::write(
        dir.path().join(".stackdock/config.yml"),
        "expose_ports: false\n",
    )
    .unwrap();

    let config = Config::discover(dir.path()).unwrap();
    assert!(config.expose_ports);
}

/// Test: malformed YAML is an error, not a silent default.
#[test]
fn malformed_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("stackdock.yml"), "expose_ports: [oops\n").unwrap();

    assert!(Config::discover(dir.path()).is_err());
}
