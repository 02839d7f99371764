// tests/integration_test.rs
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bumpv(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bumpv"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn project(config: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".bumpv.toml"), config).unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

const SIMPLE: &str = "[bumpv]\ncurrent_version = \"1.2.3\"\nfiles = [\"VERSION\"]\n";

#[test]
fn test_bumpv_help() {
    let dir = TempDir::new().unwrap();
    let output = bumpv(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("bumpv"));
    assert!(stdout.contains("Bump a version number"));
}

#[test]
fn test_bumpv_version() {
    let dir = TempDir::new().unwrap();
    let output = bumpv(dir.path(), &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_bump_prints_json() {
    let dir = project(SIMPLE, &[("VERSION", "1.2.3\n")]);
    let output = bumpv(dir.path(), &["bump", "patch", "--allow-dirty"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["old_version"], "1.2.3");
    assert_eq!(result["new_version"], "1.2.4");
    assert!(result["tag"].is_null());
    assert_eq!(fs::read_to_string(dir.path().join("VERSION")).unwrap(), "1.2.4\n");
}

#[test]
fn test_bump_prints_yaml() {
    let dir = project(SIMPLE, &[("VERSION", "1.2.3\n")]);
    let output = bumpv(dir.path(), &["bump", "minor", "--allow-dirty", "-o", "yaml"]);

    assert!(output.status.success());
    let result: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(result["new_version"].as_str(), Some("1.3.0"));
}

#[test]
fn test_dry_run_changes_nothing() {
    let dir = project(SIMPLE, &[("VERSION", "1.2.3\n")]);
    let output = bumpv(dir.path(), &["bump", "major", "--allow-dirty", "--dry-run", "-v"]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Would change file"));
    assert!(stderr.contains("+2.0.0"));
    assert_eq!(fs::read_to_string(dir.path().join("VERSION")).unwrap(), "1.2.3\n");
    assert_eq!(fs::read_to_string(dir.path().join(".bumpv.toml")).unwrap(), SIMPLE);
}

#[test]
fn test_custom_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("release.toml"), SIMPLE).unwrap();
    fs::write(dir.path().join("VERSION"), "1.2.3\n").unwrap();

    let output = bumpv(
        dir.path(),
        &["bump", "patch", "--allow-dirty", "--config-file", "release.toml"],
    );
    assert!(output.status.success());
    assert!(fs::read_to_string(dir.path().join("release.toml"))
        .unwrap()
        .contains("\"1.2.4\""));
}

#[test]
fn test_new_version_override() {
    let dir = project(SIMPLE, &[("VERSION", "1.2.3\n")]);
    let output = bumpv(
        dir.path(),
        &["bump", "patch", "--allow-dirty", "--new-version", "4.0.0"],
    );

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(dir.path().join("VERSION")).unwrap(), "4.0.0\n");
}

#[test]
fn test_missing_target_exits_with_one() {
    let dir = project(SIMPLE, &[("VERSION", "no version here\n")]);
    let output = bumpv(dir.path(), &["bump", "patch", "--allow-dirty"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid target file"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_config_exits_with_two() {
    let dir = TempDir::new().unwrap();
    let output = bumpv(dir.path(), &["bump", "patch"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains(".bumpv.toml"));
}

#[test]
fn test_unknown_part_exits_with_three() {
    let dir = project(SIMPLE, &[("VERSION", "1.2.3\n")]);
    let output = bumpv(dir.path(), &["bump", "build", "--allow-dirty"]);

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("major, minor, patch"));
}

#[test]
fn test_init_then_bump() {
    let dir = TempDir::new().unwrap();

    let output = bumpv(dir.path(), &["init", "--current-version", "0.9.0"]);
    assert!(output.status.success());
    assert!(dir.path().join(".bumpv.toml").exists());

    let output = bumpv(dir.path(), &["init"]);
    assert_eq!(output.status.code(), Some(2));

    let output = bumpv(dir.path(), &["bump", "minor", "--allow-dirty"]);
    assert!(output.status.success());
    let config = fs::read_to_string(dir.path().join(".bumpv.toml")).unwrap();
    assert!(config.contains("current_version = \"0.10.0\""));
}
