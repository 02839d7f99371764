// tests/bump_test.rs
use bumpv::{BumpClient, BumpOptions, BumpResult, BumpvError, Configuration};
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project(config: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".bumpv.toml"), config).unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn bump(dir: &Path, part: &str) -> bumpv::Result<BumpResult> {
    let config = Configuration::discover(dir)?;
    let mut client = BumpClient::with_vcs(config, BumpOptions::default(), None)?;
    client.bump(part)
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
#[serial]
fn test_bump_semver_parts() {
    let dir = project(
        "[bumpv]\ncurrent_version = \"1.2.3\"\nfiles = [\"VERSION\"]\n",
        &[("VERSION", "1.2.3")],
    );

    bump(dir.path(), "patch").unwrap();
    assert_eq!(read(dir.path(), "VERSION"), "1.2.4");
    bump(dir.path(), "minor").unwrap();
    assert_eq!(read(dir.path(), "VERSION"), "1.3.0");
    bump(dir.path(), "major").unwrap();
    assert_eq!(read(dir.path(), "VERSION"), "2.0.0");

    let config = Configuration::discover(dir.path()).unwrap();
    assert_eq!(config.current_version(), Some("2.0.0"));
}

#[test]
#[serial]
fn test_values_part_progression() {
    let dir = project(
        r#"[bumpv]
current_version = "1.alpha"
parse = '(?P<num>\d+)(\.(?P<release>.*))?'
serialize = ["{num}.{release}", "{num}"]
files = ["VERSION"]

[part.release]
optional_value = "gamma"
values = ["alpha", "beta", "gamma"]
"#,
        &[("VERSION", "1.alpha")],
    );

    bump(dir.path(), "release").unwrap();
    assert_eq!(read(dir.path(), "VERSION"), "1.beta");

    let result = bump(dir.path(), "release").unwrap();
    assert_eq!(result.old_version, "1.beta");
    assert_eq!(result.new_version, "1.gamma");
    assert_eq!(read(dir.path(), "VERSION"), "1.gamma");
}

#[test]
#[serial]
fn test_exhausted_values_leave_files_alone() {
    let config = r#"[bumpv]
current_version = "1.5.gamma"
parse = '(?P<major>\d+)\.(?P<minor>\d+)(\.(?P<release>[a-z]+))?'
serialize = ["{major}.{minor}.{release}", "{major}.{minor}"]
files = ["VERSION"]

[part.release]
values = ["dev", "gamma"]
"#;
    let dir = project(config, &[("VERSION", "1.5.gamma")]);

    let err = bump(dir.path(), "release").unwrap_err();
    assert!(matches!(err, BumpvError::ExhaustedValues { .. }));
    assert_eq!(read(dir.path(), "VERSION"), "1.5.gamma");
    assert_eq!(read(dir.path(), ".bumpv.toml"), config);
}

#[test]
#[serial]
fn test_unknown_part() {
    let dir = project("[bumpv]\ncurrent_version = \"1.2.3\"\n", &[]);
    let err = bump(dir.path(), "build").unwrap_err();
    assert!(matches!(err, BumpvError::UnknownVersionPart { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
#[serial]
fn test_unparsable_current_version() {
    let dir = project("[bumpv]\ncurrent_version = \"one.two\"\n", &[]);
    assert!(matches!(
        bump(dir.path(), "patch"),
        Err(BumpvError::Parse { .. })
    ));
}

#[test]
#[serial]
fn test_part_first_value() {
    let dir = project(
        "[bumpv]\ncurrent_version = \"0.9.4\"\nfiles = [\"VERSION\"]\n\n[part.minor]\nfirst_value = \"1\"\n",
        &[("VERSION", "0.9.4")],
    );

    bump(dir.path(), "major").unwrap();
    assert_eq!(read(dir.path(), "VERSION"), "1.1.0");
}

#[test]
#[serial]
fn test_multiple_serialize_formats() {
    let config = r#"[bumpv]
current_version = "0.9"
parse = '(?P<major>\d+)\.(?P<minor>\d+)(\.(?P<patch>\d+))?'
serialize = ["{major}.{minor}.{patch}", "{major}.{minor}"]
files = ["VERSION"]
"#;
    let dir = project(config, &[("VERSION", "0.9")]);
    bump(dir.path(), "minor").unwrap();
    assert_eq!(read(dir.path(), "VERSION"), "0.10.0");

    let dir = project(&config.replace("\"0.9\"", "\"0.7\""), &[("VERSION", "0.7")]);
    bump(dir.path(), "patch").unwrap();
    assert_eq!(read(dir.path(), "VERSION"), "0.7.1");
}

#[test]
#[serial]
fn test_prefixed_version() {
    let dir = project(
        r#"[bumpv]
current_version = "Version: 0.9"
parse = 'Version:\ (?P<major>\d+)(\.(?P<minor>\d+)(\.(?P<patch>\d+))?)?'
serialize = ["Version: {major}.{minor}.{patch}", "Version: {major}.{minor}", "Version: {major}"]
files = ["VERSION"]
"#,
        &[("VERSION", "Version: 0.9")],
    );

    bump(dir.path(), "major").unwrap();
    assert_eq!(read(dir.path(), "VERSION"), "Version: 1.0.0");
}

#[test]
#[serial]
fn test_multi_file_formats() {
    std::env::set_var("BUILD_NUMBER", "838");
    let dir = project(
        r#"[bumpv]
current_version = "1.6.6"
files = ["VERSION"]

[file."README.txt"]
serialize = "{major}.{minor}"

[file."BUILD"]
serialize = "{major}.{minor}.{patch}+{$BUILD_NUMBER}"
"#,
        &[
            ("VERSION", "1.6.6\n"),
            ("README.txt", "MyAwesomeSoftware(TM) v1.6\n"),
            ("BUILD", "1.6.6+838\n"),
        ],
    );

    let result = bump(dir.path(), "minor");
    std::env::remove_var("BUILD_NUMBER");
    assert_eq!(result.unwrap().new_version, "1.7.0");

    assert_eq!(read(dir.path(), "VERSION"), "1.7.0\n");
    assert_eq!(read(dir.path(), "README.txt"), "MyAwesomeSoftware(TM) v1.7\n");
    assert_eq!(read(dir.path(), "BUILD"), "1.7.0+838\n");
}

#[test]
#[serial]
fn test_file_specific_serialize() {
    let config = r#"[bumpv]
current_version = "14-chocolate"
parse = '(?P<major>\d+)(-(?P<flavor>[a-z]+))?'
serialize = ["{major}-{flavor}", "{major}"]

[file."icecream.txt"]
serialize = "{major}-{flavor}"

[file."cake.txt"]
serialize = "{major}"

[part.flavor]
values = ["vanilla", "chocolate", "strawberry"]
"#;
    let dir = project(config, &[("icecream.txt", "14-chocolate"), ("cake.txt", "14")]);

    bump(dir.path(), "flavor").unwrap();
    assert_eq!(read(dir.path(), "icecream.txt"), "14-strawberry");
    assert_eq!(read(dir.path(), "cake.txt"), "14");

    bump(dir.path(), "major").unwrap();
    assert_eq!(read(dir.path(), "icecream.txt"), "15-vanilla");
    assert_eq!(read(dir.path(), "cake.txt"), "15");
}

#[test]
#[serial]
fn test_changelog_with_date() {
    let dir = project(
        r#"[bumpv]
current_version = "8.1.1"

[file."CHANGELOG.md"]
search = """
Unreleased
----------"""
replace = """
Unreleased
----------

Version v{new_version} ({now:%Y-%m-%d})
---------------------------"""
"#,
        &[(
            "CHANGELOG.md",
            "My awesome software project Changelog\n\nUnreleased\n----------\n\n* Some nice feature\n",
        )],
    );

    bump(dir.path(), "minor").unwrap();
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert_eq!(
        read(dir.path(), "CHANGELOG.md"),
        format!(
            "My awesome software project Changelog\n\nUnreleased\n----------\n\nVersion v8.2.0 ({})\n---------------------------\n\n* Some nice feature\n",
            today
        )
    );
}

#[test]
#[serial]
fn test_multiline_search() {
    let dir = project(
        r#"[bumpv]
current_version = "9.8.7"

[file."MULTILINE"]
search = "A\nB\nC"
replace = "A\nB\nC\n{new_version}"
"#,
        &[("MULTILINE", "A\nB\nC\n")],
    );

    bump(dir.path(), "major").unwrap();
    assert_eq!(read(dir.path(), "MULTILINE"), "A\nB\nC\n10.0.0\n");
}

#[test]
#[serial]
fn test_nonexistent_file_modifies_nothing() {
    let config = "[bumpv]\ncurrent_version = \"1.2.3\"\nfiles = [\"VERSION\", \"missing.txt\"]\n";
    let dir = project(config, &[("VERSION", "1.2.3\n")]);

    let err = bump(dir.path(), "patch").unwrap_err();
    assert!(matches!(err, BumpvError::InvalidTargetFile { .. }));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(read(dir.path(), "VERSION"), "1.2.3\n");
    assert_eq!(read(dir.path(), ".bumpv.toml"), config);
}

#[test]
#[serial]
fn test_dry_run_is_byte_identical() {
    let config = "[bumpv]\ncurrent_version = \"1.2.3\"\nfiles = [\"VERSION\"]\n";
    let dir = project(config, &[("VERSION", "version 1.2.3\n")]);

    let configuration = Configuration::discover(dir.path()).unwrap();
    let options = BumpOptions {
        dry_run: true,
        ..Default::default()
    };
    let mut client = BumpClient::with_vcs(configuration, options, None).unwrap();
    let result = client.bump("major").unwrap();

    assert_eq!(result.new_version, "2.0.0");
    assert_eq!(read(dir.path(), "VERSION"), "version 1.2.3\n");
    assert_eq!(read(dir.path(), ".bumpv.toml"), config);
}
