//! Integration tests for the `mlstart` binary.
//!
//! Every case here fails (or stops) before the templating tool is needed, so
//! the suite runs without Copier or Python installed. Each test gets its own
//! temporary directory and a scrubbed environment for the variables the
//! binary reads.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

/// `mlstart` with cwd `dir` and no ambient mlstart configuration.
fn mlstart(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mlstart"));
    cmd.current_dir(dir)
        .env_remove("MLCORE_LOCAL_PATH")
        .env_remove("MLSTART_TEMPLATE_PATH")
        .env_remove("ML_PROJECT_TEMPLATE_PATH")
        .env_remove("MLSTART_AUDIT_LOG")
        .env_remove("RUST_LOG")
        .env("MLSTART_CACHE_DIR", dir.join(".cache"));
    cmd
}

/// `<tmp>/ml-project-template` with a copier.yml.
fn template_in(dir: &Path) -> std::path::PathBuf {
    let template = dir.join("ml-project-template");
    fs::create_dir_all(&template).unwrap();
    fs::write(template.join("copier.yml"), "_subdirectory: template\n").unwrap();
    template
}

#[test]
fn help_lists_new_command() {
    let tmp = tempfile::tempdir().unwrap();
    mlstart(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("new"));
}

#[test]
fn new_help_documents_override_flag() {
    let tmp = tempfile::tempdir().unwrap();
    mlstart(tmp.path())
        .args(["new", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--mlcore-path"))
        .stdout(predicate::str::contains("--skip-venv"))
        .stdout(predicate::str::contains("remote"));
}

#[test]
fn unknown_source_is_rejected_with_choices() {
    let tmp = tempfile::tempdir().unwrap();
    mlstart(tmp.path())
        .args(["new", "--name", "demo", "--source", "svn"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("local"))
        .stderr(predicate::str::contains("remote"));
}

#[test]
fn template_checkout_in_working_directory_is_detected() {
    let tmp = tempfile::tempdir().unwrap();
    template_in(tmp.path());
    fs::create_dir_all(tmp.path().join("my_new_project")).unwrap();
    mlstart(tmp.path())
        .args(["new", "--name", "my-new-project", "--mlcore-path", "none"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("error: [target]"));
}

#[test]
fn missing_name_is_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    mlstart(tmp.path())
        .arg("new")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error: [params]"))
        .stderr(predicate::str::contains("--name is required"));
}

#[test]
fn name_starting_with_digit_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    template_in(tmp.path());
    mlstart(tmp.path())
        .args(["new", "--name", "2fast", "--template-path", "ml-project-template"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("must not start with a digit"));
}

#[test]
fn local_mode_without_template_is_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    mlstart(tmp.path())
        .args(["new", "--name", "demo"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no template found"));
}

#[test]
fn existing_target_is_path_conflict() {
    let tmp = tempfile::tempdir().unwrap();
    template_in(tmp.path());
    let target = tmp.path().join("my_new_project");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("notes.txt"), "keep me").unwrap();

    mlstart(tmp.path())
        .args([
            "new",
            "--name",
            "my-new-project",
            "--template-path",
            "ml-project-template",
            "--mlcore-path",
            "none",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("error: [target]"))
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(target.join("notes.txt")).unwrap(), "keep me");
    assert_eq!(fs::read_dir(&target).unwrap().count(), 1);
    assert!(!tmp.path().join(".cache").exists());
}

#[test]
fn missing_mlcore_path_fails_before_rendering() {
    let tmp = tempfile::tempdir().unwrap();
    template_in(tmp.path());
    mlstart(tmp.path())
        .args([
            "new",
            "--name",
            "demo",
            "--template-path",
            "ml-project-template",
            "--mlcore-path",
            "../definitely-missing-mlcore",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("mlcore path not found"));
    assert!(!tmp.path().join("demo").exists());
}

#[test]
fn missing_mlcore_from_environment_is_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    template_in(tmp.path());
    mlstart(tmp.path())
        .args(["new", "--name", "demo", "--template-path", "ml-project-template"])
        .env("MLCORE_LOCAL_PATH", tmp.path().join("nowhere"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("MLCORE_LOCAL_PATH not found"));
}
