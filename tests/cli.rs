//! End-to-end tests for the libpack binary

use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::thread;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;

fn libpack(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("libpack").unwrap();
    cmd.current_dir(dir).env("NO_COLOR", "1");
    cmd
}

fn write(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    libpack(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn watch_help_lists_hooks() {
    let dir = tempfile::tempdir().unwrap();
    libpack(dir.path())
        .args(["watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--on-first-success"))
        .stdout(predicate::str::contains("--on-success"))
        .stdout(predicate::str::contains("--on-failure"));
}

#[test]
fn build_without_entries_fails() {
    let dir = tempfile::tempdir().unwrap();
    libpack(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No entry points found"));
}

#[test]
fn build_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/index.ts", "export const x = 1;");

    libpack(dir.path())
        .args(["build", "--format", "cjs,amd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown module format 'amd'"));
}

#[cfg(unix)]
#[test]
fn build_runs_configured_bundler() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/index.ts", "export const x = 1;");
    write(dir.path(), "package.json", r#"{"name": "@acme/widgets"}"#);
    write(dir.path(), "dist/stale.js", "old");
    write(
        dir.path(),
        "libpack.toml",
        r#"
[bundler]
command = "sh"
args = ["-c", "mkdir -p dist && echo built > \"$0\"", "{output}"]
env_args = []
minify_args = []
sourcemap_args = []
"#,
    );

    libpack(dir.path()).arg("build").assert().success();

    let dist = dir.path().join("dist");
    assert!(!dist.join("stale.js").exists());
    assert!(dist.join("widgets.cjs.development.js").is_file());
    assert!(dist.join("widgets.cjs.production.min.js").is_file());
    assert!(dist.join("widgets.esm.js").is_file());

    let shim = fs::read_to_string(dist.join("index.js")).unwrap();
    assert!(shim.contains("./widgets.cjs.production.min.js"));
}

#[cfg(unix)]
#[test]
fn build_failure_names_unit_and_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/index.ts", "export const x = ;");
    write(
        dir.path(),
        "libpack.toml",
        r#"
[bundler]
command = "sh"
args = ["-c", "echo 'Unexpected token' >&2; exit 2"]
env_args = []
minify_args = []
sourcemap_args = []
"#,
    );

    libpack(dir.path())
        .args(["build", "--format", "esm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("src/index.ts (esm)"))
        .stderr(predicate::str::contains("Unexpected token"));
}

#[cfg(unix)]
#[test]
fn no_clean_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/index.js", "export const x = 1;");
    write(dir.path(), "dist/keep.txt", "keep");
    write(
        dir.path(),
        "libpack.toml",
        r#"
[bundler]
command = "true"
args = []
"#,
    );

    libpack(dir.path())
        .args(["build", "--format", "es", "--no-clean"])
        .assert()
        .success();

    assert!(dir.path().join("dist/keep.txt").is_file());
}

#[cfg(unix)]
#[test]
fn watch_builds_and_runs_first_success_hook() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/index.ts", "export const x = 1;");
    write(
        dir.path(),
        "libpack.toml",
        r#"
[bundler]
command = "true"
args = []
"#,
    );

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("libpack"))
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .args(["watch", "--format", "esm", "--on-first-success", "touch hooked"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let hooked = dir.path().join("hooked");
    let mut seen = false;
    for _ in 0..100 {
        if hooked.exists() {
            seen = true;
            break;
        }
        thread::sleep(Duration::from_millis(100));
    }

    child.kill().unwrap();
    child.wait().unwrap();
    assert!(seen, "first-success hook did not run");
}

#[cfg(unix)]
#[test]
fn build_relocation_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/index.ts", "export const x = 1;");
    // A directory where the relocated declaration file has to go
    write(
        dir.path(),
        "libpack.toml",
        r#"
[bundler]
command = "sh"
args = ["-c", "mkdir -p dist/src dist/types.d.ts && echo x > dist/src/types.d.ts"]
env_args = []
minify_args = []
sourcemap_args = []
"#,
    );

    libpack(dir.path())
        .args(["build", "--format", "esm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to move type declarations"))
        .stderr(predicate::str::contains("Failed to relocate build metadata"));
}
