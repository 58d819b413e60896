//! Shared integration-test helpers: fixture paths, scratch copies and a
//! runner for the `conftree` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use conftree::Node;
use conftree::source::Source;

/// Absolute path of a file under `tests/fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Fixture path as the string identifier the loaders take.
pub fn fixture_source(name: &str) -> String {
    fixture_path(name).display().to_string()
}

/// Loads a fixture without any validation.
#[allow(clippy::missing_panics_doc)]
pub fn load_fixture(name: &str) -> Node {
    Source::parse(&fixture_source(name))
        .load(None)
        .expect("fixture should load")
}

/// Writes `contents` to `name` inside `dir` and returns the identifier.
#[allow(clippy::missing_panics_doc)]
pub fn write_file(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write scratch file");
    path.display().to_string()
}

/// Runs the `conftree` binary to completion with logging silenced.
#[allow(clippy::missing_panics_doc)]
pub fn run_conftree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_conftree"))
        .args(args)
        .env_remove("CONFTREE_SOURCE")
        .env_remove("CONFTREE_SCHEMA")
        .env("CONFTREE_LOG_LEVEL", "off")
        .output()
        .expect("failed to run conftree")
}

/// Stdout of a finished run as text.
pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished run as text.
pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
