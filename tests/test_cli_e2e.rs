mod common;

use common::{fixture_source, run_conftree, stderr_of, stdout_of, write_file};

// ============================================================================
// version command
// ============================================================================

#[test]
fn version_human() {
    let output = run_conftree(&["version"]);
    assert!(
        output.status.success(),
        "version should exit 0: {}",
        stderr_of(&output)
    );
    let stdout = stdout_of(&output);
    assert!(
        stdout.starts_with("conftree "),
        "version output should name the binary: {stdout}"
    );
    assert!(stdout.contains('.'), "missing version number: {stdout}");
}

#[test]
fn version_json() {
    let output = run_conftree(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("version JSON should be valid");
    assert_eq!(parsed["name"], "conftree");
    assert!(parsed.get("version").is_some());
}

// ============================================================================
// completions command
// ============================================================================

#[test]
fn completions_bash() {
    let output = run_conftree(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(
        stdout_of(&output).contains("conftree"),
        "bash completions should mention the binary"
    );
}

#[test]
fn completions_unknown_shell_is_usage_error() {
    let output = run_conftree(&["completions", "tcsh"]);
    assert!(!output.status.success());
}

// ============================================================================
// ls / get
// ============================================================================

#[test]
fn ls_prints_outline() {
    let output = run_conftree(&["ls", &fixture_source("import.conf")]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.starts_with("[root] : (Type:CN, Parent:/, Depth:1)"), "{stdout}");
    assert!(stdout.contains("\t[general] : (Type:C, Parent:root, Depth:2)"), "{stdout}");
}

#[test]
fn ls_paths_lists_nodes_then_attributes() {
    let source = fixture_source("import.conf");
    let output = run_conftree(&["ls", &source, "--paths"]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    let nodes: Vec<String> = stdout_of(&output).lines().map(str::to_string).collect();
    assert_eq!(nodes.first().map(String::as_str), Some("/general"));
    assert!(nodes.iter().any(|p| p == "/src2_fields"));

    let output = run_conftree(&["ls", &source, "--paths", "--attributes", "--under", "/target"]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(
        stdout_of(&output).lines().collect::<Vec<_>>(),
        ["/target/db_server", "/target/database", "/target/schema"]
    );
}

#[test]
fn ls_under_missing_node_fails() {
    let output = run_conftree(&[
        "ls",
        &fixture_source("import.conf"),
        "--paths",
        "--under",
        "/nowhere",
    ]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn get_prints_json() {
    let source = fixture_source("import.conf");
    let output = run_conftree(&["get", &source, "/target"]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    let parsed: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(parsed["database"], "test");

    let output = run_conftree(&["get", &source, "/general/log_level"]);
    assert_eq!(stdout_of(&output).trim(), "\"debug\"");
}

#[test]
fn ls_reads_source_from_environment() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_conftree"))
        .args(["ls", "--paths", "--attributes", "--under", "/zookeeper"])
        .env("CONFTREE_SOURCE", fixture_source("import.conf"))
        .env_remove("CONFTREE_SCHEMA")
        .env("CONFTREE_LOG_LEVEL", "off")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output).trim(), "/zookeeper/zk_host");
}

#[test]
fn get_missing_file_is_io_error() {
    let output = run_conftree(&["get", "no_such_file.conf"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(
        stderr_of(&output).contains("File no_such_file.conf does not exist or is not readable"),
        "{}",
        stderr_of(&output)
    );
}

#[test]
fn store_sources_need_a_connection() {
    let output = run_conftree(&["get", "kv:///app/config"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr_of(&output).contains("No store connection available for kv:///app/config"));
}

// ============================================================================
// cp / rm
// ============================================================================

#[test]
fn cp_converts_and_respects_force() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("import.json").display().to_string();
    let source = fixture_source("import.conf");

    let output = run_conftree(&["cp", &source, &destination]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&destination).unwrap()).unwrap();
    assert_eq!(written["general"]["log_level"], "debug");

    let output = run_conftree(&["cp", &source, &destination]);
    assert_eq!(output.status.code(), Some(3), "second copy without --force");

    let output = run_conftree(&["cp", &source, &destination, "--force"]);
    assert!(output.status.success(), "{}", stderr_of(&output));

    let output = run_conftree(&["get", &destination, "/target/database"]);
    assert_eq!(stdout_of(&output).trim(), "\"test\"");
}

#[test]
fn cp_to_text_rejects_deep_trees() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("deep.conf").display().to_string();
    let output = run_conftree(&["cp", &fixture_source("zk_hierarchy.json"), &destination]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr_of(&output).contains("cfg format does not support multi-level hierarchy"));
}

#[test]
fn rm_deletes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "scratch.conf", "[a]\nkey = value\n");

    let output = run_conftree(&["rm", &path]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert!(!std::path::Path::new(&path).exists());

    let output = run_conftree(&["rm", &path]);
    assert_eq!(output.status.code(), Some(3));
}

// ============================================================================
// validate / sample
// ============================================================================

#[test]
fn validate_accepts_fixture() {
    let source = fixture_source("import.conf");
    let output = run_conftree(&[
        "validate",
        &source,
        "--schema",
        &fixture_source("full_validation.yaml"),
    ]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output).trim(), format!("{source} is valid"));
}

#[test]
fn validate_quiet_prints_nothing() {
    let output = run_conftree(&[
        "--quiet",
        "validate",
        &fixture_source("import.conf"),
        "--schema",
        &fixture_source("full_validation.yaml"),
    ]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert!(stdout_of(&output).is_empty());
}

#[test]
fn validate_failure_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = std::fs::read_to_string(common::fixture_path("import.conf")).unwrap();
    let broken = fixture.replace("method = ftp", "method = gopher");
    assert_ne!(broken, fixture, "fixture should declare an ftp source");
    let path = write_file(dir.path(), "broken.conf", &broken);

    let output = run_conftree(&[
        "validate",
        &path,
        "--schema",
        &fixture_source("full_validation.yaml"),
    ]);
    assert_eq!(output.status.code(), Some(4));
    assert!(
        stderr_of(&output).contains("Parameter /src2/method failed validation for value gopher"),
        "{}",
        stderr_of(&output)
    );
}

#[test]
fn sample_prints_defaults() {
    let output = run_conftree(&["sample", "--schema", &fixture_source("full_validation.yaml")]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    let parsed: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert!(parsed.get("general").is_some(), "{parsed}");
}

#[test]
fn sample_missing_schema_fails() {
    let output = run_conftree(&["sample", "--schema", "no_such_schema.yaml"]);
    assert!(!output.status.success());
}
