//! End-to-end tests for the `tokenschema` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn tokenschema() -> Command {
    let mut cmd = Command::cargo_bin("tokenschema").expect("Failed to find tokenschema binary");
    cmd.env_remove("TOKENSCHEMA_CONFIG")
        .env_remove("TOKENSCHEMA_IGNORE_CASE")
        .env_remove("TOKENSCHEMA_VALIDATE_FORMATS")
        .env_remove("RUST_LOG");
    cmd
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };
        fixture.write(
            "person.json",
            r#"{
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string" },
                    "email": { "type": "string", "format": "email" }
                }
            }"#,
        );
        fixture
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

// ============================================================================
// validate command tests
// ============================================================================

#[test]
fn test_validate_valid_document() {
    let fixture = Fixture::new();
    fixture.write("ok.json", r#"{ "name": "Ada" }"#);

    tokenschema()
        .arg("--no-color")
        .arg("validate")
        .arg("--schema")
        .arg(fixture.path("person.json"))
        .arg(fixture.path("ok.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_validate_invalid_document() {
    let fixture = Fixture::new();
    fixture.write("bad.yaml", "name: 42\n");

    tokenschema()
        .arg("--no-color")
        .arg("validate")
        .arg("--schema")
        .arg(fixture.path("person.json"))
        .arg(fixture.path("bad.yaml"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1 error(s)"))
        .stdout(predicate::str::contains(
            "Invalid type. Expected String but got Integer. Path 'name'.",
        ))
        .stderr(predicate::str::contains("1 of 1 document(s) failed validation"));
}

#[test]
fn test_validate_json_output() {
    let fixture = Fixture::new();
    fixture.write("ok.json", r#"{ "name": "Ada" }"#);
    fixture.write("missing.json", r#"{}"#);

    let output = tokenschema()
        .arg("validate")
        .arg("--output")
        .arg("json")
        .arg("--schema")
        .arg(fixture.path("person.json"))
        .arg(fixture.path("ok.json"))
        .arg(fixture.path("missing.json"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports.as_array().unwrap().len(), 2);
    assert_eq!(reports[0]["valid"], true);
    assert_eq!(reports[1]["valid"], false);
    assert_eq!(reports[1]["errors"][0]["kind"], "Required");
}

#[test]
fn test_validate_no_format_flag() {
    let fixture = Fixture::new();
    fixture.write("email.json", r#"{ "name": "Ada", "email": "not an email" }"#);

    tokenschema()
        .arg("validate")
        .arg("--schema")
        .arg(fixture.path("person.json"))
        .arg(fixture.path("email.json"))
        .assert()
        .code(1);

    tokenschema()
        .arg("validate")
        .arg("--no-format")
        .arg("--schema")
        .arg(fixture.path("person.json"))
        .arg(fixture.path("email.json"))
        .assert()
        .success();
}

#[test]
fn test_validate_ignore_case_from_config() {
    let fixture = Fixture::new();
    fixture.write("upper.json", r#"{ "NAME": "Ada" }"#);
    fixture.write("config.yaml", "validation:\n  property_names: ignore-case\n");

    tokenschema()
        .arg("validate")
        .arg("--schema")
        .arg(fixture.path("person.json"))
        .arg(fixture.path("upper.json"))
        .assert()
        .code(1);

    tokenschema()
        .arg("--config")
        .arg(fixture.path("config.yaml"))
        .arg("validate")
        .arg("--schema")
        .arg(fixture.path("person.json"))
        .arg(fixture.path("upper.json"))
        .assert()
        .success();
}

#[test]
fn test_validate_missing_document() {
    let fixture = Fixture::new();

    tokenschema()
        .arg("validate")
        .arg("--schema")
        .arg(fixture.path("person.json"))
        .arg(fixture.path("nonexistent.json"))
        .assert()
        .code(5)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_validate_zero_regex_timeout() {
    let fixture = Fixture::new();
    fixture.write("ok.json", r#"{ "name": "Ada" }"#);

    tokenschema()
        .arg("validate")
        .arg("--regex-timeout-ms")
        .arg("0")
        .arg("--schema")
        .arg(fixture.path("person.json"))
        .arg(fixture.path("ok.json"))
        .assert()
        .code(7)
        .stderr(predicate::str::contains("--help"));
}

// ============================================================================
// check command tests
// ============================================================================

#[test]
fn test_check_schema() {
    let fixture = Fixture::new();

    tokenschema()
        .arg("--no-color")
        .arg("check")
        .arg(fixture.path("person.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("compiled"))
        .stdout(predicate::str::contains("Nodes: 3"));
}

#[test]
fn test_check_reports_extensions_as_json() {
    let fixture = Fixture::new();
    fixture.write("ext.json", r#"{ "x-even": true, "items": { "x-even": false } }"#);

    let output = tokenschema()
        .arg("check")
        .arg("--output")
        .arg("json")
        .arg(fixture.path("ext.json"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["nodes"], 2);
    assert_eq!(summary["extension_keywords"], serde_json::json!(["x-even"]));
}

#[test]
fn test_check_unresolved_reference() {
    let fixture = Fixture::new();
    fixture.write("broken.json", r##"{ "$ref": "#/$defs/missing" }"##);

    tokenschema()
        .arg("check")
        .arg(fixture.path("broken.json"))
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_check_path_traversal() {
    let fixture = Fixture::new();
    fixture.write("escape.json", r#"{ "$ref": "../outside.json" }"#);

    tokenschema()
        .arg("check")
        .arg(fixture.path("escape.json"))
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Path traversal"));
}
