//! Output Validation Tests
//!
//! Checks the JSON output contract shared by tool results and the
//! JSON-mode CLI commands:
//! - Every tool result carries exactly one text block holding an envelope
//! - Success envelopes have `ok`, `command`, `data` and `meta`
//! - Error envelopes have `ok`, `command` and a coded `error`, and no `data`
//! - `meta.rows_returned` appears for listings only
//! - The `init` and `config show` commands print pure JSON on stdout

use pretty_assertions::assert_eq;
use roster::mcp::{Tool, ToolServer};
use roster::store::bootstrap::initialize;
use roster::{Capabilities, ErrorEnvelope, Gateway, RosterError};
use serde_json::{json, Value};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn seeded_server() -> (TempDir, ToolServer) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let gateway = Gateway::new(dir.path().join("output.db"));
    initialize(&gateway, true).expect("Failed to initialize database");
    (dir, ToolServer::new(gateway, Capabilities::read_only()))
}

fn arguments_for(tool: Tool) -> Value {
    match tool {
        Tool::CreateEmployee => json!({
            "name": "New Hire",
            "department_id": 1,
            "salary": 50000,
            "hire_date": "2024-03-01"
        }),
        Tool::UpdateEmployee => json!({
            "id": 4,
            "name": "David Kim",
            "department_id": 3,
            "salary": 56000,
            "hire_date": "2021-11-01"
        }),
        Tool::DeleteEmployee => json!({ "id": 5 }),
        Tool::CreateDepartment => json!({ "name": "Legal" }),
        Tool::UpdateDepartment => json!({ "id": 3, "name": "Sales & Marketing" }),
        Tool::DeleteDepartment => json!({ "id": 1 }),
        Tool::ExecuteSql => json!({ "query": "SELECT COUNT(*) AS n FROM employees" }),
        Tool::GetTableInfo => json!({ "table_name": "departments" }),
        _ => json!({}),
    }
}

fn assert_success_shape(envelope: &Value, tool: Tool) {
    let object = envelope.as_object().expect("envelope is an object");
    assert_eq!(envelope["ok"], json!(true));
    assert_eq!(envelope["command"], json!(tool.name()));
    assert!(object.contains_key("data"));
    assert!(envelope["meta"]["execution_ms"].is_u64());
    assert!(!object.contains_key("error"));
}

fn assert_error_shape(envelope: &Value) {
    let object = envelope.as_object().expect("envelope is an object");
    assert_eq!(envelope["ok"], json!(false));
    assert!(envelope["command"].is_string());
    assert!(envelope["error"]["code"].is_string());
    assert!(envelope["error"]["message"].is_string());
    assert!(!object.contains_key("data"));
    assert!(!object.contains_key("meta"));
}

fn run_cli(workdir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_roster"))
        .args(args)
        .current_dir(workdir)
        .env_remove("ROSTER_DB")
        .env_remove("RUST_LOG")
        .env("HOME", workdir)
        .env("XDG_CONFIG_HOME", workdir.join("xdg"))
        .output()
        .expect("Failed to run roster binary")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout is UTF-8");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {stdout}"))
}

// ============================================================================
// Tool Result Envelopes
// ============================================================================

#[test]
fn test_every_tool_returns_one_text_block() {
    for tool in Tool::ALL {
        let (_dir, server) = seeded_server();
        let result = server.call_tool(tool, arguments_for(tool)).unwrap();

        assert_eq!(result.content.len(), 1, "{}", tool.name());
        assert_eq!(result.content[0].content_type, "text");

        let envelope = result.envelope().unwrap();
        if result.is_error {
            assert_error_shape(&envelope);
        } else {
            assert_success_shape(&envelope, tool);
        }
    }
}

#[test]
fn test_expected_failures_use_error_envelope() {
    let (_dir, server) = seeded_server();

    // HR still has employees
    let result = server
        .call_tool(Tool::DeleteDepartment, arguments_for(Tool::DeleteDepartment))
        .unwrap();
    assert!(result.is_error);
    let envelope = result.envelope().unwrap();
    assert_error_shape(&envelope);
    assert_eq!(envelope["command"], json!("delete_department"));
}

#[test]
fn test_rows_returned_only_for_listings() {
    let (_dir, server) = seeded_server();

    let listing = server.call_tool(Tool::QueryDepartments, json!({})).unwrap().envelope().unwrap();
    assert_eq!(listing["meta"]["rows_returned"], json!(3));

    let schema = server.call_tool(Tool::GetSchema, json!({})).unwrap().envelope().unwrap();
    assert_eq!(schema["meta"]["rows_returned"], json!(2));

    let stats = server.call_tool(Tool::EmployeeStatistics, json!({})).unwrap().envelope().unwrap();
    assert!(stats["meta"].get("rows_returned").is_none());

    let write = server
        .call_tool(Tool::CreateDepartment, json!({ "name": "Legal" }))
        .unwrap()
        .envelope()
        .unwrap();
    assert!(write["meta"].get("rows_returned").is_none());
}

#[test]
fn test_error_codes_are_stable() {
    let cases = [
        (RosterError::validation("x"), "VALIDATION_ERROR"),
        (RosterError::integrity("x"), "INTEGRITY_ERROR"),
        (RosterError::storage("x"), "STORAGE_ERROR"),
        (RosterError::invalid_input("x"), "INVALID_INPUT"),
        (RosterError::capability_violation("x"), "CAPABILITY_VIOLATION"),
        (RosterError::config_error("x"), "CONFIG_ERROR"),
    ];

    for (err, code) in cases {
        let envelope = serde_json::to_value(ErrorEnvelope::from_error("test", &err)).unwrap();
        assert_error_shape(&envelope);
        assert_eq!(envelope["error"]["code"], json!(code));
    }
}

// ============================================================================
// CLI Output
// ============================================================================

#[test]
fn test_init_prints_only_json() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("cli.db");

    let output = run_cli(dir.path(), &["-v", "--db", db.to_str().unwrap(), "init"]);
    assert!(output.status.success());

    let envelope = stdout_json(&output);
    assert_eq!(envelope["ok"], json!(true));
    assert_eq!(envelope["command"], json!("init"));
    assert_eq!(envelope["data"]["created"], json!(true));
    assert_eq!(envelope["data"]["seeded"], json!(true));

    // Second run finds the file and leaves it alone
    let again = stdout_json(&run_cli(dir.path(), &["--db", db.to_str().unwrap(), "init"]));
    assert_eq!(again["data"]["created"], json!(false));
    assert_eq!(again["data"]["seeded"], json!(false));
}

#[test]
fn test_init_without_seed() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("empty.db");

    let envelope =
        stdout_json(&run_cli(dir.path(), &["--db", db.to_str().unwrap(), "init", "--no-seed"]));
    assert_eq!(envelope["data"]["seeded"], json!(false));

    let gateway = Gateway::new(&db);
    assert!(gateway.run_query("SELECT * FROM departments", []).unwrap().is_empty());
}

#[test]
fn test_config_show_reports_resolved_settings() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".roster")).unwrap();
    std::fs::write(
        dir.path().join(".roster").join("config.json"),
        r#"{ "database": "from-local.db", "max_rows": 25 }"#,
    )
    .unwrap();

    let envelope = stdout_json(&run_cli(dir.path(), &["config", "show"]));
    assert_eq!(envelope["command"], json!("config show"));
    assert_eq!(envelope["data"]["database"], json!("from-local.db"));
    assert_eq!(envelope["data"]["max_rows"], json!(25));
    assert_eq!(envelope["data"]["allow_sql_writes"], json!(false));
}

#[test]
fn test_bad_config_is_error_envelope_with_failure_status() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".roster")).unwrap();
    std::fs::write(dir.path().join(".roster").join("config.json"), r#"{ "colour": "blue" }"#)
        .unwrap();

    let output = run_cli(dir.path(), &["config", "show"]);
    assert!(!output.status.success());

    let envelope = stdout_json(&output);
    assert_error_shape(&envelope);
    assert_eq!(envelope["error"]["code"], json!("CONFIG_ERROR"));
}
