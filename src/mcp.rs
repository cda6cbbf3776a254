//! MCP (Model Context Protocol) Server
//!
//! This module implements an MCP server using manual JSON-RPC 2.0 over stdio.
//!
//! # Architecture
//!
//! - **Transport**: JSON-RPC 2.0 over stdio (line-based)
//! - **Dependencies**: `serde_json`, `schemars` for input schemas, anyhow for protocol errors
//! - **Protocol**: `initialize`, `tools/list`, `tools/call`, `ping`; notifications get no reply
//!
//! # Tools
//!
//! The tool set is the closed [`Tool`] enum. Each tool deserializes its
//! arguments into a typed struct and calls one repository or gateway
//! operation. `execute_sql` is the only tool that takes statement text, and it
//! runs only what [`crate::capability`] allows.
//!
//! Tool failures are not protocol errors: they come back as a normal result
//! with `isError: true` and an error envelope as the text.
//!
//! # Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "roster": {
//!       "command": "roster",
//!       "args": ["--db", "/path/to/employees.db", "mcp"]
//!     }
//!   }
//! }
//! ```

use anyhow::{anyhow, Result};
use rusqlite::types::Value as SqlValue;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::capability::{self, Capabilities, StatementKind};
use crate::error::RosterError;
use crate::output::{ErrorEnvelope, Metadata, SuccessEnvelope};
use crate::repo::validate::require_unique_department_name;
use crate::repo::{DepartmentRepository, EmployeeInput, EmployeeRepository};
use crate::store::{Gateway, Record};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INTERNAL_ERROR: i32 = -32603;

// ============================================================================
// JSON-RPC 2.0 Structures
// ============================================================================

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    /// Absent for notifications
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }
}

// ============================================================================
// MCP Tool Result Structures
// ============================================================================

/// Text content block for MCP tool results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// MCP tool call result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    fn from_envelope(envelope: &impl Serialize, is_error: bool) -> Result<Self> {
        let text = serde_json::to_string_pretty(envelope)?;
        Ok(Self {
            content: vec![TextContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error,
        })
    }

    /// Parse the envelope carried in the first content block
    pub fn envelope(&self) -> Result<Value> {
        let block = self.content.first().ok_or_else(|| anyhow!("Tool result has no content"))?;
        Ok(serde_json::from_str(&block.text)?)
    }
}

// ============================================================================
// Tool Catalogue
// ============================================================================

/// Every operation the tool server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    QueryEmployees,
    QueryDepartments,
    CreateEmployee,
    UpdateEmployee,
    DeleteEmployee,
    CreateDepartment,
    UpdateDepartment,
    DeleteDepartment,
    EmployeeStatistics,
    ExecuteSql,
    GetSchema,
    GetTableInfo,
}

impl Tool {
    pub const ALL: [Self; 12] = [
        Self::QueryEmployees,
        Self::QueryDepartments,
        Self::CreateEmployee,
        Self::UpdateEmployee,
        Self::DeleteEmployee,
        Self::CreateDepartment,
        Self::UpdateDepartment,
        Self::DeleteDepartment,
        Self::EmployeeStatistics,
        Self::ExecuteSql,
        Self::GetSchema,
        Self::GetTableInfo,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::QueryEmployees => "query_employees",
            Self::QueryDepartments => "query_departments",
            Self::CreateEmployee => "create_employee",
            Self::UpdateEmployee => "update_employee",
            Self::DeleteEmployee => "delete_employee",
            Self::CreateDepartment => "create_department",
            Self::UpdateDepartment => "update_department",
            Self::DeleteDepartment => "delete_department",
            Self::EmployeeStatistics => "employee_statistics",
            Self::ExecuteSql => "execute_sql",
            Self::GetSchema => "get_schema",
            Self::GetTableInfo => "get_table_info",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    const fn description(self) -> &'static str {
        match self {
            Self::QueryEmployees => "List employees with their department names, sorted by name. Give at most one filter: 'id' (single employee), 'department_id' (members of a department) or 'name' (case-insensitive substring). No filter lists everyone.",
            Self::QueryDepartments => "List departments sorted by name. Give at most one filter: 'id' or 'name' (exact match).",
            Self::CreateEmployee => "Add an employee. The department must exist, salary must be non-negative and hire_date must be YYYY-MM-DD. Returns the generated id.",
            Self::UpdateEmployee => "Replace every field of an existing employee. Same checks as create_employee. rows_affected is 0 when the id does not exist.",
            Self::DeleteEmployee => "Delete an employee by id.",
            Self::CreateDepartment => "Add a department. Names are unique (case-sensitive).",
            Self::UpdateDepartment => "Rename a department. Employees keep their department_id.",
            Self::DeleteDepartment => "Delete a department. Refused with INTEGRITY_ERROR while any employee is still assigned to it.",
            Self::EmployeeStatistics => "Head count and salary aggregates overall and per department.",
            Self::ExecuteSql => "Run one SQL statement with positional '?' parameters. Reads (SELECT, WITH, PRAGMA, EXPLAIN) return rows, truncated to the server's row cap. Writes (INSERT, UPDATE, DELETE, REPLACE) run only when the server was started with write access. Schema changes are always rejected. Prefer the typed tools for ordinary record changes.",
            Self::GetSchema => "List every table with the CREATE statement that defines it.",
            Self::GetTableInfo => "Columns, primary key, foreign keys and indexes of one table.",
        }
    }

    fn input_schema(self) -> Value {
        match self {
            Self::QueryEmployees => schema_of::<QueryEmployeesArgs>(),
            Self::QueryDepartments => schema_of::<QueryDepartmentsArgs>(),
            Self::CreateEmployee => schema_of::<EmployeeFields>(),
            Self::UpdateEmployee => schema_of::<UpdateEmployeeArgs>(),
            Self::DeleteEmployee | Self::DeleteDepartment => schema_of::<IdArgs>(),
            Self::CreateDepartment => schema_of::<CreateDepartmentArgs>(),
            Self::UpdateDepartment => schema_of::<UpdateDepartmentArgs>(),
            Self::EmployeeStatistics | Self::GetSchema => schema_of::<NoArgs>(),
            Self::ExecuteSql => schema_of::<ExecuteSqlArgs>(),
            Self::GetTableInfo => schema_of::<GetTableInfoArgs>(),
        }
    }
}

fn schema_of<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    if let Value::Object(map) = &mut schema {
        map.remove("$schema");
        map.remove("title");
    }
    schema
}

// ============================================================================
// Tool Arguments
// ============================================================================

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct QueryEmployeesArgs {
    /// Return only the employee with this id
    id: Option<i64>,
    /// Return the employees of this department
    department_id: Option<i64>,
    /// Case-insensitive substring of the employee name
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct QueryDepartmentsArgs {
    /// Return only the department with this id
    id: Option<i64>,
    /// Exact department name
    name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct EmployeeFields {
    name: String,
    department_id: i64,
    /// Non-negative
    salary: f64,
    /// YYYY-MM-DD
    hire_date: String,
}

impl EmployeeFields {
    fn into_input(self) -> crate::error::Result<EmployeeInput> {
        EmployeeInput::validated(&self.name, self.department_id, self.salary, &self.hire_date)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct UpdateEmployeeArgs {
    /// Employee to update
    id: i64,
    name: String,
    department_id: i64,
    /// Non-negative
    salary: f64,
    /// YYYY-MM-DD
    hire_date: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct IdArgs {
    id: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct CreateDepartmentArgs {
    name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct UpdateDepartmentArgs {
    id: i64,
    /// New name
    name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct ExecuteSqlArgs {
    /// A single SQL statement
    query: String,
    /// Values for the statement's positional parameters (strings, numbers, booleans or null)
    #[serde(default)]
    params: Vec<Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct GetTableInfoArgs {
    table_name: String,
}

/// Result data of `execute_sql`
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SqlOutcome {
    Read { rows: Vec<Record>, truncated: bool },
    Write { rows_affected: u64, generated_id: Option<i64> },
}

/// Envelope data plus the row count reported in `meta`
struct ToolOutput {
    data: Value,
    rows: Option<usize>,
}

impl ToolOutput {
    fn single<T: Serialize>(data: &T) -> crate::error::Result<Self> {
        Ok(Self {
            data: encode(data)?,
            rows: None,
        })
    }

    fn listing<T: Serialize>(rows: &[T]) -> crate::error::Result<Self> {
        Ok(Self {
            data: encode(&rows)?,
            rows: Some(rows.len()),
        })
    }
}

fn encode<T: Serialize>(data: &T) -> crate::error::Result<Value> {
    serde_json::to_value(data)
        .map_err(|e| RosterError::storage(format!("Failed to encode result: {e}")))
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> crate::error::Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| RosterError::invalid_input(format!("Invalid arguments: {e}")))
}

/// Bind a JSON value as a positional statement parameter
fn json_to_sql(value: &Value) -> crate::error::Result<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => {
            return Err(RosterError::invalid_input(
                "SQL parameters must be strings, numbers, booleans or null",
            ))
        }
    })
}

// ============================================================================
// MCP Server
// ============================================================================

/// Tool server bound to one database
#[derive(Debug, Clone)]
pub struct ToolServer {
    gateway: Gateway,
    employees: EmployeeRepository,
    departments: DepartmentRepository,
    capabilities: Capabilities,
}

impl ToolServer {
    pub fn new(gateway: Gateway, capabilities: Capabilities) -> Self {
        Self {
            employees: EmployeeRepository::new(gateway.clone()),
            departments: DepartmentRepository::new(gateway.clone()),
            gateway,
            capabilities,
        }
    }

    /// Handle one protocol line
    ///
    /// Returns the serialized response, or None for blank lines and notifications.
    pub fn handle_line(&self, line: &str) -> Result<Option<String>> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                warn!(error = %e, "unparseable request");
                Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
        };

        response.map(|r| serde_json::to_string(&r)).transpose().map_err(Into::into)
    }

    /// Run one tool and wrap its outcome in an envelope
    pub fn call_tool(&self, tool: Tool, arguments: Value) -> Result<CallToolResult> {
        let started = Instant::now();
        let outcome = self.dispatch(tool, arguments);
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(ToolOutput { data, rows }) => {
                let meta = match rows {
                    Some(n) => Metadata::with_rows(elapsed, n),
                    None => Metadata::new(elapsed),
                };
                debug!(tool = tool.name(), elapsed_ms = elapsed, "tool succeeded");
                CallToolResult::from_envelope(&SuccessEnvelope::new(tool.name(), data, meta), false)
            }
            Err(err) => {
                if err.is_caller_error() {
                    let code = err.error_code();
                    info!(tool = tool.name(), code, error = %err, "tool refused");
                } else {
                    let code = err.error_code();
                    warn!(tool = tool.name(), code, error = %err, "tool failed");
                }
                CallToolResult::from_envelope(&ErrorEnvelope::from_error(tool.name(), &err), true)
            }
        }
    }

    fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification received");
            return None;
        };

        let result = match request.method.as_str() {
            "initialize" => Ok(handle_initialize()),
            "tools/list" => Ok(handle_list_tools()),
            "tools/call" => self.handle_call_tool(request.params),
            "ping" => Ok(json!({})),
            _ => Err(anyhow!("Unknown method: {}", request.method)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, e.to_string()),
        })
    }

    fn handle_call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params = params.ok_or_else(|| anyhow!("Missing params"))?;
        let name = params["name"].as_str().ok_or_else(|| anyhow!("Missing tool name"))?;
        let tool = Tool::from_name(name).ok_or_else(|| anyhow!("Unknown tool: {name}"))?;
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(arguments) => arguments.clone(),
        };

        info!(tool = name, "tool call");
        Ok(serde_json::to_value(self.call_tool(tool, arguments)?)?)
    }

    fn dispatch(&self, tool: Tool, arguments: Value) -> crate::error::Result<ToolOutput> {
        match tool {
            Tool::QueryEmployees => self.query_employees(parse_args(arguments)?),
            Tool::QueryDepartments => self.query_departments(parse_args(arguments)?),
            Tool::CreateEmployee => {
                let input = parse_args::<EmployeeFields>(arguments)?.into_input()?;
                ToolOutput::single(&self.employees.create(&input)?)
            }
            Tool::UpdateEmployee => {
                let args: UpdateEmployeeArgs = parse_args(arguments)?;
                let input = EmployeeInput::validated(
                    &args.name,
                    args.department_id,
                    args.salary,
                    &args.hire_date,
                )?;
                ToolOutput::single(&self.employees.update(args.id, &input)?)
            }
            Tool::DeleteEmployee => {
                let args: IdArgs = parse_args(arguments)?;
                ToolOutput::single(&self.employees.delete(args.id)?)
            }
            Tool::CreateDepartment => {
                let args: CreateDepartmentArgs = parse_args(arguments)?;
                let name = require_unique_department_name(&self.departments, &args.name, None)?;
                ToolOutput::single(&self.departments.create(&name)?)
            }
            Tool::UpdateDepartment => {
                let args: UpdateDepartmentArgs = parse_args(arguments)?;
                let name = require_unique_department_name(
                    &self.departments,
                    &args.name,
                    Some(args.id),
                )?;
                ToolOutput::single(&self.departments.update(args.id, &name)?)
            }
            Tool::DeleteDepartment => {
                let args: IdArgs = parse_args(arguments)?;
                ToolOutput::single(&self.departments.delete(args.id)?)
            }
            Tool::EmployeeStatistics => {
                parse_args::<NoArgs>(arguments)?;
                ToolOutput::single(&self.employees.statistics()?)
            }
            Tool::ExecuteSql => self.execute_sql(parse_args(arguments)?),
            Tool::GetSchema => {
                parse_args::<NoArgs>(arguments)?;
                ToolOutput::listing(&self.gateway.list_tables()?)
            }
            Tool::GetTableInfo => {
                let args: GetTableInfoArgs = parse_args(arguments)?;
                ToolOutput::single(&self.gateway.table_info(&args.table_name)?)
            }
        }
    }

    fn query_employees(&self, args: QueryEmployeesArgs) -> crate::error::Result<ToolOutput> {
        let employees = match args {
            QueryEmployeesArgs { id: Some(id), department_id: None, name: None } => {
                self.employees.get(id)?.into_iter().collect()
            }
            QueryEmployeesArgs { id: None, department_id: Some(dept), name: None } => {
                self.employees.list_by_department(dept)?
            }
            QueryEmployeesArgs { id: None, department_id: None, name: Some(name) } => {
                self.employees.search_by_name(&name)?
            }
            QueryEmployeesArgs { id: None, department_id: None, name: None } => {
                self.employees.list_all()?
            }
            _ => {
                return Err(RosterError::invalid_input(
                    "Give at most one of 'id', 'department_id', 'name'",
                ))
            }
        };

        ToolOutput::listing(&employees)
    }

    fn query_departments(&self, args: QueryDepartmentsArgs) -> crate::error::Result<ToolOutput> {
        let departments = match args {
            QueryDepartmentsArgs { id: Some(id), name: None } => {
                self.departments.get(id)?.into_iter().collect()
            }
            QueryDepartmentsArgs { id: None, name: Some(name) } => {
                self.departments.find_by_name(&name)?.into_iter().collect()
            }
            QueryDepartmentsArgs { id: None, name: None } => self.departments.list_all()?,
            _ => return Err(RosterError::invalid_input("Give at most one of 'id', 'name'")),
        };

        ToolOutput::listing(&departments)
    }

    fn execute_sql(&self, args: ExecuteSqlArgs) -> crate::error::Result<ToolOutput> {
        let kind = capability::validate_statement(&args.query, &self.capabilities)?;
        let params = args.params.iter().map(json_to_sql).collect::<crate::error::Result<Vec<_>>>()?;

        match kind {
            StatementKind::Read => {
                let mut rows = self
                    .gateway
                    .run_read_only(&args.query, rusqlite::params_from_iter(params))?;
                let truncated = rows.len() > self.capabilities.max_rows;
                rows.truncate(self.capabilities.max_rows);
                let count = rows.len();

                let data = encode(&SqlOutcome::Read { rows, truncated })?;
                Ok(ToolOutput {
                    data,
                    rows: Some(count),
                })
            }
            StatementKind::Write => {
                let result =
                    self.gateway.run_write(&args.query, rusqlite::params_from_iter(params))?;
                ToolOutput::single(&SqlOutcome::Write {
                    rows_affected: result.rows_affected,
                    generated_id: result.generated_id,
                })
            }
            StatementKind::Ddl => {
                Err(RosterError::capability_violation("Schema changes are never executed"))
            }
        }
    }
}

// ============================================================================
// MCP Protocol Handlers
// ============================================================================

fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": "roster",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn handle_list_tools() -> Value {
    let tools: Vec<Value> = Tool::ALL
        .into_iter()
        .map(|tool| {
            json!({
                "name": tool.name(),
                "description": tool.description(),
                "inputSchema": tool.input_schema(),
            })
        })
        .collect();

    json!({ "tools": tools })
}

/// Serve requests from `reader`, writing one response line per request to `writer`
///
/// Returns when `reader` reaches end of input.
pub fn serve_io<R: BufRead, W: Write>(server: &ToolServer, reader: R, mut writer: W) -> Result<()> {
    for line in reader.lines() {
        let line = line?;
        if let Some(response) = server.handle_line(&line)? {
            writeln!(writer, "{response}")?;
            writer.flush()?;
        }
    }

    Ok(())
}

/// Start the MCP server on stdin/stdout
pub fn serve(server: &ToolServer) -> Result<()> {
    info!("tool server listening on stdio");
    let stdin = io::stdin();
    serve_io(server, stdin.lock(), io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::bootstrap::initialize;

    fn server() -> (tempfile::TempDir, ToolServer) {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Gateway::new(dir.path().join("mcp.db"));
        initialize(&gateway, true).unwrap();
        (dir, ToolServer::new(gateway, Capabilities::read_only()))
    }

    fn respond(server: &ToolServer, line: &str) -> Value {
        let response = server.handle_line(line).unwrap().unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[test]
    fn test_tool_names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("drop_everything"), None);
    }

    #[test]
    fn test_initialize() {
        let (_dir, server) = server();
        let response = respond(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        );
        assert_eq!(response["id"], json!(1));
        assert_eq!(response["result"]["protocolVersion"], json!(PROTOCOL_VERSION));
        assert_eq!(response["result"]["serverInfo"]["name"], json!("roster"));
    }

    #[test]
    fn test_parse_error() {
        let (_dir, server) = server();
        let response = respond(&server, "{not json");
        assert_eq!(response["error"]["code"], json!(PARSE_ERROR));
        assert_eq!(response["id"], Value::Null);
    }

    #[test]
    fn test_unknown_method() {
        let (_dir, server) = server();
        let response = respond(&server, r#"{"jsonrpc":"2.0","id":"a","method":"resources/list"}"#);
        assert_eq!(response["error"]["code"], json!(INTERNAL_ERROR));
        assert!(response["error"]["message"].as_str().unwrap().contains("resources/list"));
    }

    #[test]
    fn test_notification_gets_no_response() {
        let (_dir, server) = server();
        let line = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(server.handle_line(line).unwrap().is_none());
        assert!(server.handle_line("   ").unwrap().is_none());
    }

    #[test]
    fn test_tools_list_has_schemas() {
        let (_dir, server) = server();
        let response = respond(&server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#);
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), Tool::ALL.len());

        let create = tools.iter().find(|t| t["name"] == json!("create_employee")).unwrap();
        let required = create["inputSchema"]["required"].as_array().unwrap();
        assert!(required.contains(&json!("department_id")));
        assert!(create["inputSchema"].get("$schema").is_none());
    }

    #[test]
    fn test_json_to_sql_rejects_nested_values() {
        assert_eq!(json_to_sql(&json!(3)).unwrap(), SqlValue::Integer(3));
        assert_eq!(json_to_sql(&json!(true)).unwrap(), SqlValue::Integer(1));
        assert_eq!(json_to_sql(&json!(1.5)).unwrap(), SqlValue::Real(1.5));
        assert!(json_to_sql(&json!([1])).is_err());
    }

    #[test]
    fn test_serve_io_answers_each_request() {
        let (_dir, server) = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );

        let mut output = Vec::new();
        serve_io(&server, input.as_bytes(), &mut output).unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["id"], json!(2));
    }
}
