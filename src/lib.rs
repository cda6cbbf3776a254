//! Roster - Employee and Department Manager
//!
//! Roster keeps employees and departments in a SQLite file and offers two
//! front ends over the same repositories: an interactive terminal menu and an
//! MCP tool server speaking JSON-RPC 2.0 on stdio.
//!
//! # Core Rules
//! - An employee can only be assigned to a department that exists
//! - A department cannot be deleted while employees reference it
//! - Both checks run in the same transaction as the write they guard
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`output`] - JSON output envelope types
//! - [`store`] - Storage gateway, introspection and bootstrap
//! - [`repo`] - Department and employee repositories, input checks
//! - [`capability`] - Raw SQL classification for the tool server
//! - [`config`] - Configuration management
//! - [`logging`] - Tracing subscriber setup
//! - [`mcp`] - MCP server
//! - [`menu`] - Interactive menu

pub mod capability;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod menu;
pub mod output;
pub mod repo;
pub mod store;

// Re-export commonly used types for convenience
pub use capability::{classify, validate_statement, Capabilities, StatementKind};
pub use config::{resolve_settings, save_settings, ConfigLocation, Settings, SettingsFile};
pub use error::{Result, RosterError};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use repo::{
    Department, DepartmentRepository, DepartmentStatistics, Employee, EmployeeInput,
    EmployeeRepository, OverallStatistics, Statistics,
};
pub use store::{Gateway, Record, TableInfo, TableSummary, WriteResult};
