//! Storage Gateway
//!
//! Single point of access to the SQLite store. No business rules live here.
//!
//! # Stateless Design
//! The gateway only remembers where the database file is. Every call opens a
//! connection, runs its statement(s), and closes the connection before
//! returning. There is no pooling and no prepared-statement cache.
//!
//! Every connection runs with `PRAGMA foreign_keys = OFF`. Referential rules
//! are enforced by the repositories, so rows written by raw SQL may point at
//! departments that do not exist.
//!
//! # Operations
//! - [`Gateway::run_query`] - read statement, rows become column-keyed records
//! - [`Gateway::run_read_only`] - same, on a connection that cannot write
//! - [`Gateway::run_write`] - insert/update/delete inside commit-or-rollback
//! - [`Gateway::transaction`] - several statements under one IMMEDIATE transaction
//! - [`Gateway::list_tables`] / [`Gateway::table_info`] - schema introspection

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Params, Row, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::error::{Result, RosterError};

pub mod bootstrap;
mod introspect;

/// One result row: column name to JSON value, in column order of the statement
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Outcome of a write statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    /// Rows changed by the statement
    pub rows_affected: u64,

    /// Rowid assigned by an INSERT, None for anything that inserted nothing
    pub generated_id: Option<i64>,
}

/// A user table and the DDL that created it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    /// Table name
    pub name: String,

    /// `CREATE TABLE` statement as stored in `sqlite_master`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// Table information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name
    pub name: String,

    /// Table columns, in declaration order
    pub columns: Vec<ColumnInfo>,

    /// Primary key columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<String>>,

    /// Foreign keys
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeyInfo>,

    /// Indexes (auto-created indexes excluded)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexInfo>,
}

/// Column information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,

    /// Declared column type
    pub data_type: String,

    /// Whether column allows NULL values
    pub nullable: bool,

    /// Default value (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Foreign key information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    /// Synthesized constraint name (`fk_<table>_<id>`)
    pub name: String,

    /// Column names in this table
    pub columns: Vec<String>,

    /// Referenced table name
    pub referenced_table: String,

    /// Referenced column names
    pub referenced_columns: Vec<String>,
}

/// Index information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name
    pub name: String,

    /// Column names included in the index
    pub columns: Vec<String>,

    /// Whether this is a unique index
    pub unique: bool,
}

/// Handle on the database file
#[derive(Debug, Clone)]
pub struct Gateway {
    path: PathBuf,
    busy_timeout: Option<Duration>,
}

impl Gateway {
    /// Create a gateway for the database at `path` (created on first open)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: None,
        }
    }

    /// Wait up to `timeout_ms` for a locked database instead of failing at once
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout_ms: u64) -> Self {
        self.busy_timeout = Some(Duration::from_millis(timeout_ms));
        self
    }

    /// Location of the database file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a read statement and return every row as a record
    pub fn run_query<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Record>> {
        let conn = self.open()?;
        Session::new(&conn).run_query(sql, params)
    }

    /// Execute a statement on a connection opened read-only
    ///
    /// Anything that tries to change the file, including pragmas with side
    /// effects, fails with a storage error.
    pub fn run_read_only<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Record>> {
        let conn = self.open_with(OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Session::new(&conn).run_query(sql, params)
    }

    /// Execute a read statement and decode every row into `T`
    pub fn fetch_all<T: DeserializeOwned, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<T>> {
        let conn = self.open()?;
        Session::new(&conn).fetch_all(sql, params)
    }

    /// Execute a read statement and decode the first row, if any
    pub fn fetch_optional<T: DeserializeOwned, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Option<T>> {
        let conn = self.open()?;
        Session::new(&conn).fetch_optional(sql, params)
    }

    /// Execute one write statement, committing on success and rolling back on failure
    pub fn run_write<P: Params>(&self, sql: &str, params: P) -> Result<WriteResult> {
        self.transaction(|session| session.run_write(sql, params))
    }

    /// Run `f` inside one IMMEDIATE transaction
    ///
    /// The write lock is taken before `f` runs, so a read-then-write inside
    /// `f` cannot interleave with another writer. Commits when `f` returns
    /// `Ok`, rolls back when it returns `Err`.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Session<'_>) -> Result<T>,
    {
        let mut conn = self.open()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RosterError::storage(format!("Failed to begin transaction: {e}")))?;

        let outcome = f(&Session::new(&tx));
        match outcome {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| RosterError::storage(format!("Failed to commit: {e}")))?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "rolling back transaction");
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// List user tables with their DDL, ordered by name
    pub fn list_tables(&self) -> Result<Vec<TableSummary>> {
        let conn = self.open()?;
        introspect::list_tables(&conn)
    }

    /// Describe one table; unknown names are rejected as invalid input
    pub fn table_info(&self, table_name: &str) -> Result<TableInfo> {
        let conn = self.open()?;
        introspect::table_info(&conn, table_name)
    }

    fn open(&self) -> Result<Connection> {
        self.open_with(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
    }

    fn open_with(&self, flags: OpenFlags) -> Result<Connection> {
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            RosterError::storage(format!(
                "Failed to open database {}: {e}",
                self.path.display()
            ))
        })?;

        // The bundled library defaults this to ON
        conn.pragma_update(None, "foreign_keys", false)?;

        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)
                .map_err(|e| RosterError::storage(format!("Failed to set busy timeout: {e}")))?;
        }

        trace!(path = %self.path.display(), ?flags, "opened connection");
        Ok(conn)
    }
}

/// Statement runner bound to one open connection (or transaction)
pub struct Session<'c> {
    conn: &'c Connection,
}

impl<'c> Session<'c> {
    fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Execute a read statement and return every row as a record
    pub fn run_query<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| RosterError::storage(format!("Failed to prepare statement: {e}")))?;

        let column_names: Vec<String> =
            stmt.column_names().iter().map(|s| (*s).to_string()).collect();

        let mut rows = stmt
            .query(params)
            .map_err(|e| RosterError::storage(format!("Failed to execute query: {e}")))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| RosterError::storage(format!("Failed to fetch row: {e}")))?
        {
            let record = row_to_record(&column_names, row)
                .map_err(|e| RosterError::storage(format!("Failed to read row: {e}")))?;
            records.push(record);
        }

        debug!(rows = records.len(), "query finished");
        Ok(records)
    }

    /// Execute a read statement and decode every row into `T`
    pub fn fetch_all<T: DeserializeOwned, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<T>> {
        self.run_query(sql, params)?.into_iter().map(decode_record).collect()
    }

    /// Execute a read statement and decode the first row, if any
    pub fn fetch_optional<T: DeserializeOwned, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Option<T>> {
        self.run_query(sql, params)?
            .into_iter()
            .next()
            .map(decode_record)
            .transpose()
    }

    /// Execute a single-value integer query such as `SELECT COUNT(*) ...`
    pub fn scalar_i64<P: Params>(&self, sql: &str, params: P) -> Result<i64> {
        self.conn
            .query_row(sql, params, |row| row.get(0))
            .map_err(|e| RosterError::storage(format!("Failed to read scalar: {e}")))
    }

    /// Execute one write statement on this connection
    pub fn run_write<P: Params>(&self, sql: &str, params: P) -> Result<WriteResult> {
        let before = self.conn.last_insert_rowid();
        let changed = self
            .conn
            .execute(sql, params)
            .map_err(|e| RosterError::storage(format!("Failed to execute statement: {e}")))?;
        let after = self.conn.last_insert_rowid();

        let generated_id = (changed > 0 && after != before).then_some(after);
        debug!(rows_affected = changed, ?generated_id, "write finished");

        Ok(WriteResult {
            rows_affected: changed as u64,
            generated_id,
        })
    }
}

fn decode_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(record))
        .map_err(|e| RosterError::storage(format!("Failed to decode row: {e}")))
}

/// Convert a `SQLite` row to a column-keyed record
fn row_to_record(
    column_names: &[String],
    row: &Row,
) -> std::result::Result<Record, rusqlite::Error> {
    let mut record = Record::new();
    for (idx, name) in column_names.iter().enumerate() {
        record.insert(name.clone(), sqlite_value_to_json(row, idx)?);
    }
    Ok(record)
}

/// Convert `SQLite` value to JSON value
fn sqlite_value_to_json(
    row: &Row,
    idx: usize,
) -> std::result::Result<serde_json::Value, rusqlite::Error> {
    let value_ref = row.get_ref(idx)?;

    Ok(match value_ref {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number), // NaN/Infinity as null
        ValueRef::Text(s) => {
            let text = std::str::from_utf8(s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            serde_json::Value::String(text.to_string())
        }
        ValueRef::Blob(b) => {
            use base64::Engine;
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
    })
}
