//! Raw SQL Classification for the `execute_sql` Tool
//!
//! Every typed tool maps onto a repository operation. The one exception is
//! `execute_sql`, which accepts statement text; this module decides whether
//! that text may run.
//!
//! # Validation Strategy
//! - Comments (`--`, `/* */`) are stripped and the text is upper-cased before matching
//! - Only a single statement is accepted (a trailing `;` is fine)
//! - Reads always run, writes need [`Capabilities::allow_write`], DDL never runs
//! - Anything not recognised as a read or a write counts as DDL

use crate::error::{Result, RosterError};

/// Default row cap for raw reads
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// What raw SQL the tool server is permitted to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Allow INSERT / UPDATE / DELETE / REPLACE
    pub allow_write: bool,

    /// Rows returned by a raw read are truncated to this many
    pub max_rows: usize,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            allow_write: false,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl Capabilities {
    /// Read-only capabilities with the default row cap
    #[must_use]
    pub fn read_only() -> Self {
        Self::default()
    }

    /// Capabilities that also permit data modification
    #[must_use]
    pub fn read_write() -> Self {
        Self {
            allow_write: true,
            ..Self::default()
        }
    }
}

/// Category of a single SQL statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Read,
    Write,
    Ddl,
}

const WRITE_KEYWORDS: [&str; 4] = ["INSERT", "UPDATE", "DELETE", "REPLACE"];

/// Pragmas whose argument names a schema object rather than a new setting
const INTROSPECTION_PRAGMAS: [&str; 5] =
    ["TABLE_INFO", "TABLE_XINFO", "INDEX_LIST", "INDEX_INFO", "FOREIGN_KEY_LIST"];

/// Classify `sql` as a read, a write, or DDL
///
/// Empty text (or text that is only comments) and multi-statement text are
/// rejected as invalid input.
pub fn classify(sql: &str) -> Result<StatementKind> {
    let processed = preprocess_sql(sql)?;
    let keyword = leading_keyword(&processed);

    let kind = match keyword {
        "SELECT" | "EXPLAIN" => StatementKind::Read,
        "PRAGMA" => classify_pragma(&processed),
        // A CTE can prefix a data-modifying statement
        "WITH" if words(&processed).any(|w| WRITE_KEYWORDS.contains(&w)) => StatementKind::Write,
        "WITH" => StatementKind::Read,
        k if WRITE_KEYWORDS.contains(&k) => StatementKind::Write,
        _ => StatementKind::Ddl,
    };

    Ok(kind)
}

/// A bare pragma reads its value. Both `PRAGMA x = v` and `PRAGMA x(v)` set
/// it, except for the introspection pragmas.
fn classify_pragma(processed: &str) -> StatementKind {
    if processed.contains('=') {
        return StatementKind::Ddl;
    }
    if !processed.contains('(') {
        return StatementKind::Read;
    }

    let rest = processed.find("PRAGMA").map_or("", |i| &processed[i + "PRAGMA".len()..]);
    let name = rest
        .trim_start()
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    // Drop a schema prefix such as `main.`
    let name = name.rsplit('.').next().unwrap_or_default();

    if INTROSPECTION_PRAGMAS.contains(&name) {
        StatementKind::Read
    } else {
        StatementKind::Ddl
    }
}

/// Check that `sql` may run under `caps`, returning its kind
pub fn validate_statement(sql: &str, caps: &Capabilities) -> Result<StatementKind> {
    let kind = classify(sql)?;

    match kind {
        StatementKind::Read => Ok(kind),
        StatementKind::Write if caps.allow_write => Ok(kind),
        StatementKind::Write => Err(RosterError::capability_violation(
            "Write statements are disabled. Restart the tool server with --allow-write \
             or set allow_sql_writes in the configuration.",
        )),
        StatementKind::Ddl => Err(RosterError::capability_violation(format!(
            "Schema changes and other non-data statements are never executed:\n\n{}",
            sql.trim()
        ))),
    }
}

/// Pre-process SQL text before classification
///
/// 1. Strips SQL comments (-- and /* */)
/// 2. Trims whitespace and rejects empty text
/// 3. Rejects multi-statement text
/// 4. Upper-cases for keyword matching
fn preprocess_sql(sql: &str) -> Result<String> {
    let stripped = strip_comments(sql);
    let processed = stripped.trim();

    if processed.is_empty() {
        return Err(RosterError::invalid_input("Query cannot be empty"));
    }

    // Any semicolon other than trailing ones separates statements
    if processed.trim_end_matches(';').trim().contains(';') {
        return Err(RosterError::invalid_input("Multi-statement queries are not supported"));
    }

    Ok(processed.to_uppercase())
}

/// Strip SQL comments
///
/// Handles:
/// - Line comments: -- comment
/// - Block comments: /* comment */
fn strip_comments(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for ch in chars.by_ref() {
                    if prev == '*' && ch == '/' {
                        break;
                    }
                    prev = ch;
                }
                result.push(' ');
            }
            _ => result.push(ch),
        }
    }

    result
}

fn leading_keyword(sql: &str) -> &str {
    words(sql).next().unwrap_or_default()
}

fn words(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Preprocessing

    #[test]
    fn test_preprocess_empty_query() {
        let result = preprocess_sql("   ");
        assert!(result.unwrap_err().message().contains("Query cannot be empty"));
    }

    #[test]
    fn test_preprocess_comment_only_query() {
        let result = preprocess_sql("-- nothing here\n/* or here */");
        assert!(result.unwrap_err().message().contains("Query cannot be empty"));
    }

    #[test]
    fn test_preprocess_line_comments() {
        let result =
            preprocess_sql("SELECT * FROM employees -- note\nWHERE id = 1").unwrap();
        assert!(result.contains("WHERE"));
        assert!(!result.contains("NOTE"));
    }

    #[test]
    fn test_preprocess_block_comments() {
        let result = preprocess_sql("SELECT * /* block comment */ FROM employees").unwrap();
        assert!(result.contains("FROM"));
        assert!(!result.contains("BLOCK COMMENT"));
    }

    #[test]
    fn test_preprocess_multi_statement_detection() {
        let err = preprocess_sql("SELECT * FROM employees; DROP TABLE employees;").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.message().contains("Multi-statement queries are not supported"));
    }

    #[test]
    fn test_preprocess_trailing_semicolon_allowed() {
        assert!(preprocess_sql("SELECT * FROM employees;").is_ok());
    }

    // Classification

    #[test]
    fn test_classify_reads() {
        for sql in [
            "select * from employees",
            "  SELECT(1)",
            "WITH t AS (SELECT 1) SELECT * FROM t",
            "PRAGMA table_info(employees)",
            "PRAGMA main.index_list(employees)",
            "pragma foreign_key_list (employees)",
            "PRAGMA user_version",
            "EXPLAIN QUERY PLAN SELECT * FROM departments",
            "-- leading comment\nSeLeCt name FrOm departments",
        ] {
            assert_eq!(classify(sql).unwrap(), StatementKind::Read, "{sql}");
        }
    }

    #[test]
    fn test_classify_writes() {
        for sql in [
            "INSERT INTO departments (name) VALUES ('Ops')",
            "update employees set salary = 1",
            "DELETE FROM employees WHERE id = 3",
            "REPLACE INTO departments (id, name) VALUES (1, 'HR')",
            "WITH gone AS (SELECT id FROM employees) DELETE FROM employees WHERE id IN gone",
        ] {
            assert_eq!(classify(sql).unwrap(), StatementKind::Write, "{sql}");
        }
    }

    #[test]
    fn test_classify_ddl() {
        for sql in [
            "CREATE TABLE t (id INTEGER)",
            "DROP TABLE employees",
            "ALTER TABLE employees ADD COLUMN x",
            "PRAGMA foreign_keys = ON",
            "PRAGMA user_version(42)",
            "PRAGMA journal_mode(WAL)",
            "PRAGMA main.foreign_keys(0)",
            "VACUUM",
            "ATTACH DATABASE 'x.db' AS x",
            "BEGIN",
        ] {
            assert_eq!(classify(sql).unwrap(), StatementKind::Ddl, "{sql}");
        }
    }

    // Capability enforcement

    #[test]
    fn test_read_allowed_without_write() {
        let caps = Capabilities::read_only();
        assert_eq!(
            validate_statement("SELECT * FROM employees", &caps).unwrap(),
            StatementKind::Read
        );
    }

    #[test]
    fn test_write_rejected_without_capability() {
        let caps = Capabilities::read_only();
        let err = validate_statement("DELETE FROM employees", &caps).unwrap_err();
        assert_eq!(err.error_code(), "CAPABILITY_VIOLATION");
        assert!(err.message().contains("--allow-write"));
    }

    #[test]
    fn test_write_allowed_with_capability() {
        let caps = Capabilities::read_write();
        assert_eq!(
            validate_statement("DELETE FROM employees", &caps).unwrap(),
            StatementKind::Write
        );
    }

    #[test]
    fn test_ddl_rejected_even_with_write() {
        let caps = Capabilities::read_write();
        let err = validate_statement("DROP TABLE departments", &caps).unwrap_err();
        assert_eq!(err.error_code(), "CAPABILITY_VIOLATION");
        assert!(err.message().contains("DROP TABLE departments"));
    }
}
