//! Schema creation and first-run sample data.

use rusqlite::params;
use tracing::info;

use super::Gateway;
use crate::error::Result;

const CREATE_DEPARTMENTS: &str = "CREATE TABLE IF NOT EXISTS departments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)";

const CREATE_EMPLOYEES: &str = "CREATE TABLE IF NOT EXISTS employees (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    department_id INTEGER,
    salary REAL,
    hire_date TEXT,
    FOREIGN KEY (department_id) REFERENCES departments(id)
)";

const SAMPLE_DEPARTMENTS: [&str; 3] = ["HR", "Engineering", "Sales"];

// (name, department, salary, hire date)
const SAMPLE_EMPLOYEES: [(&str, &str, f64, &str); 5] = [
    ("Alice Smith", "HR", 60000.0, "2020-01-15"),
    ("Bob Johnson", "Engineering", 80000.0, "2019-03-22"),
    ("Carol Lee", "Engineering", 95000.0, "2018-07-10"),
    ("David Kim", "Sales", 55000.0, "2021-11-01"),
    ("Eva Brown", "HR", 62000.0, "2022-05-18"),
];

/// What [`initialize`] did to the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BootstrapReport {
    /// The database file did not exist before this run
    pub created: bool,
    /// Sample rows were inserted
    pub seeded: bool,
}

/// Create both tables if they are missing
pub fn ensure_schema(gateway: &Gateway) -> Result<()> {
    gateway.transaction(|session| {
        session.run_write(CREATE_DEPARTMENTS, [])?;
        session.run_write(CREATE_EMPLOYEES, [])?;
        Ok(())
    })
}

/// Insert the sample departments and employees when no department exists yet
///
/// Returns whether anything was inserted.
pub fn seed_sample_data(gateway: &Gateway) -> Result<bool> {
    gateway.transaction(|session| {
        if session.scalar_i64("SELECT COUNT(*) FROM departments", [])? > 0 {
            return Ok(false);
        }

        for name in SAMPLE_DEPARTMENTS {
            session.run_write("INSERT INTO departments (name) VALUES (?1)", params![name])?;
        }

        for (name, department, salary, hire_date) in SAMPLE_EMPLOYEES {
            session.run_write(
                "INSERT INTO employees (name, department_id, salary, hire_date)
                 SELECT ?1, id, ?3, ?4 FROM departments WHERE name = ?2",
                params![name, department, salary, hire_date],
            )?;
        }

        Ok(true)
    })
}

/// Prepare the database behind `gateway` for use
///
/// A missing file gets the schema and, when `seed` is set, the sample rows.
/// An existing file only gets any missing tables.
pub fn initialize(gateway: &Gateway, seed: bool) -> Result<BootstrapReport> {
    let created = !gateway.path().exists();

    ensure_schema(gateway)?;
    let seeded = if created && seed { seed_sample_data(gateway)? } else { false };

    if created {
        info!(path = %gateway.path().display(), seeded, "created database");
    }

    Ok(BootstrapReport { created, seeded })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_new_file_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Gateway::new(dir.path().join("fresh.db"));

        let report = initialize(&gateway, true).unwrap();
        assert_eq!(
            report,
            BootstrapReport {
                created: true,
                seeded: true,
            }
        );

        let departments = gateway
            .run_query("SELECT name FROM departments ORDER BY id", [])
            .unwrap();
        assert_eq!(departments.len(), 3);
        assert_eq!(departments[1]["name"], serde_json::json!("Engineering"));

        let employees = gateway.run_query("SELECT * FROM employees", []).unwrap();
        assert_eq!(employees.len(), 5);
    }

    #[test]
    fn test_initialize_existing_file_does_not_seed() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Gateway::new(dir.path().join("existing.db"));
        initialize(&gateway, false).unwrap();

        let report = initialize(&gateway, true).unwrap();
        assert_eq!(
            report,
            BootstrapReport {
                created: false,
                seeded: false,
            }
        );
        let rows = gateway.run_query("SELECT * FROM departments", []).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Gateway::new(dir.path().join("twice.db"));
        ensure_schema(&gateway).unwrap();

        assert!(seed_sample_data(&gateway).unwrap());
        assert!(!seed_sample_data(&gateway).unwrap());
        let rows = gateway.run_query("SELECT * FROM employees", []).unwrap();
        assert_eq!(rows.len(), 5);
    }
}
