use rusqlite::params;
use tracing::{info, warn};

use super::Department;
use crate::error::{Result, RosterError};
use crate::store::{Gateway, WriteResult};

/// Department persistence and the delete-protection guard
#[derive(Debug, Clone)]
pub struct DepartmentRepository {
    gateway: Gateway,
}

impl DepartmentRepository {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// All departments, sorted by name
    pub fn list_all(&self) -> Result<Vec<Department>> {
        self.gateway.fetch_all("SELECT id, name FROM departments ORDER BY name", [])
    }

    pub fn get(&self, id: i64) -> Result<Option<Department>> {
        self.gateway.fetch_optional("SELECT id, name FROM departments WHERE id = ?1", params![id])
    }

    /// Exact, case-sensitive name lookup
    pub fn find_by_name(&self, name: &str) -> Result<Option<Department>> {
        self.gateway
            .fetch_optional("SELECT id, name FROM departments WHERE name = ?1", params![name])
    }

    /// Insert a department
    ///
    /// Name uniqueness is the caller's pre-check; a duplicate that slips
    /// through is rejected by the UNIQUE constraint as a storage error.
    pub fn create(&self, name: &str) -> Result<WriteResult> {
        let result =
            self.gateway.run_write("INSERT INTO departments (name) VALUES (?1)", params![name])?;
        info!(id = ?result.generated_id, name, "department created");
        Ok(result)
    }

    /// Rename a department; employees keep their `department_id`
    pub fn update(&self, id: i64, name: &str) -> Result<WriteResult> {
        self.gateway
            .run_write("UPDATE departments SET name = ?1 WHERE id = ?2", params![name, id])
    }

    /// Delete a department that no employee references
    ///
    /// The reference count and the delete share one transaction. When any
    /// employee is still assigned, nothing is deleted and an
    /// [`RosterError::Integrity`] error reports how many.
    pub fn delete(&self, id: i64) -> Result<WriteResult> {
        self.gateway.transaction(|session| {
            let assigned = session.scalar_i64(
                "SELECT COUNT(*) FROM employees WHERE department_id = ?1",
                params![id],
            )?;

            if assigned > 0 {
                warn!(id, assigned, "refusing to delete department with employees");
                return Err(RosterError::integrity(format!(
                    "cannot delete: {assigned} employees still assigned"
                )));
            }

            session.run_write("DELETE FROM departments WHERE id = ?1", params![id])
        })
    }
}
