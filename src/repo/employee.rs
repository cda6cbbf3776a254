use rusqlite::params;
use tracing::{info, warn};

use super::{DepartmentStatistics, Employee, EmployeeInput, OverallStatistics, Statistics};
use crate::error::{Result, RosterError};
use crate::store::{Gateway, Session, WriteResult};

// Values of the wrong storage class, written by raw SQL, read back as NULL
const SELECT_EMPLOYEE: &str = "SELECT e.id, e.name,
        CASE WHEN typeof(e.department_id) = 'integer' THEN e.department_id END
            AS department_id,
        CASE WHEN typeof(e.salary) IN ('integer', 'real') THEN e.salary END AS salary,
        e.hire_date,
        d.name AS department_name
    FROM employees e
    LEFT JOIN departments d ON e.department_id = d.id";

/// Employee persistence, the department-existence guard, and statistics
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    gateway: Gateway,
}

impl EmployeeRepository {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// All employees with their department names, sorted by name
    pub fn list_all(&self) -> Result<Vec<Employee>> {
        self.gateway.fetch_all(&format!("{SELECT_EMPLOYEE} ORDER BY e.name"), [])
    }

    pub fn get(&self, id: i64) -> Result<Option<Employee>> {
        self.gateway.fetch_optional(&format!("{SELECT_EMPLOYEE} WHERE e.id = ?1"), params![id])
    }

    /// Employees assigned to one department, sorted by name
    pub fn list_by_department(&self, department_id: i64) -> Result<Vec<Employee>> {
        self.gateway.fetch_all(
            &format!("{SELECT_EMPLOYEE} WHERE e.department_id = ?1 ORDER BY e.name"),
            params![department_id],
        )
    }

    /// Case-insensitive substring search on the name, sorted by name
    ///
    /// The substring is wrapped in `%` wildcards and matched with `LIKE`, so
    /// `%` and `_` inside it keep their wildcard meaning. An empty substring
    /// returns no rows.
    pub fn search_by_name(&self, substring: &str) -> Result<Vec<Employee>> {
        if substring.is_empty() {
            return Ok(Vec::new());
        }

        self.gateway.fetch_all(
            &format!("{SELECT_EMPLOYEE} WHERE e.name LIKE '%' || ?1 || '%' ORDER BY e.name"),
            params![substring],
        )
    }

    /// Insert an employee after checking the department exists
    pub fn create(&self, input: &EmployeeInput) -> Result<WriteResult> {
        let result = self.gateway.transaction(|session| {
            require_department(session, input.department_id)?;
            session.run_write(
                "INSERT INTO employees (name, department_id, salary, hire_date)
                 VALUES (?1, ?2, ?3, ?4)",
                params![input.name, input.department_id, input.salary, input.hire_date],
            )
        })?;

        info!(id = ?result.generated_id, department_id = input.department_id, "employee created");
        Ok(result)
    }

    /// Overwrite an employee's fields after checking the department exists
    pub fn update(&self, id: i64, input: &EmployeeInput) -> Result<WriteResult> {
        self.gateway.transaction(|session| {
            require_department(session, input.department_id)?;
            session.run_write(
                "UPDATE employees
                 SET name = ?1, department_id = ?2, salary = ?3, hire_date = ?4
                 WHERE id = ?5",
                params![input.name, input.department_id, input.salary, input.hire_date, id],
            )
        })
    }

    pub fn delete(&self, id: i64) -> Result<WriteResult> {
        self.gateway.run_write("DELETE FROM employees WHERE id = ?1", params![id])
    }

    /// Overall salary aggregates plus a per-department breakdown
    pub fn statistics(&self) -> Result<Statistics> {
        let overall: OverallStatistics = self
            .gateway
            .fetch_optional(
                "SELECT COUNT(*) AS total_employees,
                        AVG(paid) AS average_salary,
                        MIN(paid) AS min_salary,
                        MAX(paid) AS max_salary
                 FROM (
                     SELECT CASE WHEN typeof(salary) IN ('integer', 'real') THEN salary END
                         AS paid
                     FROM employees
                 )",
                [],
            )?
            .unwrap_or_default();

        let by_department: Vec<DepartmentStatistics> = self.gateway.fetch_all(
            "SELECT d.id AS department_id,
                    d.name AS department_name,
                    COUNT(e.id) AS employee_count,
                    AVG(CASE WHEN typeof(e.salary) IN ('integer', 'real') THEN e.salary END)
                        AS avg_salary
             FROM departments d
             LEFT JOIN employees e ON d.id = e.department_id
             GROUP BY d.id, d.name
             ORDER BY employee_count DESC, d.name ASC",
            [],
        )?;

        Ok(Statistics {
            overall,
            by_department,
        })
    }
}

fn require_department(session: &Session<'_>, department_id: i64) -> Result<()> {
    let exists = session.scalar_i64(
        "SELECT EXISTS(SELECT 1 FROM departments WHERE id = ?1)",
        params![department_id],
    )?;

    if exists == 0 {
        warn!(department_id, "rejecting employee for unknown department");
        return Err(RosterError::validation(format!(
            "department does not exist: {department_id}"
        )));
    }

    Ok(())
}
