//! Domain Repositories
//!
//! Typed create/read/update/delete operations for departments and employees,
//! composed on top of the [`Gateway`](crate::store::Gateway).
//!
//! # Referential Integrity Guards
//! Two operations check before they act, and both run the check and the
//! mutation inside a single gateway transaction:
//! - [`DepartmentRepository::delete`] refuses while employees reference the department
//! - [`EmployeeRepository::create`] / [`EmployeeRepository::update`] refuse an unknown department
//!
//! Everything else maps to exactly one statement.

use serde::{Deserialize, Serialize};

mod department;
mod employee;
pub mod validate;

pub use department::DepartmentRepository;
pub use employee::EmployeeRepository;

/// A department row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

/// An employee row, annotated with its department's name
///
/// The optional columns are nullable in the schema and can be NULL when rows
/// were written by raw SQL rather than through the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub department_id: Option<i64>,
    pub salary: Option<f64>,
    pub hire_date: Option<String>,
    /// From the left join; None when the department no longer exists
    pub department_name: Option<String>,
}

/// Fields accepted by employee create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeInput {
    pub name: String,
    pub department_id: i64,
    pub salary: f64,
    /// `YYYY-MM-DD`; the format is checked by callers (see [`validate`])
    pub hire_date: String,
}

/// Aggregates over all employees
///
/// With no employees: `total_employees` is 0 and every salary figure is None.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStatistics {
    pub total_employees: i64,
    pub average_salary: Option<f64>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
}

/// Head count and average salary for one department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentStatistics {
    pub department_id: i64,
    pub department_name: String,
    pub employee_count: i64,
    /// None for departments without employees
    pub avg_salary: Option<f64>,
}

/// Result of [`EmployeeRepository::statistics`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub overall: OverallStatistics,
    /// Every department, largest head count first
    pub by_department: Vec<DepartmentStatistics>,
}
