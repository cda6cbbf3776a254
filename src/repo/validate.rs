//! Field checks shared by the menu and the tool server.
//!
//! The repositories trust their inputs; these run before a repository call.

use chrono::NaiveDate;

use super::{DepartmentRepository, EmployeeInput};
use crate::error::{Result, RosterError};

/// Date format for `hire_date`
pub const HIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Trim `value` and reject it if nothing is left
pub fn require_name(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RosterError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

pub fn require_salary(value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(RosterError::validation("salary must be a finite number"));
    }
    if value < 0.0 {
        return Err(RosterError::validation(format!("salary cannot be negative: {value}")));
    }
    Ok(value)
}

/// Parse `value` as a calendar date and return it in canonical `YYYY-MM-DD` form
pub fn require_hire_date(value: &str) -> Result<String> {
    NaiveDate::parse_from_str(value.trim(), HIRE_DATE_FORMAT)
        .map(|date| date.format(HIRE_DATE_FORMAT).to_string())
        .map_err(|_| {
            RosterError::validation(format!("invalid hire date '{value}', expected YYYY-MM-DD"))
        })
}

/// Check a department name is valid and not held by another department
///
/// `renaming` is the id of the department being renamed, which may keep its
/// own name.
pub fn require_unique_department_name(
    departments: &DepartmentRepository,
    name: &str,
    renaming: Option<i64>,
) -> Result<String> {
    let name = require_name("department name", name)?;

    match departments.find_by_name(&name)? {
        Some(existing) if Some(existing.id) != renaming => {
            Err(RosterError::validation(format!("department already exists: {name}")))
        }
        _ => Ok(name),
    }
}

impl EmployeeInput {
    /// Build an input with every field checked
    pub fn validated(name: &str, department_id: i64, salary: f64, hire_date: &str) -> Result<Self> {
        Ok(Self {
            name: require_name("name", name)?,
            department_id,
            salary: require_salary(salary)?,
            hire_date: require_hire_date(hire_date)?,
        })
    }
}
