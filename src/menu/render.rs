//! Table and value formatting for the menu screens.

use comfy_table::{presets, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::repo::{Department, DepartmentStatistics, Employee, OverallStatistics};

const UNKNOWN_DEPARTMENT: &str = "Unknown";

/// `$1,234.50` style money, `N/A` when absent
#[must_use]
pub fn format_salary(salary: Option<f64>) -> String {
    let Some(value) = salary.filter(|v| v.is_finite()) else {
        return "N/A".to_string();
    };

    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();

    format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers.iter().map(|h| Cell::new(h).fg(Color::White)));
    table
}

#[must_use]
pub fn employee_table(employees: &[Employee]) -> Table {
    let mut table = base_table(&["ID", "Name", "Department", "Salary", "Hire Date"]);

    for employee in employees {
        let department = match &employee.department_name {
            Some(name) => Cell::new(name),
            None => Cell::new(UNKNOWN_DEPARTMENT).fg(Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(employee.id),
            Cell::new(&employee.name),
            department,
            Cell::new(format_salary(employee.salary)).set_alignment(CellAlignment::Right),
            Cell::new(employee.hire_date.as_deref().unwrap_or("-")),
        ]);
    }

    table
}

#[must_use]
pub fn department_table(departments: &[Department]) -> Table {
    let mut table = base_table(&["ID", "Name"]);
    for department in departments {
        table.add_row(vec![Cell::new(department.id), Cell::new(&department.name)]);
    }
    table
}

/// Label/value pairs for the employee detail screen
#[must_use]
pub fn employee_details(employee: &Employee) -> Vec<(&'static str, String)> {
    vec![
        ("ID", employee.id.to_string()),
        ("Name", employee.name.clone()),
        (
            "Department",
            employee.department_name.clone().unwrap_or_else(|| UNKNOWN_DEPARTMENT.to_string()),
        ),
        ("Salary", format_salary(employee.salary)),
        ("Hire Date", employee.hire_date.clone().unwrap_or_else(|| "-".to_string())),
    ]
}

/// Label/value pairs for the overall statistics block
#[must_use]
pub fn overall_lines(overall: &OverallStatistics) -> Vec<(&'static str, String)> {
    vec![
        ("Total Employees", overall.total_employees.to_string()),
        ("Average Salary", format_salary(overall.average_salary)),
        ("Minimum Salary", format_salary(overall.min_salary)),
        ("Maximum Salary", format_salary(overall.max_salary)),
    ]
}

#[must_use]
pub fn department_statistics_table(stats: &[DepartmentStatistics]) -> Table {
    let mut table = base_table(&["Department", "Employees", "Avg Salary"]);
    for row in stats {
        table.add_row(vec![
            Cell::new(&row.department_name),
            Cell::new(row.employee_count).set_alignment(CellAlignment::Right),
            Cell::new(format_salary(row.avg_salary)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn employee(department_name: Option<&str>) -> Employee {
        Employee {
            id: 7,
            name: "Carol Lee".to_string(),
            department_id: Some(2),
            salary: Some(95000.0),
            hire_date: Some("2018-07-10".to_string()),
            department_name: department_name.map(str::to_string),
        }
    }

    #[test]
    fn test_format_salary() {
        assert_eq!(format_salary(Some(60000.0)), "$60,000.00");
        assert_eq!(format_salary(Some(67333.333)), "$67,333.33");
        assert_eq!(format_salary(Some(999.5)), "$999.50");
        assert_eq!(format_salary(Some(1234567.891)), "$1,234,567.89");
        assert_eq!(format_salary(Some(0.0)), "$0.00");
        assert_eq!(format_salary(None), "N/A");
        assert_eq!(format_salary(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_employee_table_contains_rows() {
        let rendered = employee_table(&[employee(Some("Engineering"))]).to_string();
        assert!(rendered.contains("Carol Lee"));
        assert!(rendered.contains("Engineering"));
        assert!(rendered.contains("$95,000.00"));
    }

    #[test]
    fn test_missing_department_shows_unknown() {
        let details = employee_details(&employee(None));
        assert_eq!(details[2], ("Department", "Unknown".to_string()));
    }

    #[test]
    fn test_overall_lines_without_employees() {
        let lines = overall_lines(&OverallStatistics::default());
        assert_eq!(lines[0], ("Total Employees", "0".to_string()));
        assert_eq!(lines[1], ("Average Salary", "N/A".to_string()));
    }
}
