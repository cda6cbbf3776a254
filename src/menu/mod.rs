//! Interactive Menu
//!
//! Text front end over the repositories: a main menu, employee and
//! department sub-menus, and a statistics screen.
//!
//! Every action runs to completion or fails with a [`RosterError`], which is
//! printed before control returns to the current menu. Terminal errors
//! (closed stdin, no TTY) end the menu.

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::fmt;

use crate::error::RosterError;
use crate::repo::validate::{
    require_hire_date, require_name, require_salary, require_unique_department_name,
    HIRE_DATE_FORMAT,
};
use crate::repo::{Department, DepartmentRepository, Employee, EmployeeInput, EmployeeRepository};
use crate::store::Gateway;

pub mod render;

/// Entries of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainAction {
    Employees,
    Departments,
    Statistics,
    Exit,
}

impl MainAction {
    pub const ALL: [Self; 4] = [Self::Employees, Self::Departments, Self::Statistics, Self::Exit];
}

impl fmt::Display for MainAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Employees => "Employee Management",
            Self::Departments => "Department Management",
            Self::Statistics => "View Statistics",
            Self::Exit => "Exit",
        })
    }
}

/// Entries of the employee menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeAction {
    ViewAll,
    ViewDetails,
    Add,
    Update,
    Delete,
    Search,
    Back,
}

impl EmployeeAction {
    pub const ALL: [Self; 7] = [
        Self::ViewAll,
        Self::ViewDetails,
        Self::Add,
        Self::Update,
        Self::Delete,
        Self::Search,
        Self::Back,
    ];
}

impl fmt::Display for EmployeeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ViewAll => "View All Employees",
            Self::ViewDetails => "View Employee Details",
            Self::Add => "Add New Employee",
            Self::Update => "Update Employee",
            Self::Delete => "Delete Employee",
            Self::Search => "Search Employees",
            Self::Back => "Back to Main Menu",
        })
    }
}

/// Entries of the department menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentAction {
    ViewAll,
    ViewDetails,
    Add,
    Update,
    Delete,
    Back,
}

impl DepartmentAction {
    pub const ALL: [Self; 6] =
        [Self::ViewAll, Self::ViewDetails, Self::Add, Self::Update, Self::Delete, Self::Back];
}

impl fmt::Display for DepartmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ViewAll => "View All Departments",
            Self::ViewDetails => "View Department Details",
            Self::Add => "Add New Department",
            Self::Update => "Update Department",
            Self::Delete => "Delete Department",
            Self::Back => "Back to Main Menu",
        })
    }
}

/// The interactive front end
pub struct Menu {
    employees: EmployeeRepository,
    departments: DepartmentRepository,
}

impl Menu {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            employees: EmployeeRepository::new(gateway.clone()),
            departments: DepartmentRepository::new(gateway),
        }
    }

    /// Run until the user picks Exit
    pub fn run(&self) -> Result<()> {
        loop {
            header("Employee Management System");
            match choose("Main Menu", &MainAction::ALL)? {
                MainAction::Employees => self.employee_menu()?,
                MainAction::Departments => self.department_menu()?,
                MainAction::Statistics => recover(self.show_statistics())?,
                MainAction::Exit => {
                    println!("{}", style("Goodbye!").bold());
                    return Ok(());
                }
            }
        }
    }

    fn employee_menu(&self) -> Result<()> {
        loop {
            header("Employee Management");
            let outcome = match choose("Employees", &EmployeeAction::ALL)? {
                EmployeeAction::ViewAll => self.list_employees(),
                EmployeeAction::ViewDetails => self.show_employee(),
                EmployeeAction::Add => self.add_employee(),
                EmployeeAction::Update => self.update_employee(),
                EmployeeAction::Delete => self.delete_employee(),
                EmployeeAction::Search => self.search_employees(),
                EmployeeAction::Back => return Ok(()),
            };
            recover(outcome)?;
        }
    }

    fn department_menu(&self) -> Result<()> {
        loop {
            header("Department Management");
            let outcome = match choose("Departments", &DepartmentAction::ALL)? {
                DepartmentAction::ViewAll => self.list_departments(),
                DepartmentAction::ViewDetails => self.show_department(),
                DepartmentAction::Add => self.add_department(),
                DepartmentAction::Update => self.update_department(),
                DepartmentAction::Delete => self.delete_department(),
                DepartmentAction::Back => return Ok(()),
            };
            recover(outcome)?;
        }
    }

    // Employees

    fn list_employees(&self) -> Result<()> {
        print_employees(&self.employees.list_all()?);
        Ok(())
    }

    fn show_employee(&self) -> Result<()> {
        if let Some(employee) = self.pick_employee()? {
            print_employee(&employee);
        }
        Ok(())
    }

    fn add_employee(&self) -> Result<()> {
        let Some(departments) = self.departments_for_assignment()? else {
            return Ok(());
        };

        let input = prompt_employee(&departments, None)?;
        let result = self.employees.create(&input)?;
        match result.generated_id {
            Some(id) => success(&format!("Employee added with ID {id}")),
            None => success("Employee added"),
        }
        Ok(())
    }

    fn update_employee(&self) -> Result<()> {
        let Some(employee) = self.pick_employee()? else {
            return Ok(());
        };
        print_employee(&employee);
        if !confirm("Update this employee?")? {
            notice("Update cancelled.");
            return Ok(());
        }

        let Some(departments) = self.departments_for_assignment()? else {
            return Ok(());
        };
        let input = prompt_employee(&departments, Some(&employee))?;
        self.employees.update(employee.id, &input)?;
        success("Employee updated");
        Ok(())
    }

    fn delete_employee(&self) -> Result<()> {
        let Some(employee) = self.pick_employee()? else {
            return Ok(());
        };
        print_employee(&employee);
        if !confirm(&format!("Delete {}?", employee.name))? {
            notice("Delete cancelled.");
            return Ok(());
        }

        self.employees.delete(employee.id)?;
        success("Employee deleted");
        Ok(())
    }

    fn search_employees(&self) -> Result<()> {
        let term: String =
            Input::new().with_prompt("Name contains").allow_empty(true).interact_text()?;
        print_employees(&self.employees.search_by_name(term.trim())?);
        Ok(())
    }

    /// Ask for an employee id and look it up, reporting a miss
    fn pick_employee(&self) -> Result<Option<Employee>> {
        let id = prompt_id("Employee ID")?;
        let employee = self.employees.get(id)?;
        if employee.is_none() {
            notice(&format!("No employee with ID {id}."));
        }
        Ok(employee)
    }

    /// All departments, or None (with a notice) when there are none to assign
    fn departments_for_assignment(&self) -> Result<Option<Vec<Department>>> {
        let departments = self.departments.list_all()?;
        if departments.is_empty() {
            notice("No departments exist yet. Add a department first.");
            return Ok(None);
        }
        Ok(Some(departments))
    }

    // Departments

    fn list_departments(&self) -> Result<()> {
        let departments = self.departments.list_all()?;
        if departments.is_empty() {
            notice("No departments found.");
        } else {
            println!("\nFound {} department(s):", departments.len());
            println!("{}", render::department_table(&departments));
        }
        Ok(())
    }

    fn show_department(&self) -> Result<()> {
        let Some(department) = self.pick_department()? else {
            return Ok(());
        };
        print_department(&department);

        let members = self.employees.list_by_department(department.id)?;
        println!("\n{}", style("Employees").bold());
        print_employees(&members);
        Ok(())
    }

    fn add_department(&self) -> Result<()> {
        let name = prompt_text("Department name", None)?;
        let name = require_unique_department_name(&self.departments, &name, None)?;
        let result = self.departments.create(&name)?;
        match result.generated_id {
            Some(id) => success(&format!("Department '{name}' added with ID {id}")),
            None => success(&format!("Department '{name}' added")),
        }
        Ok(())
    }

    fn update_department(&self) -> Result<()> {
        let Some(department) = self.pick_department()? else {
            return Ok(());
        };
        print_department(&department);
        if !confirm("Rename this department?")? {
            notice("Update cancelled.");
            return Ok(());
        }

        let name = prompt_text("New name", Some(&department.name))?;
        let name = require_unique_department_name(&self.departments, &name, Some(department.id))?;
        self.departments.update(department.id, &name)?;
        success("Department updated");
        Ok(())
    }

    fn delete_department(&self) -> Result<()> {
        let Some(department) = self.pick_department()? else {
            return Ok(());
        };
        print_department(&department);
        if !confirm(&format!("Delete department '{}'?", department.name))? {
            notice("Delete cancelled.");
            return Ok(());
        }

        self.departments.delete(department.id)?;
        success("Department deleted");
        Ok(())
    }

    fn pick_department(&self) -> Result<Option<Department>> {
        let id = prompt_id("Department ID")?;
        let department = self.departments.get(id)?;
        if department.is_none() {
            notice(&format!("No department with ID {id}."));
        }
        Ok(department)
    }

    // Statistics

    fn show_statistics(&self) -> Result<()> {
        let stats = self.employees.statistics()?;

        header("Employee Statistics");
        for (label, value) in render::overall_lines(&stats.overall) {
            println!("{} {value}", style(format!("{label}:")).bold());
        }

        println!("\n{}", style("By Department").bold());
        println!("{}", render::department_statistics_table(&stats.by_department));
        Ok(())
    }
}

/// Print a domain error and carry on; pass anything else up
fn recover(outcome: Result<()>) -> Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<RosterError>() {
            Some(roster_err) => {
                println!("\n{} {}", style("✗").red().bold(), roster_err);
                Ok(())
            }
            None => Err(err),
        },
    }
}

fn choose<T: Copy + fmt::Display>(prompt: &str, options: &[T]) -> Result<T> {
    let index = Select::new().with_prompt(prompt).items(options).default(0).interact()?;
    Ok(options[index])
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

fn prompt_id(prompt: &str) -> Result<i64> {
    Ok(Input::<i64>::new()
        .with_prompt(prompt)
        .validate_with(|id: &i64| if *id > 0 { Ok(()) } else { Err("IDs are positive") })
        .interact_text()?)
}

fn prompt_text(prompt: &str, current: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(current) = current {
        input = input.default(current.to_string());
    }
    Ok(input
        .validate_with(|value: &String| {
            require_name(prompt, value).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?)
}

/// Collect and check every employee field, defaulting to `current`'s values
fn prompt_employee(
    departments: &[Department],
    current: Option<&Employee>,
) -> Result<EmployeeInput> {
    let name = prompt_text("Employee name", current.map(|e| e.name.as_str()))?;

    let labels: Vec<String> = departments
        .iter()
        .map(|d| format!("{} (ID {})", d.name, d.id))
        .collect();
    let selected = current
        .and_then(|e| e.department_id)
        .and_then(|id| departments.iter().position(|d| d.id == id))
        .unwrap_or(0);
    let index = Select::new()
        .with_prompt("Department")
        .items(labels.as_slice())
        .default(selected)
        .interact()?;
    let department_id = departments[index].id;

    let mut salary = Input::<f64>::new().with_prompt("Salary");
    if let Some(current) = current.and_then(|e| e.salary) {
        salary = salary.default(current);
    }
    let salary = salary
        .validate_with(|value: &f64| require_salary(*value).map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()?;

    let today = chrono::Local::now().date_naive().format(HIRE_DATE_FORMAT).to_string();
    let hire_date = Input::<String>::new()
        .with_prompt("Hire date (YYYY-MM-DD)")
        .default(current.and_then(|e| e.hire_date.clone()).unwrap_or(today))
        .validate_with(|value: &String| {
            require_hire_date(value).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?;

    Ok(EmployeeInput::validated(&name, department_id, salary, &hire_date)?)
}

fn header(title: &str) {
    let rule = "=".repeat(60);
    println!("\n{rule}\n {}\n{rule}", style(title).cyan().bold());
}

fn success(message: &str) {
    println!("\n{} {message}", style("✓").green().bold());
}

fn notice(message: &str) {
    println!("\n{} {message}", style("i").blue().bold());
}

fn print_employees(employees: &[Employee]) {
    if employees.is_empty() {
        notice("No employees found.");
        return;
    }
    println!("\nFound {} employee(s):", employees.len());
    println!("{}", render::employee_table(employees));
}

fn print_employee(employee: &Employee) {
    println!();
    for (label, value) in render::employee_details(employee) {
        println!("  {} {value}", style(format!("{label}:")).bold());
    }
}

fn print_department(department: &Department) {
    println!();
    println!("  {} {}", style("ID:").bold(), department.id);
    println!("  {} {}", style("Name:").bold(), department.name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_shapes() {
        assert_eq!(MainAction::ALL.len(), 4);
        assert_eq!(EmployeeAction::ALL.len(), 7);
        assert_eq!(DepartmentAction::ALL.len(), 6);
        assert_eq!(MainAction::ALL.last(), Some(&MainAction::Exit));
        assert_eq!(EmployeeAction::Back.to_string(), "Back to Main Menu");
    }

    #[test]
    fn test_recover_swallows_domain_errors_only() {
        let domain: Result<()> =
            Err(RosterError::integrity("cannot delete: 2 employees still assigned").into());
        assert!(recover(domain).is_ok());

        let terminal: Result<()> = Err(anyhow::anyhow!("not a terminal"));
        assert!(recover(terminal).is_err());
    }
}
