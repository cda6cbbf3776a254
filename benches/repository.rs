//! Repository Performance Benchmarks
//!
//! Every repository call opens and closes its own connection, so these
//! measure that overhead together with the statement itself:
//! - Listing all employees with the department join
//! - Substring search
//! - Statistics aggregation
//! - Guarded employee insert
//! - A raw read through the tool server

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use roster::mcp::{Tool, ToolServer};
use roster::store::bootstrap::ensure_schema;
use roster::{Capabilities, EmployeeInput, EmployeeRepository, Gateway};
use rusqlite::params;
use serde_json::json;

const DEPARTMENTS: i64 = 10;
const EMPLOYEES: i64 = 1000;

fn populated_gateway(dir: &tempfile::TempDir) -> Gateway {
    let gateway = Gateway::new(dir.path().join("bench.db"));
    ensure_schema(&gateway).expect("Failed to create schema");

    gateway
        .transaction(|session| {
            for d in 1..=DEPARTMENTS {
                session.run_write(
                    "INSERT INTO departments (name) VALUES (?1)",
                    params![format!("Department {d}")],
                )?;
            }
            for i in 1..=EMPLOYEES {
                session.run_write(
                    "INSERT INTO employees (name, department_id, salary, hire_date)
                     VALUES (?1, ?2, ?3, '2020-01-01')",
                    params![
                        format!("Employee {i}"),
                        i % DEPARTMENTS + 1,
                        40000.0 + (i * 10) as f64
                    ],
                )?;
            }
            Ok(())
        })
        .expect("Failed to insert rows");

    gateway
}

fn bench_reads(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let employees = EmployeeRepository::new(populated_gateway(&dir));

    c.bench_function("employees_list_all", |b| {
        b.iter(|| employees.list_all().expect("list"));
    });

    c.bench_function("employees_search_by_name", |b| {
        b.iter(|| employees.search_by_name(black_box("ee 99")).expect("search"));
    });

    c.bench_function("employees_statistics", |b| {
        b.iter(|| employees.statistics().expect("statistics"));
    });
}

fn bench_insert(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let employees = EmployeeRepository::new(populated_gateway(&dir));
    let input = EmployeeInput {
        name: "Bench Hire".to_string(),
        department_id: 1,
        salary: 50000.0,
        hire_date: "2024-01-01".to_string(),
    };

    c.bench_function("employees_create_guarded", |b| {
        b.iter(|| employees.create(black_box(&input)).expect("create"));
    });
}

fn bench_execute_sql(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let server = ToolServer::new(populated_gateway(&dir), Capabilities::read_only());
    let arguments = json!({
        "query": "SELECT * FROM employees WHERE salary > ?",
        "params": [45000]
    });

    c.bench_function("tool_execute_sql_read", |b| {
        b.iter(|| server.call_tool(Tool::ExecuteSql, black_box(arguments.clone())).expect("call"));
    });
}

criterion_group!(benches, bench_reads, bench_insert, bench_execute_sql);
criterion_main!(benches);
