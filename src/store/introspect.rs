//! Schema introspection via `sqlite_master` and the table-valued PRAGMA functions.
//!
//! Table names are always bound as parameters (`pragma_table_info(?1)`), never
//! spliced into statement text.

use rusqlite::{params, Connection};
use std::collections::BTreeMap;

use super::{ColumnInfo, ForeignKeyInfo, IndexInfo, TableInfo, TableSummary};
use crate::error::{Result, RosterError};

pub(super) fn list_tables(conn: &Connection) -> Result<Vec<TableSummary>> {
    let mut stmt = conn
        .prepare(
            "SELECT name, sql FROM sqlite_master
             WHERE type = 'table'
             AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .map_err(|e| RosterError::storage(format!("Failed to query tables: {e}")))?;

    let tables = stmt
        .query_map([], |row| {
            Ok(TableSummary {
                name: row.get(0)?,
                sql: row.get(1)?,
            })
        })
        .map_err(|e| RosterError::storage(format!("Failed to fetch table names: {e}")))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| RosterError::storage(format!("Failed to collect table names: {e}")))?;

    Ok(tables)
}

pub(super) fn table_info(conn: &Connection, table_name: &str) -> Result<TableInfo> {
    let known = list_tables(conn)?;
    if !known.iter().any(|t| t.name == table_name) {
        let names: Vec<&str> = known.iter().map(|t| t.name.as_str()).collect();
        return Err(RosterError::invalid_input(format!(
            "Unknown table '{table_name}'. Available tables: {names:?}"
        )));
    }

    let mut col_stmt = conn
        .prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk
             FROM pragma_table_info(?1) ORDER BY cid",
        )
        .map_err(|e| storage_for(table_name, "prepare table_info", &e))?;

    // (column, pk position)
    let mut pk_columns: Vec<(i64, String)> = Vec::new();
    let columns: Vec<ColumnInfo> = col_stmt
        .query_map(params![table_name], |row| {
            let pk: i64 = row.get(4)?;
            let name: String = row.get(0)?;
            Ok((
                pk,
                ColumnInfo {
                    name,
                    data_type: row.get(1)?,
                    nullable: row.get::<_, i64>(2)? == 0,
                    default: row.get(3)?,
                },
            ))
        })
        .map_err(|e| storage_for(table_name, "query columns", &e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| storage_for(table_name, "collect columns", &e))?
        .into_iter()
        .map(|(pk, column)| {
            if pk > 0 {
                pk_columns.push((pk, column.name.clone()));
            }
            column
        })
        .collect();

    pk_columns.sort_by_key(|(pos, _)| *pos);
    let primary_key = if pk_columns.is_empty() {
        None
    } else {
        Some(pk_columns.into_iter().map(|(_, name)| name).collect())
    };

    Ok(TableInfo {
        name: table_name.to_string(),
        columns,
        primary_key,
        foreign_keys: foreign_keys(conn, table_name)?,
        indexes: indexes(conn, table_name)?,
    })
}

fn foreign_keys(conn: &Connection, table_name: &str) -> Result<Vec<ForeignKeyInfo>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, \"table\", \"from\", \"to\"
             FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
        )
        .map_err(|e| storage_for(table_name, "prepare foreign_key_list", &e))?;

    let rows = stmt
        .query_map(params![table_name], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })
        .map_err(|e| storage_for(table_name, "query foreign keys", &e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| storage_for(table_name, "collect foreign keys", &e))?;

    // Group foreign keys by constraint id
    let mut grouped: BTreeMap<i64, ForeignKeyInfo> = BTreeMap::new();
    for (id, referenced_table, from_col, to_col) in rows {
        let fk = grouped.entry(id).or_insert_with(|| ForeignKeyInfo {
            name: format!("fk_{table_name}_{id}"),
            columns: Vec::new(),
            referenced_table,
            referenced_columns: Vec::new(),
        });
        fk.columns.push(from_col);
        // A NULL target means the referenced table's primary key
        fk.referenced_columns.push(to_col.unwrap_or_else(|| "rowid".to_string()));
    }

    Ok(grouped.into_values().collect())
}

fn indexes(conn: &Connection, table_name: &str) -> Result<Vec<IndexInfo>> {
    let mut stmt = conn
        .prepare("SELECT name, \"unique\" FROM pragma_index_list(?1) ORDER BY name")
        .map_err(|e| storage_for(table_name, "prepare index_list", &e))?;

    let index_list: Vec<(String, bool)> = stmt
        .query_map(params![table_name], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
        })
        .map_err(|e| storage_for(table_name, "query indexes", &e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| storage_for(table_name, "collect indexes", &e))?;

    let mut column_stmt = conn
        .prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")
        .map_err(|e| storage_for(table_name, "prepare index_info", &e))?;

    let mut indexes = Vec::new();
    for (index_name, unique) in index_list {
        if index_name.starts_with("sqlite_autoindex_") {
            continue;
        }

        let columns = column_stmt
            .query_map(params![index_name], |row| row.get::<_, Option<String>>(0))
            .map_err(|e| storage_for(table_name, "query index columns", &e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| storage_for(table_name, "collect index columns", &e))?
            .into_iter()
            .flatten() // expression columns have no name
            .collect();

        indexes.push(IndexInfo {
            name: index_name,
            columns,
            unique,
        });
    }

    Ok(indexes)
}

fn storage_for(table_name: &str, step: &str, err: &rusqlite::Error) -> RosterError {
    RosterError::storage(format!("Failed to {step} for {table_name}: {err}"))
}
