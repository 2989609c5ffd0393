//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the graph.
//! - Keep SQL, transactions and referential checks inside the store boundary.
//!
//! # Invariants
//! - Each logical write runs in one `BEGIN IMMEDIATE` transaction; a refused
//!   write rolls back and leaves the store unchanged.
//! - Referential integrity is checked here, before SQLite constraints fire,
//!   so callers see `ReferencedEntity` / `NotFound` instead of raw errors.

pub mod attribute_repo;
pub mod graph_repo;

use crate::db::migrations::{current_user_version, latest_version};
use crate::error::{GraphError, GraphResult};
use rusqlite::Connection;
use uuid::Uuid;

/// Verifies the connection is migrated and carries the given tables.
pub(crate) fn ensure_schema_ready(conn: &Connection, tables: &[&'static str]) -> GraphResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(GraphError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table)? {
            return Err(GraphError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> GraphResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> GraphResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| GraphError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> GraphResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(GraphError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
