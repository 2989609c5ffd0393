//! Ordered schema steps for the graph store.
//!
//! # Invariants
//! - Step versions start at 1 and increase by one.
//! - Pending steps run in a single transaction; a failing step is reported by
//!   version and name and leaves `PRAGMA user_version` where it was.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, Transaction};

/// One named schema step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "graph",
        sql: include_str!("0001_graph.sql"),
    },
    Migration {
        version: 2,
        name: "attributes",
        sql: include_str!("0002_attributes.sql"),
    },
];

/// Schema position of a connection relative to this build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStatus {
    pub version: u32,
    pub latest: u32,
    /// Names of the steps still to run, in order.
    pub pending: Vec<&'static str>,
}

impl SchemaStatus {
    pub fn is_current(&self) -> bool {
        self.version == self.latest
    }

    /// True when the database was written by a newer build.
    pub fn is_newer(&self) -> bool {
        self.version > self.latest
    }
}

/// Latest schema version known by this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Steps newer than `version`, oldest first.
pub fn pending_after(version: u32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS
        .iter()
        .filter(move |migration| migration.version > version)
}

/// Reports where `conn` stands without changing it.
pub fn schema_status(conn: &Connection) -> DbResult<SchemaStatus> {
    let version = current_user_version(conn)?;
    Ok(SchemaStatus {
        version,
        latest: latest_version(),
        pending: pending_after(version).map(|migration| migration.name).collect(),
    })
}

/// Brings `conn` up to [`latest_version`]. Returns the number of steps run.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    apply_steps(conn, MIGRATIONS)
}

/// Reads the schema version mirrored into `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn apply_steps(conn: &mut Connection, steps: &[Migration]) -> DbResult<usize> {
    let from = current_user_version(conn)?;
    let latest = steps.last().map_or(0, |migration| migration.version);
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = steps
        .iter()
        .filter(|migration| migration.version > from)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        run_step(&tx, migration)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from={from} to={latest} steps={}",
        pending.len()
    );
    Ok(pending.len())
}

fn run_step(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    tx.execute_batch(migration.sql)
        .and_then(|()| tx.pragma_update(None, "user_version", migration.version))
        .map_err(|source| DbError::Migration {
            version: migration.version,
            name: migration.name,
            source,
        })?;
    debug!(
        "event=db_migrate_step module=db status=ok version={} name={}",
        migration.version, migration.name
    );
    Ok(())
}
