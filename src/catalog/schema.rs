//! Database schema definitions and migrations.

use rusqlite::Connection;

use super::error::StoreError;

/// Current schema version. Increment when making schema changes.
pub const SCHEMA_VERSION: i32 = 1;

/// Schema DDL for version 1.
///
/// Collection fields (positions, species, regions, spells, skins) are JSON
/// text; spells and skins keep provider order inside the array.
const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS champions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    remote_id TEXT,
    name TEXT NOT NULL,
    description TEXT,
    icon_url TEXT,
    release_date TEXT,
    gender TEXT,
    class TEXT,
    positions TEXT NOT NULL DEFAULT '[]',
    species TEXT NOT NULL DEFAULT '[]',
    resource TEXT,
    attack_range TEXT,
    regions TEXT NOT NULL DEFAULT '[]',
    passive_icon_url TEXT,
    spells TEXT NOT NULL DEFAULT '[]',
    skins TEXT NOT NULL DEFAULT '[]',
    version TEXT,
    sync_status TEXT NOT NULL DEFAULT 'DETECTED',
    updated_at INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_champions_name ON champions(name COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_champions_status ON champions(sync_status);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sync_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    remote_version TEXT,
    worklist INTEGER DEFAULT 0,
    metadata_failed INTEGER DEFAULT 0,
    ready INTEGER DEFAULT 0,
    incomplete INTEGER DEFAULT 0,
    timed_out INTEGER DEFAULT 0,
    assets_downloaded INTEGER DEFAULT 0,
    assets_failed INTEGER DEFAULT 0
);
"#;

/// Get the current schema version from the database.
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32, StoreError> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), StoreError> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// Initialize or migrate the database schema.
///
/// Idempotent; safe on both new and existing databases.
pub(crate) fn migrate(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchemaVersion {
            found: current_version,
            expected: SCHEMA_VERSION,
        });
    }

    if current_version < SCHEMA_VERSION {
        conn.execute_batch(SCHEMA_V1)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
        tracing::debug!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrated catalog schema"
        );
    }

    Ok(())
}
