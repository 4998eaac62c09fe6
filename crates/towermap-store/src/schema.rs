//! Database schema.
//!
//! Both `measurements` and `temporary_locations` carry a unique constraint on
//! the content hash declared `ON CONFLICT IGNORE`. A plain `INSERT` of a
//! duplicate is therefore dropped by SQLite itself, with zero rows changed
//! and no error, whichever connection or thread races to insert it.

use rusqlite::Connection;

use crate::error::{Error, Result};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if version > SCHEMA_VERSION {
        return Err(Error::StorageUnavailable(format!(
            "database schema version {version} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- Finalized measurements (system of record)
        CREATE TABLE IF NOT EXISTS measurements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hashcode CHARACTER(40) NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            accuracy REAL NOT NULL,
            speed REAL NOT NULL,
            bearing REAL NOT NULL,
            altitude REAL NOT NULL,
            measured_at INTEGER NOT NULL,
            UNIQUE (hashcode) ON CONFLICT IGNORE
        );
        CREATE INDEX IF NOT EXISTS idx_measurements_lat_lon
            ON measurements(latitude, longitude);
        CREATE INDEX IF NOT EXISTS idx_measurements_measured_at
            ON measurements(measured_at, id);

        -- Main cells of each measurement, position 0 first
        CREATE TABLE IF NOT EXISTS measurement_cells (
            measurement_id INTEGER NOT NULL REFERENCES measurements(id) ON DELETE CASCADE,
            position INTEGER NOT NULL CHECK (position IN (0, 1)),
            radio TEXT NOT NULL,
            mcc INTEGER NOT NULL,
            mnc INTEGER NOT NULL,
            area INTEGER NOT NULL,
            cell INTEGER NOT NULL,
            unit INTEGER,
            signal_dbm INTEGER,
            PRIMARY KEY (measurement_id, position)
        );

        -- Location samples waiting to be correlated with cells
        CREATE TABLE IF NOT EXISTS temporary_locations (
            row_id INTEGER PRIMARY KEY NOT NULL,
            hashcode CHARACTER(40) NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            accuracy REAL NOT NULL,
            speed REAL NOT NULL,
            bearing REAL NOT NULL,
            altitude REAL NOT NULL,
            measured_at INTEGER NOT NULL,
            UNIQUE (hashcode) ON CONFLICT IGNORE
        );
        CREATE INDEX IF NOT EXISTS idx_temporary_locations_measured_at
            ON temporary_locations(measured_at);
        "#,
    )?;

    Ok(())
}
