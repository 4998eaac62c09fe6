//! Staging table for location samples awaiting cell data.

use rusqlite::{Connection, TransactionBehavior};
use time::OffsetDateTime;
use tracing::{debug, info};

use towermap_types::{Cell, Measurement, TemporaryLocation};

use crate::error::Result;
use crate::models::{InsertOutcome, StoredTemporaryLocation};
use crate::queries::unix_millis;
use crate::store::{Store, insert_measurement_row, read_fix};

const STAGED_COLUMNS: &str =
    "row_id, hashcode, latitude, longitude, accuracy, speed, bearing, altitude, measured_at";

impl Store {
    /// Stage a location sample.
    ///
    /// A sample whose hash is already staged is dropped with
    /// [`InsertOutcome::DuplicateIgnored`].
    pub fn stage_location(&self, location: &TemporaryLocation) -> Result<InsertOutcome> {
        location.validate()?;

        self.with_conn(|conn| {
            let fix = &location.fix;
            let changed = conn.execute(
                "INSERT INTO temporary_locations (hashcode, latitude, longitude, accuracy,
                 speed, bearing, altitude, measured_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    location.content_hash,
                    fix.latitude,
                    fix.longitude,
                    fix.accuracy,
                    fix.speed,
                    fix.bearing,
                    fix.altitude,
                    fix.measured_at_millis(),
                ],
            )?;

            if changed == 0 {
                debug!(hash = %location.content_hash, "Staged location already present");
                return Ok(InsertOutcome::DuplicateIgnored);
            }
            Ok(InsertOutcome::Inserted(conn.last_insert_rowid()))
        })
    }

    /// Get a staged location by row id.
    pub fn staged_location(&self, row_id: i64) -> Result<Option<StoredTemporaryLocation>> {
        self.with_conn(|conn| select_staged(conn, row_id))
    }

    /// All staged locations, oldest row first.
    pub fn staged_locations(&self) -> Result<Vec<StoredTemporaryLocation>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM temporary_locations ORDER BY row_id",
                STAGED_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], row_to_staged)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Count staged locations.
    pub fn count_staged(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM temporary_locations", [], |row| {
                    row.get(0)
                })?;
            Ok(count as u64)
        })
    }

    /// Turn a staged location into a measurement.
    ///
    /// Reads the staged row, attaches `cells`, inserts the measurement and
    /// removes the staged row, all in one transaction. Returns `None` when
    /// no row with that id is staged. If the measurement is invalid nothing
    /// changes and the staged row is kept.
    pub fn finalize_location(
        &self,
        row_id: i64,
        cells: Vec<Cell>,
    ) -> Result<Option<InsertOutcome>> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let Some(staged) = select_staged(&tx, row_id)? else {
                return Ok(None);
            };

            let measurement = Measurement::from_location(&staged.location, cells);
            measurement.validate()?;

            let outcome = insert_measurement_row(&tx, &measurement)?;
            tx.execute("DELETE FROM temporary_locations WHERE row_id = ?", [row_id])?;
            tx.commit()?;

            debug!(row_id, ?outcome, "Finalized staged location");
            Ok(Some(outcome))
        })
    }

    /// Drop a staged location. Returns whether a row was removed.
    pub fn discard_staged(&self, row_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM temporary_locations WHERE row_id = ?", [row_id])?;
            Ok(deleted > 0)
        })
    }

    /// Drop staged locations measured before `older_than`.
    pub fn expire_staged(&self, older_than: OffsetDateTime) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM temporary_locations WHERE measured_at < ?",
                [unix_millis(older_than)],
            )?;
            if deleted > 0 {
                info!(deleted, "Expired staged locations");
            }
            Ok(deleted)
        })
    }
}

fn select_staged(conn: &Connection, row_id: i64) -> Result<Option<StoredTemporaryLocation>> {
    let sql = format!(
        "SELECT {} FROM temporary_locations WHERE row_id = ?",
        STAGED_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([row_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_staged(row)?)),
        None => Ok(None),
    }
}

fn row_to_staged(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredTemporaryLocation> {
    Ok(StoredTemporaryLocation {
        row_id: row.get(0)?,
        location: TemporaryLocation {
            content_hash: row.get(1)?,
            fix: read_fix(row, 2)?,
        },
    })
}
