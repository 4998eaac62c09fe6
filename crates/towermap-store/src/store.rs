//! Main store implementation.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::types::Type;
use rusqlite::{Connection, Row, TransactionBehavior};
use time::OffsetDateTime;
use tracing::{debug, info};

use towermap_types::{Boundaries, Cell, Fix, Measurement, Radio};

use crate::error::{Error, Result};
use crate::models::{ImportResult, InsertOutcome, StoredMeasurement};
use crate::queries::{AreaQuery, MEASUREMENT_COLUMNS};
use crate::schema;

/// Connection settings.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long a statement waits on a lock held by another connection
    /// before failing with [`Error::StorageUnavailable`].
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(1000),
        }
    }
}

/// SQLite-based store for measurements and staged locations.
///
/// One `Store` is meant to be opened per process and shared (for example
/// behind an `Arc`) between the collection pipeline, exporters and loaders.
/// Every method takes `&self` and is safe to call from several threads;
/// calls are serialized on a single connection.
///
/// Uniqueness by content hash is enforced by the schema, not by this type,
/// so it also holds against other connections to the same file.
pub struct Store {
    conn: Mutex<Option<Connection>>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Open or create a database with explicit connection settings.
    pub fn open_with<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self::from_connection(conn))
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::initialize(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    /// Release the connection. Every later call fails with
    /// [`Error::StorageUnavailable`].
    pub fn close(&self) {
        if let Ok(mut guard) = self.conn.lock()
            && guard.take().is_some()
        {
            info!("Database closed");
        }
    }

    /// Whether the store still holds an open connection.
    pub fn is_open(&self) -> bool {
        self.conn.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Run `f` with exclusive use of the connection.
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| Error::StorageUnavailable("connection lock poisoned".to_string()))?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| Error::StorageUnavailable("store is closed".to_string()))?;
        f(conn)
    }
}

// Measurement operations
impl Store {
    /// Insert a finalized measurement.
    ///
    /// Returns [`InsertOutcome::DuplicateIgnored`] when a row with the same
    /// content hash exists. The record is validated first; an invalid record
    /// is rejected with [`Error::Validation`] and nothing is written.
    pub fn insert_measurement(&self, measurement: &Measurement) -> Result<InsertOutcome> {
        measurement.validate()?;

        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let outcome = insert_measurement_row(&tx, measurement)?;
            tx.commit()?;

            debug!(
                hash = %measurement.content_hash,
                ?outcome,
                "Inserted measurement"
            );
            Ok(outcome)
        })
    }

    /// Insert many measurements in one transaction.
    ///
    /// Every record is validated before the first write; if any is invalid
    /// the whole batch is rejected.
    pub fn insert_measurements(&self, measurements: &[Measurement]) -> Result<ImportResult> {
        for measurement in measurements {
            measurement.validate()?;
        }

        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut result = ImportResult::default();

            for measurement in measurements {
                match insert_measurement_row(&tx, measurement)? {
                    InsertOutcome::Inserted(_) => result.inserted += 1,
                    InsertOutcome::DuplicateIgnored => result.duplicates += 1,
                }
            }

            tx.commit()?;
            info!(
                inserted = result.inserted,
                duplicates = result.duplicates,
                "Imported measurements"
            );
            Ok(result)
        })
    }

    /// Get a measurement by row id.
    pub fn get_measurement(&self, id: i64) -> Result<Option<StoredMeasurement>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM measurements WHERE id = ?", MEASUREMENT_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => Ok(Some(read_measurement(conn, row)?)),
                None => Ok(None),
            }
        })
    }

    /// The most recent measurement: highest `measured_at`, then highest id.
    pub fn last_measurement(&self) -> Result<Option<StoredMeasurement>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM measurements ORDER BY measured_at DESC, id DESC LIMIT 1",
                MEASUREMENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => Ok(Some(read_measurement(conn, row)?)),
                None => Ok(None),
            }
        })
    }

    /// Count stored measurements.
    pub fn count_measurements(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }
}

// Spatial queries
impl Store {
    /// Every measurement inside `boundaries`, edges inclusive, in no
    /// particular order.
    ///
    /// # Example
    ///
    /// ```
    /// use towermap_store::Store;
    /// use towermap_types::Boundaries;
    ///
    /// let store = Store::open_in_memory()?;
    /// let rows = store.measurements_in_area(&Boundaries::new(52.0, 21.0, 52.2, 21.2)?)?;
    /// assert!(rows.is_empty());
    /// # Ok::<(), towermap_store::Error>(())
    /// ```
    pub fn measurements_in_area(&self, boundaries: &Boundaries) -> Result<Vec<StoredMeasurement>> {
        self.query_area(&AreaQuery::new(*boundaries))
    }

    /// Like [`measurements_in_area`](Self::measurements_in_area), but polls
    /// `should_stop` before each row is materialized and fails with
    /// [`Error::Cancelled`] as soon as it returns `true`.
    pub fn measurements_in_area_until<F>(
        &self,
        boundaries: &Boundaries,
        mut should_stop: F,
    ) -> Result<Vec<StoredMeasurement>>
    where
        F: FnMut() -> bool,
    {
        let query = AreaQuery::new(*boundaries);
        let mut rows = Vec::new();
        self.with_conn(|conn| {
            scan_area(conn, &query, &mut should_stop, &mut |m| {
                rows.push(m);
                Ok(())
            })
        })?;
        Ok(rows)
    }

    /// Run an [`AreaQuery`] and collect the results.
    pub fn query_area(&self, query: &AreaQuery) -> Result<Vec<StoredMeasurement>> {
        let mut rows = Vec::new();
        self.with_conn(|conn| {
            scan_area(conn, query, &mut || false, &mut |m| {
                rows.push(m);
                Ok(())
            })
        })?;
        Ok(rows)
    }

    /// Stream every measurement matching `query` through `visit` without
    /// collecting them. Returns the number of rows visited.
    ///
    /// The store is locked for the duration of the scan.
    pub fn for_each_measurement<F>(&self, query: &AreaQuery, mut visit: F) -> Result<usize>
    where
        F: FnMut(StoredMeasurement) -> Result<()>,
    {
        self.with_conn(|conn| scan_area(conn, query, &mut || false, &mut visit))
    }
}

/// Insert one measurement and its cells inside an open transaction.
pub(crate) fn insert_measurement_row(
    conn: &Connection,
    measurement: &Measurement,
) -> Result<InsertOutcome> {
    let fix = &measurement.fix;
    let changed = conn.execute(
        "INSERT INTO measurements (hashcode, latitude, longitude, accuracy, speed,
         bearing, altitude, measured_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            measurement.content_hash,
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
        return Ok(InsertOutcome::DuplicateIgnored);
    }

    let id = conn.last_insert_rowid();
    let mut stmt = conn.prepare_cached(
        "INSERT INTO measurement_cells (measurement_id, position, radio, mcc, mnc,
         area, cell, unit, signal_dbm)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for (position, cell) in measurement.cells.iter().enumerate() {
        stmt.execute(rusqlite::params![
            id,
            position as i64,
            cell.radio.as_str(),
            cell.mcc,
            cell.mnc,
            cell.area,
            cell.cell,
            cell.unit,
            cell.signal_dbm,
        ])?;
    }

    Ok(InsertOutcome::Inserted(id))
}

/// Walk the rows matching `query`, checking `should_stop` before each one.
fn scan_area(
    conn: &Connection,
    query: &AreaQuery,
    should_stop: &mut dyn FnMut() -> bool,
    visit: &mut dyn FnMut(StoredMeasurement) -> Result<()>,
) -> Result<usize> {
    if should_stop() {
        return Err(Error::Cancelled);
    }

    let sql = query.build_sql();
    let (_, params) = query.build_where();
    debug!("Executing query: {}", sql);

    let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_ref.as_slice())?;
    let mut visited = 0;

    while let Some(row) = rows.next()? {
        if should_stop() {
            debug!(visited, "Area query cancelled");
            return Err(Error::Cancelled);
        }
        visit(read_measurement(conn, row)?)?;
        visited += 1;
    }

    debug!(visited, "Area query finished");
    Ok(visited)
}

/// Materialize a measurement row selected with [`MEASUREMENT_COLUMNS`].
fn read_measurement(conn: &Connection, row: &Row<'_>) -> Result<StoredMeasurement> {
    let id: i64 = row.get(0)?;
    let content_hash: String = row.get(1)?;
    let fix = read_fix(row, 2)?;
    let cells = load_cells(conn, id)?;

    Ok(StoredMeasurement {
        id,
        measurement: Measurement {
            content_hash,
            fix,
            cells,
        },
    })
}

/// Read `latitude .. measured_at` starting at column `first`.
pub(crate) fn read_fix(row: &Row<'_>, first: usize) -> rusqlite::Result<Fix> {
    let millis: i64 = row.get(first + 6)?;
    let measured_at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(first + 6, Type::Integer, Box::new(e))
        })?;

    Ok(Fix {
        latitude: row.get(first)?,
        longitude: row.get(first + 1)?,
        accuracy: row.get(first + 2)?,
        speed: row.get(first + 3)?,
        bearing: row.get(first + 4)?,
        altitude: row.get(first + 5)?,
        measured_at,
    })
}

fn load_cells(conn: &Connection, measurement_id: i64) -> Result<Vec<Cell>> {
    let mut stmt = conn.prepare_cached(
        "SELECT radio, mcc, mnc, area, cell, unit, signal_dbm
         FROM measurement_cells WHERE measurement_id = ? ORDER BY position",
    )?;

    let cells = stmt
        .query_map([measurement_id], |row| {
            Ok(Cell {
                radio: Radio::from_label(&row.get::<_, String>(0)?),
                mcc: row.get(1)?,
                mnc: row.get(2)?,
                area: row.get(3)?,
                cell: row.get(4)?,
                unit: row.get(5)?,
                signal_dbm: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use towermap_types::{TemporaryLocation, ValidationError};

    fn fix_at(lat: f64, lon: f64, t: OffsetDateTime) -> Fix {
        Fix::new(lat, lon, t).accuracy(5.0).altitude(100.0)
    }

    fn measurement_at(lat: f64, lon: f64) -> Measurement {
        Measurement::new(
            fix_at(lat, lon, datetime!(2024-05-01 12:00:00.250 UTC)),
            vec![Cell::new(Radio::Lte, 260, 2, 58140, 26_512_641).with_signal(-95)],
        )
    }

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.count_measurements().unwrap(), 0);
        assert!(store.last_measurement().unwrap().is_none());
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let m = Measurement::new(
            fix_at(52.1, 21.05, datetime!(2024-05-01 12:00:00.250 UTC))
                .speed(1.5)
                .bearing(270.0),
            vec![
                Cell::new(Radio::Lte, 260, 2, 58140, 26_512_641)
                    .with_unit(301)
                    .with_signal(-95),
                Cell::new(Radio::Gsm, 260, 2, 1234, 5678),
            ],
        );

        let outcome = store.insert_measurement(&m).unwrap();
        let id = outcome.id().unwrap();

        let stored = store.get_measurement(id).unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.measurement, m);
    }

    #[test]
    fn test_parsed_measurement_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let m: Measurement = serde_json::from_str(
            r#"{"content_hash":"0123456789abcdef0123456789abcdef01234567",
                "latitude":52.1,"longitude":21.05,"accuracy":5.0,"speed":0.0,
                "bearing":0.0,"altitude":100.0,
                "measured_at":"2024-05-01T12:00:00.123456Z",
                "cells":[{"radio":"lte","mcc":260,"mnc":2,"area":58140,"cell":26512641}]}"#,
        )
        .unwrap();

        let id = store.insert_measurement(&m).unwrap().id().unwrap();

        let stored = store.get_measurement(id).unwrap().unwrap();
        assert_eq!(stored.measurement, m);
        assert_eq!(
            stored.measurement.fix.measured_at,
            datetime!(2024-05-01 12:00:00.123 UTC)
        );
    }

    #[test]
    fn test_sub_millisecond_time_rejected() {
        let store = Store::open_in_memory().unwrap();
        let mut m = measurement_at(52.1, 21.0);
        m.fix.measured_at = datetime!(2024-05-01 12:00:00.000_500 UTC);

        assert!(matches!(
            store.insert_measurement(&m),
            Err(Error::Validation(ValidationError::SubMillisecond(_)))
        ));

        let location = TemporaryLocation::new(m.fix);
        assert!(matches!(
            store.stage_location(&location),
            Err(Error::Validation(ValidationError::SubMillisecond(_)))
        ));
        assert_eq!(store.count_measurements().unwrap(), 0);
        assert_eq!(store.count_staged().unwrap(), 0);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_measurement(42).unwrap().is_none());
    }

    #[test]
    fn test_identical_inserts_deduplicated() {
        let store = Store::open_in_memory().unwrap();
        let m = measurement_at(52.1, 21.0);

        let outcomes: Vec<bool> = (0..3)
            .map(|_| store.insert_measurement(&m).unwrap().inserted())
            .collect();

        assert_eq!(outcomes, vec![true, false, false]);
        assert_eq!(store.count_measurements().unwrap(), 1);
    }

    #[test]
    fn test_same_hash_different_fields_ignored() {
        let store = Store::open_in_memory().unwrap();
        let first = measurement_at(52.1, 21.0);
        let mut second = measurement_at(10.0, 10.0);
        second.content_hash = first.content_hash.clone();

        assert!(store.insert_measurement(&first).unwrap().inserted());
        assert_eq!(
            store.insert_measurement(&second).unwrap(),
            InsertOutcome::DuplicateIgnored
        );

        let all = store.query_area(&AreaQuery::world()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].measurement, first);
    }

    #[test]
    fn test_invalid_measurement_not_written() {
        let store = Store::open_in_memory().unwrap();

        let mut nan = measurement_at(52.1, 21.0);
        nan.fix.latitude = f64::NAN;
        assert!(matches!(
            store.insert_measurement(&nan),
            Err(Error::Validation(ValidationError::NonFinite { .. }))
        ));

        let mut too_many = measurement_at(52.1, 21.0);
        too_many.cells = vec![too_many.cells[0].clone(); 3];
        assert!(matches!(
            store.insert_measurement(&too_many),
            Err(Error::Validation(ValidationError::CellCount(3)))
        ));

        assert_eq!(store.count_measurements().unwrap(), 0);
        let cells: i64 = store
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM measurement_cells", [], |row| {
                    row.get(0)
                })?)
            })
            .unwrap();
        assert_eq!(cells, 0);
    }

    #[test]
    fn test_batch_insert_counts_duplicates() {
        let store = Store::open_in_memory().unwrap();
        let a = measurement_at(52.1, 21.0);
        let b = measurement_at(52.2, 21.1);

        let result = store
            .insert_measurements(&[a.clone(), b, a.clone()])
            .unwrap();
        assert_eq!(
            result,
            ImportResult {
                inserted: 2,
                duplicates: 1
            }
        );

        let again = store.insert_measurements(&[a]).unwrap();
        assert_eq!(again.duplicates, 1);
        assert_eq!(store.count_measurements().unwrap(), 2);
    }

    #[test]
    fn test_batch_with_invalid_record_writes_nothing() {
        let store = Store::open_in_memory().unwrap();
        let mut bad = measurement_at(52.2, 21.1);
        bad.fix.longitude = 200.0;

        let result = store.insert_measurements(&[measurement_at(52.1, 21.0), bad]);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(store.count_measurements().unwrap(), 0);
    }

    #[test]
    fn test_area_query_example() {
        let store = Store::open_in_memory().unwrap();
        let inside = store
            .insert_measurement(&measurement_at(52.1, 21.05))
            .unwrap()
            .id()
            .unwrap();
        store
            .insert_measurement(&measurement_at(10.0, 10.0))
            .unwrap();

        let b = Boundaries::new(52.0, 21.0, 52.2, 21.2).unwrap();
        let rows = store.measurements_in_area(&b).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, inside);
    }

    #[test]
    fn test_area_edges_inclusive() {
        let store = Store::open_in_memory().unwrap();
        for (lat, lon) in [(52.0, 21.0), (52.2, 21.2), (52.0, 21.2), (52.2001, 21.1)] {
            store.insert_measurement(&measurement_at(lat, lon)).unwrap();
        }

        let b = Boundaries::new(52.0, 21.0, 52.2, 21.2).unwrap();
        assert_eq!(store.measurements_in_area(&b).unwrap().len(), 3);
    }

    #[test]
    fn test_area_without_matches_is_empty() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_measurement(&measurement_at(52.1, 21.0))
            .unwrap();

        let b = Boundaries::new(-1.0, -1.0, 1.0, 1.0).unwrap();
        assert!(store.measurements_in_area(&b).unwrap().is_empty());
    }

    #[test]
    fn test_date_line_box_queries_normalized_range() {
        let store = Store::open_in_memory().unwrap();
        store.insert_measurement(&measurement_at(0.0, 0.0)).unwrap();
        store
            .insert_measurement(&measurement_at(0.0, 175.0))
            .unwrap();

        // West edge east of the east edge: swapped to [-170, 170].
        let b = Boundaries::new(-10.0, 170.0, 10.0, -170.0).unwrap();
        let rows = store.measurements_in_area(&b).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].longitude(), 0.0);
    }

    #[test]
    fn test_returned_rows_are_snapshots() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .insert_measurement(&measurement_at(52.1, 21.0))
            .unwrap()
            .id()
            .unwrap();

        let mut rows = store.measurements_in_area(&Boundaries::WORLD).unwrap();
        rows[0].measurement.fix.latitude = 0.0;
        rows[0].measurement.cells.clear();

        let stored = store.get_measurement(id).unwrap().unwrap();
        assert_eq!(stored.latitude(), 52.1);
        assert_eq!(stored.measurement.cells.len(), 1);
    }

    #[test]
    fn test_last_measurement_latest_time_then_id() {
        let store = Store::open_in_memory().unwrap();
        let cell = Cell::new(Radio::Gsm, 260, 1, 1, 1);
        let early = Measurement::new(
            fix_at(1.0, 1.0, datetime!(2024-05-01 10:00 UTC)),
            vec![cell.clone()],
        );
        let late_a = Measurement::new(
            fix_at(2.0, 2.0, datetime!(2024-05-01 11:00 UTC)),
            vec![cell.clone()],
        );
        let late_b = Measurement::new(
            fix_at(3.0, 3.0, datetime!(2024-05-01 11:00 UTC)),
            vec![cell],
        );

        store.insert_measurement(&late_a).unwrap();
        let last_id = store.insert_measurement(&late_b).unwrap().id().unwrap();
        store.insert_measurement(&early).unwrap();

        let last = store.last_measurement().unwrap().unwrap();
        assert_eq!(last.id, last_id);
        assert_eq!(last.latitude(), 3.0);
    }

    #[test]
    fn test_cancellable_query_stops_promptly() {
        let store = Store::open_in_memory().unwrap();
        for i in 0..50 {
            store
                .insert_measurement(&measurement_at(50.0 + f64::from(i) * 0.01, 20.0))
                .unwrap();
        }

        let mut polls = 0;
        let result = store.measurements_in_area_until(&Boundaries::WORLD, || {
            polls += 1;
            polls > 3
        });

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(polls, 4);
    }

    #[test]
    fn test_cancellable_query_runs_to_completion() {
        let store = Store::open_in_memory().unwrap();
        for i in 0..5 {
            store
                .insert_measurement(&measurement_at(50.0 + f64::from(i), 20.0))
                .unwrap();
        }

        let rows = store
            .measurements_in_area_until(&Boundaries::WORLD, || false)
            .unwrap();
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_time_window_query() {
        let store = Store::open_in_memory().unwrap();
        let cell = Cell::new(Radio::Nr, 260, 3, 7, 9);
        for hour in [8u8, 10, 12] {
            let t = datetime!(2024-05-01 0:00 UTC).replace_hour(hour).unwrap();
            store
                .insert_measurement(&Measurement::new(fix_at(1.0, 1.0, t), vec![cell.clone()]))
                .unwrap();
        }

        let query = AreaQuery::world()
            .since(datetime!(2024-05-01 9:00 UTC))
            .until(datetime!(2024-05-01 12:00 UTC));
        assert_eq!(store.query_area(&query).unwrap().len(), 2);
        assert_eq!(store.query_area(&AreaQuery::world().limit(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_for_each_streams_rows() {
        let store = Store::open_in_memory().unwrap();
        store.insert_measurement(&measurement_at(1.0, 1.0)).unwrap();
        store.insert_measurement(&measurement_at(2.0, 2.0)).unwrap();

        let mut seen = Vec::new();
        let visited = store
            .for_each_measurement(&AreaQuery::world(), |m| {
                seen.push(m.id);
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, 2);
        seen.sort_unstable();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_closed_store_is_unavailable() {
        let store = Store::open_in_memory().unwrap();
        store.close();

        assert!(!store.is_open());
        assert!(matches!(
            store.count_measurements(),
            Err(Error::StorageUnavailable(_))
        ));
        assert!(matches!(
            store.insert_measurement(&measurement_at(1.0, 1.0)),
            Err(Error::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_open_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = Store::open(dir.path());
        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
    }

    #[test]
    fn test_open_garbage_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.db");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();

        let result = Store::open(&path);
        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("measurements.db");

        {
            let store = Store::open(&path).unwrap();
            store.insert_measurement(&measurement_at(1.0, 1.0)).unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.count_measurements().unwrap(), 1);
    }
}
