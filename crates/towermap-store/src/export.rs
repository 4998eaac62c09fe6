//! CSV export.

use std::io::Write;

use tracing::info;

use towermap_types::Cell;

use crate::error::Result;
use crate::models::StoredMeasurement;
use crate::queries::AreaQuery;
use crate::store::Store;

/// Column names written by [`Store::export_csv`].
///
/// `measured_at` is Unix milliseconds. Cell columns are suffixed with their
/// position; the second set is empty for single-cell measurements.
pub const CSV_HEADER: [&str; 23] = [
    "id",
    "hashcode",
    "latitude",
    "longitude",
    "accuracy",
    "speed",
    "bearing",
    "altitude",
    "measured_at",
    "radio1",
    "mcc1",
    "mnc1",
    "area1",
    "cell1",
    "unit1",
    "signal1",
    "radio2",
    "mcc2",
    "mnc2",
    "area2",
    "cell2",
    "unit2",
    "signal2",
];

impl Store {
    /// Write every measurement matching `query` as CSV, header first.
    ///
    /// Returns the number of data rows written.
    pub fn export_csv<W: Write>(&self, query: &AreaQuery, writer: W) -> Result<usize> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(CSV_HEADER)?;

        let written = self.for_each_measurement(query, |m| {
            csv.write_record(csv_record(&m))?;
            Ok(())
        })?;

        csv.flush()?;
        info!(rows = written, "Exported measurements");
        Ok(written)
    }
}

fn csv_record(stored: &StoredMeasurement) -> Vec<String> {
    let m = &stored.measurement;
    let fix = &m.fix;

    let mut record = vec![
        stored.id.to_string(),
        m.content_hash.clone(),
        fix.latitude.to_string(),
        fix.longitude.to_string(),
        fix.accuracy.to_string(),
        fix.speed.to_string(),
        fix.bearing.to_string(),
        fix.altitude.to_string(),
        fix.measured_at_millis().to_string(),
    ];

    for position in 0..2 {
        record.extend(cell_fields(m.cells.get(position)));
    }
    record
}

fn cell_fields(cell: Option<&Cell>) -> [String; 7] {
    let Some(cell) = cell else {
        return Default::default();
    };
    [
        cell.radio.to_string(),
        cell.mcc.to_string(),
        cell.mnc.to_string(),
        cell.area.to_string(),
        cell.cell.to_string(),
        cell.unit.map(|u| u.to_string()).unwrap_or_default(),
        cell.signal_dbm.map(|s| s.to_string()).unwrap_or_default(),
    ]
}
