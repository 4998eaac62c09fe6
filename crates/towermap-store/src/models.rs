//! Data models for stored data.

use serde::Serialize;

use towermap_types::{Measurement, TemporaryLocation};

/// A measurement read back from the database.
///
/// This is a snapshot: changing it has no effect on the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMeasurement {
    /// Database row ID, assigned on insert.
    pub id: i64,
    /// The measurement as inserted.
    #[serde(flatten)]
    pub measurement: Measurement,
}

impl StoredMeasurement {
    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.measurement.fix.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.measurement.fix.longitude
    }
}

/// A staged location read back from the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTemporaryLocation {
    /// Local sequence number; meaningless once the row is finalized.
    pub row_id: i64,
    /// The staged location.
    #[serde(flatten)]
    pub location: TemporaryLocation,
}

/// What happened to a single insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this id.
    Inserted(i64),
    /// A row with the same content hash already existed; nothing was written.
    DuplicateIgnored,
}

impl InsertOutcome {
    /// `true` when a new row was written.
    pub fn inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }

    /// The new row id, if any.
    pub fn id(&self) -> Option<i64> {
        match self {
            InsertOutcome::Inserted(id) => Some(*id),
            InsertOutcome::DuplicateIgnored => None,
        }
    }
}

/// Result of a batch insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    /// Rows written.
    pub inserted: usize,
    /// Records dropped because their hash was already present.
    pub duplicates: usize,
}

impl ImportResult {
    /// Records processed.
    pub fn total(&self) -> usize {
        self.inserted + self.duplicates
    }
}
