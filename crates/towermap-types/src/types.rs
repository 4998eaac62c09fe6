//! Core record types: GPS fixes, radio cells, staged locations and measurements.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ValidationError, ValidationResult, ensure_finite, ensure_range};
use crate::hash;

/// Radio access technology of a cell.
///
/// This enum is marked `#[non_exhaustive]` so new generations can be added
/// without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[non_exhaustive]
pub enum Radio {
    /// 2G GSM/GPRS/EDGE.
    Gsm,
    /// 3G UMTS/HSPA.
    Umts,
    /// 4G LTE.
    Lte,
    /// 5G NR.
    Nr,
    /// CDMA/EV-DO.
    Cdma,
    /// Anything the radio did not classify.
    Unknown,
}

impl Radio {
    /// Stable lowercase label used for storage and hashing.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Radio::Gsm => "gsm",
            Radio::Umts => "umts",
            Radio::Lte => "lte",
            Radio::Nr => "nr",
            Radio::Cdma => "cdma",
            Radio::Unknown => "unknown",
        }
    }

    /// Parse a stored label, falling back to [`Radio::Unknown`].
    ///
    /// # Examples
    ///
    /// ```
    /// use towermap_types::Radio;
    ///
    /// assert_eq!(Radio::from_label("lte"), Radio::Lte);
    /// assert_eq!(Radio::from_label("NR"), Radio::Nr);
    /// assert_eq!(Radio::from_label("wimax"), Radio::Unknown);
    /// ```
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "gsm" => Radio::Gsm,
            "umts" => Radio::Umts,
            "lte" => Radio::Lte,
            "nr" => Radio::Nr,
            "cdma" => Radio::Cdma,
            _ => Radio::Unknown,
        }
    }
}

impl fmt::Display for Radio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A serving or neighbouring radio cell attached to a measurement.
///
/// `(radio, mcc, mnc, area, cell)` identify the cell. `unit` and
/// `signal_dbm` are carried for display and do not affect the content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    /// Radio access technology.
    pub radio: Radio,
    /// Mobile country code.
    pub mcc: u16,
    /// Mobile network code.
    pub mnc: u16,
    /// Location/tracking area code (LAC or TAC).
    pub area: i32,
    /// Cell identity (CID, ECI or NCI).
    pub cell: i64,
    /// Primary scrambling code or physical cell id.
    #[cfg_attr(feature = "serde", serde(default))]
    pub unit: Option<i32>,
    /// Received signal strength in dBm.
    #[cfg_attr(feature = "serde", serde(default))]
    pub signal_dbm: Option<i32>,
}

impl Cell {
    /// Create a cell from its identity.
    #[must_use]
    pub fn new(radio: Radio, mcc: u16, mnc: u16, area: i32, cell: i64) -> Self {
        Self {
            radio,
            mcc,
            mnc,
            area,
            cell,
            unit: None,
            signal_dbm: None,
        }
    }

    /// Attach the PSC/PCI.
    #[must_use]
    pub fn with_unit(mut self, unit: i32) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Attach the signal strength.
    #[must_use]
    pub fn with_signal(mut self, dbm: i32) -> Self {
        self.signal_dbm = Some(dbm);
        self
    }

    /// Identity key fed into the content hash.
    pub(crate) fn identity(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.radio, self.mcc, self.mnc, self.area, self.cell
        )
    }
}

/// A GPS fix: where and when a sample was taken.
///
/// Speed, bearing and altitude default to zero when the receiver did not
/// report them; they are never absent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Horizontal accuracy in metres.
    pub accuracy: f64,
    /// Ground speed in m/s.
    pub speed: f64,
    /// Bearing in degrees.
    pub bearing: f64,
    /// Altitude in metres.
    pub altitude: f64,
    /// Capture time, millisecond precision.
    #[cfg_attr(feature = "serde", serde(with = "rfc3339_millis"))]
    pub measured_at: OffsetDateTime,
}

impl Fix {
    /// Create a fix at a position and time. Other fields start at zero.
    ///
    /// `measured_at` is truncated to whole milliseconds, the precision the
    /// store persists.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, measured_at: OffsetDateTime) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: 0.0,
            speed: 0.0,
            bearing: 0.0,
            altitude: 0.0,
            measured_at: truncate_to_millis(measured_at),
        }
    }

    /// Set the horizontal accuracy.
    #[must_use]
    pub fn accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Set the ground speed.
    #[must_use]
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Set the bearing.
    #[must_use]
    pub fn bearing(mut self, bearing: f64) -> Self {
        self.bearing = bearing;
        self
    }

    /// Set the altitude.
    #[must_use]
    pub fn altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// Check that coordinates are in range and every field is finite.
    pub fn validate(&self) -> ValidationResult<()> {
        ensure_range("latitude", self.latitude, -90.0, 90.0)?;
        ensure_range("longitude", self.longitude, -180.0, 180.0)?;
        ensure_finite("accuracy", self.accuracy)?;
        ensure_finite("speed", self.speed)?;
        ensure_finite("bearing", self.bearing)?;
        ensure_finite("altitude", self.altitude)?;
        if self.measured_at.nanosecond() % 1_000_000 != 0 {
            return Err(ValidationError::SubMillisecond(self.measured_at));
        }
        Ok(())
    }

    /// Capture time as Unix milliseconds.
    #[must_use]
    pub fn measured_at_millis(&self) -> i64 {
        (self.measured_at.unix_timestamp_nanos() / 1_000_000) as i64
    }
}

/// Truncate a timestamp to whole milliseconds.
#[must_use]
pub fn truncate_to_millis(t: OffsetDateTime) -> OffsetDateTime {
    t.replace_millisecond(t.millisecond()).unwrap_or(t)
}

/// RFC 3339 timestamps, truncated to whole milliseconds when read.
#[cfg(feature = "serde")]
mod rfc3339_millis {
    use serde::{Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(
        t: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::serialize(t, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        time::serde::rfc3339::deserialize(deserializer).map(super::truncate_to_millis)
    }
}

/// A location sample waiting to be correlated with radio data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemporaryLocation {
    /// 40-character content hash; the uniqueness key.
    pub content_hash: String,
    /// The GPS fix.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub fix: Fix,
}

impl TemporaryLocation {
    /// Wrap a fix, computing its content hash.
    #[must_use]
    pub fn new(fix: Fix) -> Self {
        Self {
            content_hash: hash::location_hash(&fix),
            fix,
        }
    }

    /// Check the fix and the hash format.
    pub fn validate(&self) -> ValidationResult<()> {
        hash::validate_content_hash(&self.content_hash)?;
        self.fix.validate()
    }
}

/// A finalized measurement: a GPS fix correlated with one or two cells.
///
/// Immutable once stored. The store assigns the row id; see
/// `towermap_store::StoredMeasurement`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// 40-character content hash; the uniqueness key.
    pub content_hash: String,
    /// The GPS fix.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub fix: Fix,
    /// Main cells, in display order.
    pub cells: Vec<Cell>,
}

impl Measurement {
    /// Maximum number of cells a measurement carries.
    pub const MAX_CELLS: usize = 2;

    /// Build a measurement, computing its content hash.
    ///
    /// # Examples
    ///
    /// ```
    /// use towermap_types::{Cell, Fix, Measurement, Radio};
    /// use time::macros::datetime;
    ///
    /// let fix = Fix::new(52.1, 21.0, datetime!(2024-05-01 12:00 UTC)).altitude(100.0);
    /// let m = Measurement::new(fix, vec![Cell::new(Radio::Lte, 260, 2, 58140, 26_512_641)]);
    ///
    /// assert_eq!(m.content_hash.len(), 40);
    /// assert!(m.validate().is_ok());
    /// ```
    #[must_use]
    pub fn new(fix: Fix, cells: Vec<Cell>) -> Self {
        Self {
            content_hash: hash::measurement_hash(&fix, &cells),
            fix,
            cells,
        }
    }

    /// Finalize a staged location with the cells observed at that moment.
    ///
    /// The hash is recomputed because the cells are part of it.
    #[must_use]
    pub fn from_location(location: &TemporaryLocation, cells: Vec<Cell>) -> Self {
        Self::new(location.fix, cells)
    }

    /// Check the fix, the cell count and the hash format.
    pub fn validate(&self) -> ValidationResult<()> {
        hash::validate_content_hash(&self.content_hash)?;
        self.fix.validate()?;
        if self.cells.is_empty() || self.cells.len() > Self::MAX_CELLS {
            return Err(ValidationError::CellCount(self.cells.len()));
        }
        Ok(())
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.fix.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.fix.longitude
    }

    /// The first (serving) cell.
    #[must_use]
    pub fn main_cell(&self) -> Option<&Cell> {
        self.cells.first()
    }
}
