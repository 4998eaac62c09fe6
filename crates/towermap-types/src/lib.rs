//! Data model for geolocated cell-tower measurements.
//!
//! This crate holds the plain types shared by the store, the loader and any
//! collection pipeline. It does no I/O.
//!
//! # Features
//!
//! - GPS fixes, radio cells, staged locations and finalized measurements
//! - Deterministic 40-character content hashes used as uniqueness keys
//! - Bounding boxes with date-line normalization
//! - Validation before anything is written
//!
//! # Example
//!
//! ```
//! use towermap_types::{Boundaries, Cell, Fix, Measurement, Radio};
//! use time::OffsetDateTime;
//!
//! let fix = Fix::new(52.1, 21.05, OffsetDateTime::now_utc()).accuracy(5.0);
//! let m = Measurement::new(fix, vec![Cell::new(Radio::Lte, 260, 2, 58140, 26_512_641)]);
//! m.validate()?;
//!
//! let area = Boundaries::new(52.0, 21.0, 52.2, 21.2)?;
//! assert!(area.contains(m.latitude(), m.longitude()));
//! # Ok::<(), towermap_types::ValidationError>(())
//! ```

pub mod boundaries;
pub mod error;
pub mod hash;
pub mod types;

pub use boundaries::Boundaries;
pub use error::{ValidationError, ValidationResult};
pub use hash::{CONTENT_HASH_LEN, location_hash, measurement_hash, validate_content_hash};
pub use types::{Cell, Fix, Measurement, Radio, TemporaryLocation, truncate_to_millis};
